use crate::balloon::moves::WireFormat;
use crate::balloon::state::{ActorId, Participant, Roster};
use crate::config::MatchConfig;
use crate::core::network::{read_frame, write_frame, Frame, IrohTransport, ALPN};
use crate::core::transport::Inbound;
use anyhow::{anyhow, bail, Result};
use iroh::endpoint::{Connection, Endpoint, RecvStream, SendStream};
use iroh::EndpointId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The host always takes the first seat and owns initialisation.
pub const HOST_ACTOR: ActorId = ActorId(1);

/// A filled room, ready for the match to start.
pub struct Room {
    pub transport: IrohTransport,
    pub inbox: mpsc::UnboundedReceiver<Inbound>,
    pub wire: WireFormat,
    // Dropping the endpoint tears down every connection.
    _endpoint: Endpoint,
}

enum Submission {
    Move { sender: ActorId, payload: Vec<u8> },
    Left { actor: ActorId },
}

struct Guest {
    id: ActorId,
    conn: Connection,
    send: SendStream,
    recv: RecvStream,
}

async fn bind() -> Result<Endpoint> {
    let endpoint = Endpoint::builder()
        .alpns(vec![ALPN.to_vec()])
        .bind()
        .await?;
    Ok(endpoint)
}

/// Accepts one connection and reads the guest's hello.
async fn admit(endpoint: &Endpoint) -> Result<(Connection, SendStream, RecvStream, String)> {
    let incoming = endpoint.accept().await.ok_or_else(|| anyhow!("Endpoint closed"))?;
    let conn = incoming.accept()?.await?;
    let (send, mut recv) = conn.accept_bi().await?;
    match read_frame(&mut recv).await? {
        Frame::Hello { name } => Ok((conn, send, recv, name)),
        other => bail!("expected hello, got {other:?}"),
    }
}

/// Host side: waits for the room to fill, then sequences every broadcast.
pub async fn host_room(config: &MatchConfig, name: String) -> Result<Room> {
    let endpoint = bind().await?;
    println!("Your Endpoint ID: {}", endpoint.id());

    let expected = config.participant_count.saturating_sub(1);
    let mut participants = vec![Participant { id: HOST_ACTOR, name, is_authority: true }];
    let mut guests = Vec::with_capacity(expected);

    while guests.len() < expected {
        println!("Waiting for {} more player(s)...", expected - guests.len());
        match admit(&endpoint).await {
            Ok((conn, send, recv, name)) => {
                let id = ActorId(participants.len() as u32 + 1);
                println!("{name} joined as player {id}");
                participants.push(Participant { id, name, is_authority: false });
                guests.push(Guest { id, conn, send, recv });
            }
            Err(e) => warn!(error = %e, "failed to admit player"),
        }
    }

    for guest in guests.iter_mut() {
        let ready = Frame::RoomReady {
            participants: participants.clone(),
            local: guest.id,
            wire: config.wire_format,
        };
        write_frame(&mut guest.send, &ready).await?;
    }
    info!(players = participants.len(), "room is full");

    let (inbox_tx, inbox) = mpsc::unbounded_channel();
    let (submit_tx, mut submit_rx) = mpsc::unbounded_channel::<Submission>();
    let mut writers = Vec::with_capacity(guests.len());

    for Guest { id, conn, mut send, mut recv } in guests {
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Frame>();
        writers.push(frame_tx);

        tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                if let Err(e) = write_frame(&mut send, &frame).await {
                    warn!(player = %id, error = %e, "write to player failed");
                    break;
                }
            }
        });

        let submit_tx = submit_tx.clone();
        tokio::spawn(async move {
            let _conn = conn;
            loop {
                match read_frame(&mut recv).await {
                    Ok(Frame::Submit { payload }) => {
                        if submit_tx.send(Submission::Move { sender: id, payload }).is_err() {
                            break;
                        }
                    }
                    Ok(other) => warn!(player = %id, ?other, "unexpected frame from player"),
                    Err(e) => {
                        info!(player = %id, error = %e, "player disconnected");
                        let _ = submit_tx.send(Submission::Left { actor: id });
                        break;
                    }
                }
            }
        });
    }

    let (outbox, mut local_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let local_submit = submit_tx;
    tokio::spawn(async move {
        while let Some(payload) = local_rx.recv().await {
            if local_submit.send(Submission::Move { sender: HOST_ACTOR, payload }).is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut seq = 0u64;
        while let Some(submission) = submit_rx.recv().await {
            let (frame, inbound) = match submission {
                Submission::Move { sender, payload } => {
                    seq += 1;
                    debug!(seq, %sender, "sequenced move");
                    (
                        Frame::Deliver { seq, sender, payload: payload.clone() },
                        Inbound::Deliver { seq, sender, payload },
                    )
                }
                Submission::Left { actor } => (Frame::Left { actor }, Inbound::Left { actor }),
            };
            for writer in &writers {
                let _ = writer.send(frame.clone());
            }
            if inbox_tx.send(inbound).is_err() {
                break;
            }
        }
    });

    let roster = Roster::new(participants, HOST_ACTOR);
    Ok(Room {
        transport: IrohTransport::new(roster, outbox),
        inbox,
        wire: config.wire_format,
        _endpoint: endpoint,
    })
}

/// Guest side: connects to the host and waits until the room is full.
pub async fn join_room(host: EndpointId, name: String) -> Result<Room> {
    let endpoint = bind().await?;
    println!("Connecting to host {host}...");
    let conn = endpoint.connect(host, ALPN).await?;
    let (mut send, mut recv) = conn.open_bi().await?;
    write_frame(&mut send, &Frame::Hello { name }).await?;
    println!("Connected! Waiting for the room to fill...");

    let (participants, local, wire) = match read_frame(&mut recv).await? {
        Frame::RoomReady { participants, local, wire } => (participants, local, wire),
        other => bail!("expected room ready, got {other:?}"),
    };
    let roster = Roster::new(participants, local);
    let authority = roster.authority().unwrap_or(HOST_ACTOR);
    info!(%local, players = roster.participants.len(), ?wire, "joined room");

    let (outbox, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        while let Some(payload) = out_rx.recv().await {
            if let Err(e) = write_frame(&mut send, &Frame::Submit { payload }).await {
                warn!(error = %e, "write to host failed");
                break;
            }
        }
    });

    let (inbox_tx, inbox) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let _conn = conn;
        loop {
            let inbound = match read_frame(&mut recv).await {
                Ok(Frame::Deliver { seq, sender, payload }) => Inbound::Deliver { seq, sender, payload },
                Ok(Frame::Left { actor }) => Inbound::Left { actor },
                Ok(other) => {
                    warn!(?other, "unexpected frame from host");
                    continue;
                }
                Err(e) => {
                    info!(error = %e, "lost connection to host");
                    let _ = inbox_tx.send(Inbound::Left { actor: authority });
                    break;
                }
            };
            if inbox_tx.send(inbound).is_err() {
                break;
            }
        }
    });

    Ok(Room {
        transport: IrohTransport::new(roster, outbox),
        inbox,
        wire,
        _endpoint: endpoint,
    })
}
