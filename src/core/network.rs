use crate::balloon::error::TransportError;
use crate::balloon::moves::WireFormat;
use crate::balloon::state::{ActorId, Participant, Roster};
use crate::core::transport::Transport;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

pub const ALPN: &[u8] = b"balloon/0";

/// Upper bound on a single frame; moves are a few dozen bytes.
const MAX_FRAME_LEN: usize = 64 * 1024;

/// Everything that travels over a room stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Client -> host, first frame on a new stream.
    Hello { name: String },
    /// Host -> client once every expected participant joined.
    RoomReady {
        participants: Vec<Participant>,
        local: ActorId,
        wire: WireFormat,
    },
    /// Client -> host: please broadcast this payload.
    Submit { payload: Vec<u8> },
    /// Host -> client: the next payload in room order.
    Deliver { seq: u64, sender: ActorId, payload: Vec<u8> },
    /// Host -> client: a participant dropped out.
    Left { actor: ActorId },
}

pub async fn write_frame<W>(send: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = postcard::to_stdvec(frame)?;
    send.write_u32(bytes.len() as u32).await?;
    send.write_all(&bytes).await?;
    send.flush().await?;
    Ok(())
}

pub async fn read_frame<R>(recv: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let len = recv.read_u32().await? as usize;
    if len > MAX_FRAME_LEN {
        bail!("frame of {len} bytes exceeds limit");
    }
    let mut buf = vec![0u8; len];
    recv.read_exact(&mut buf).await?;
    Ok(postcard::from_bytes(&buf)?)
}

/// Transport handle for a room joined over iroh. Broadcasts are queued and
/// written by a background task, so sending never blocks.
#[derive(Debug, Clone)]
pub struct IrohTransport {
    roster: Roster,
    outbox: mpsc::UnboundedSender<Vec<u8>>,
}

impl IrohTransport {
    pub fn new(roster: Roster, outbox: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { roster, outbox }
    }
}

impl Transport for IrohTransport {
    fn roster(&self) -> &Roster {
        &self.roster
    }

    fn broadcast(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        self.outbox.send(payload).map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_survive_a_byte_stream() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        let ready = Frame::RoomReady {
            participants: vec![Participant { id: ActorId(1), name: "host".into(), is_authority: true }],
            local: ActorId(1),
            wire: WireFormat::Json,
        };
        write_frame(&mut a, &Frame::Hello { name: "bob".into() }).await.unwrap();
        write_frame(&mut a, &ready).await.unwrap();

        assert_eq!(read_frame(&mut b).await.unwrap(), Frame::Hello { name: "bob".into() });
        assert_eq!(read_frame(&mut b).await.unwrap(), ready);
    }

    #[tokio::test]
    async fn oversized_frames_are_refused() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_u32(u32::MAX).await.unwrap();
        assert!(read_frame(&mut b).await.is_err());
    }

    #[tokio::test]
    async fn closed_stream_is_an_error() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        assert!(read_frame(&mut b).await.is_err());
    }

    #[test]
    fn broadcast_fails_once_the_writer_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let roster = Roster::new(Vec::new(), ActorId(1));
        let transport = IrohTransport::new(roster, tx);
        assert!(transport.broadcast(vec![1]).is_ok());
        drop(rx);
        assert!(matches!(transport.broadcast(vec![2]), Err(TransportError::Closed)));
    }
}
