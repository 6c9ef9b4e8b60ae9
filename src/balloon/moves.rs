/// Moves exchanged between participants and the codecs that put them on the wire
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies which visit of the turn pointer a pump belongs to.
///
/// Receivers compare this against their own `(turn_number, active_index)` to
/// catch duplicated or reordered deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStamp {
    pub round: u32,
    pub seat: usize,
}

/// A single game action. Each kind carries only the fields it needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Move {
    /// Sent exactly once per match by the authority participant.
    SetCapacity { capacity: f32 },
    /// The sender expects the balloon to survive this pump.
    Pump { turn: TurnStamp, amount: f32 },
    /// The sender expects this pump to crack the balloon.
    Crack { turn: TurnStamp, amount: f32 },
}

impl Move {
    pub fn kind(&self) -> &'static str {
        match self {
            Move::SetCapacity { .. } => "set_capacity",
            Move::Pump { .. } => "pump",
            Move::Crack { .. } => "crack",
        }
    }

    /// The single numeric payload, whatever the kind.
    pub fn value(&self) -> f32 {
        match *self {
            Move::SetCapacity { capacity } => capacity,
            Move::Pump { amount, .. } | Move::Crack { amount, .. } => amount,
        }
    }

    fn is_well_formed(&self) -> bool {
        self.value().is_finite()
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed binary move: {0}")]
    Binary(#[from] postcard::Error),
    #[error("malformed json move: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{trailing} unexpected trailing bytes after move")]
    TrailingBytes { trailing: usize },
    #[error("{kind} move carries a non-numeric value")]
    NonNumeric { kind: &'static str },
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("binary encoding failed: {0}")]
    Binary(#[from] postcard::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind} move carries a non-numeric value")]
    NonNumeric { kind: &'static str },
}

/// How moves are serialized inside transport payloads.
///
/// The host picks one and announces it in the room handshake so every
/// participant decodes with the same codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Postcard,
    Json,
}

impl WireFormat {
    pub fn encode(self, mv: &Move) -> Result<Vec<u8>, EncodeError> {
        if !mv.is_well_formed() {
            return Err(EncodeError::NonNumeric { kind: mv.kind() });
        }
        let bytes = match self {
            WireFormat::Postcard => postcard::to_stdvec(mv)?,
            WireFormat::Json => serde_json::to_vec(mv)?,
        };
        Ok(bytes)
    }

    pub fn decode(self, raw: &[u8]) -> Result<Move, DecodeError> {
        let mv: Move = match self {
            WireFormat::Postcard => {
                let (mv, rest) = postcard::take_from_bytes::<Move>(raw)?;
                if !rest.is_empty() {
                    return Err(DecodeError::TrailingBytes { trailing: rest.len() });
                }
                mv
            }
            WireFormat::Json => serde_json::from_slice(raw)?,
        };
        if !mv.is_well_formed() {
            return Err(DecodeError::NonNumeric { kind: mv.kind() });
        }
        Ok(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FORMATS: [WireFormat; 2] = [WireFormat::Postcard, WireFormat::Json];

    fn stamp() -> TurnStamp {
        TurnStamp { round: 3, seat: 1 }
    }

    #[test]
    fn json_payload_is_tagged_by_kind() {
        let bytes = WireFormat::Json
            .encode(&Move::Pump { turn: stamp(), amount: 12.5 })
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, r#"{"Pump":{"turn":{"round":3,"seat":1},"amount":12.5}}"#);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        // Variant index 7 does not exist.
        assert!(WireFormat::Postcard.decode(&[7, 0, 0, 0, 0]).is_err());
        assert!(WireFormat::Json.decode(br#"{"Deflate":{"amount":1.0}}"#).is_err());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = WireFormat::Postcard
            .encode(&Move::SetCapacity { capacity: 110.0 })
            .unwrap();
        let err = WireFormat::Postcard.decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, DecodeError::Binary(_)));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = WireFormat::Postcard
            .encode(&Move::SetCapacity { capacity: 110.0 })
            .unwrap();
        bytes.push(0);
        let err = WireFormat::Postcard.decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::TrailingBytes { trailing: 1 }));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let err = WireFormat::Json
            .decode(br#"{"SetCapacity":{"capacity":"lots"}}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));

        // NaN slips through serde but is not a usable amount.
        let mut bytes = vec![1, 0, 0];
        bytes.extend_from_slice(&f32::NAN.to_le_bytes());
        let err = WireFormat::Postcard.decode(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::NonNumeric { kind: "pump" }));
    }

    #[test]
    fn non_finite_moves_are_never_encoded() {
        for format in FORMATS {
            let err = format
                .encode(&Move::Crack { turn: stamp(), amount: f32::INFINITY })
                .unwrap_err();
            assert!(matches!(err, EncodeError::NonNumeric { kind: "crack" }));
        }
    }

    fn any_move() -> impl Strategy<Value = Move> {
        let amount = -1.0e6f32..1.0e6f32;
        let turn = (any::<u32>(), 0usize..64).prop_map(|(round, seat)| TurnStamp { round, seat });
        prop_oneof![
            amount.clone().prop_map(|capacity| Move::SetCapacity { capacity }),
            (turn.clone(), amount.clone()).prop_map(|(turn, amount)| Move::Pump { turn, amount }),
            (turn, amount).prop_map(|(turn, amount)| Move::Crack { turn, amount }),
        ]
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(mv in any_move()) {
            for format in FORMATS {
                let bytes = format.encode(&mv).unwrap();
                prop_assert_eq!(format.decode(&bytes).unwrap(), mv);
            }
        }
    }
}
