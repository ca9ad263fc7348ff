//! Giiker Cube Protocol
//!
//! This module contains the protocol definitions for communicating with
//! Giiker smart cubes and decoding their state notifications.

use crate::domain::models::{CubeState, Face, Move};
use thiserror::Error;
use tracing::trace;

/// Cube state BLE Service UUID
pub const SERVICE_UUID: &str = "0000aadb-0000-1000-8000-00805f9b34fb";

/// State Characteristic UUID - notifies on every turn, readable on connect
pub const STATE_CHAR_UUID: &str = "0000aadc-0000-1000-8000-00805f9b34fb";

/// Standard BLE Battery Service UUID
pub const BATTERY_SERVICE_UUID: &str = "0000180f-0000-1000-8000-00805f9b34fb";

/// Standard BLE Battery Level Characteristic UUID
pub const BATTERY_LEVEL_CHAR_UUID: &str = "00002a19-0000-1000-8000-00805f9b34fb";

/// Advertised name prefix of Giiker cubes
pub const DEVICE_NAME_PREFIX: &str = "GiC";

/// Shortest notification that still carries a full cube state
pub const MIN_STATE_LEN: usize = 16;

/// Length the device actually sends
pub const NOTIFICATION_LEN: usize = 20;

/// Byte offsets of the state notification
pub mod layout {
    pub const CORNER_POSITIONS: usize = 0;
    pub const CORNER_ORIENTATIONS: usize = 4;
    pub const EDGE_POSITIONS: usize = 8;
    /// Flips of edges 0-7, most significant bit first
    pub const EDGE_FLIPS_LOW: usize = 14;
    /// Flips of edges 8-11 in the high nibble
    pub const EDGE_FLIPS_HIGH: usize = 15;
    pub const MOVES: usize = 16;
}

/// Faces in the order of the 1-based face nibble of a move byte
const FACE_TABLE: [Face; 6] = [Face::B, Face::D, Face::L, Face::U, Face::R, Face::F];

/// Decoding failures for a single notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Invalid packet size: {len} (expected at least {min})")]
    Format { len: usize, min: usize },
    #[error("Unknown face index: {0} (expected 1-6)")]
    UnknownFace(u8),
    #[error("Unknown move code: {0}")]
    UnknownMoveCode(u8),
}

/// Split a byte into its (high, low) nibbles
fn nibbles(byte: u8) -> (u8, u8) {
    (byte >> 4, byte & 0x0F)
}

/// Expand `bytes` into `out.len()` nibbles, high nibble first
fn unpack_nibbles(bytes: &[u8], out: &mut [u8]) {
    for (pair, byte) in out.chunks_mut(2).zip(bytes) {
        let (high, low) = nibbles(*byte);
        pair[0] = high;
        if let Some(slot) = pair.get_mut(1) {
            *slot = low;
        }
    }
}

/// Read `out.len()` flags from `byte`, starting at bit 7 and moving down
fn unpack_flags(byte: u8, out: &mut [bool]) {
    for (bit, flag) in (0..8u8).rev().zip(out.iter_mut()) {
        *flag = byte & (1 << bit) != 0;
    }
}

/// Turn amount for a 1-based turn code
fn turn_amount(turn_code: u8) -> Option<i8> {
    match turn_code.checked_sub(1)? {
        0 => Some(1),
        1 => Some(2),
        2 => Some(-1),
        8 => Some(-2),
        _ => None,
    }
}

/// Decode one move from the nibbles of a move byte
///
/// `face_index` is 1-based into `[B, D, L, U, R, F]`; `turn_code` selects the
/// amount (1 → 1, 2 → 2, 3 → -1, 9 → -2).
pub fn decode_move(face_index: u8, turn_code: u8) -> Result<Move, DecodeError> {
    let face = face_index
        .checked_sub(1)
        .and_then(|i| FACE_TABLE.get(i as usize).copied())
        .ok_or(DecodeError::UnknownFace(face_index))?;
    let amount = turn_amount(turn_code).ok_or(DecodeError::UnknownMoveCode(turn_code))?;

    let notation = match amount {
        2 => format!("{face}2"),
        -1 => format!("{face}'"),
        -2 => format!("{face}2'"),
        _ => face.to_string(),
    };

    Ok(Move {
        face,
        amount,
        notation,
    })
}

/// Decode a state notification into the cube state and its trailing moves
///
/// # Notification Structure (20 bytes on the wire, 16 minimum)
///
/// ```text
/// [0-3]   : Corner positions, one nibble per slot (1-based corner id)
/// [4-7]   : Corner orientations, one nibble per slot
/// [8-13]  : Edge positions, one nibble per slot (1-based edge id)
/// [14]    : Edge flips for slots 0-7, bit 7 first
/// [15]    : Edge flips for slots 8-11 in bits 7-4
/// [16..]  : One move per byte: high nibble = face, low nibble = turn code
///           (the device keeps its last four moves here, most recent first)
/// ```
pub fn decode(bytes: &[u8]) -> Result<(CubeState, Vec<Move>), DecodeError> {
    if bytes.len() < MIN_STATE_LEN {
        return Err(DecodeError::Format {
            len: bytes.len(),
            min: MIN_STATE_LEN,
        });
    }

    #[cfg(debug_assertions)]
    trace!("Raw packet: {:02X?}", bytes);

    let mut state = CubeState {
        corner_positions: [0; 8],
        corner_orientations: [0; 8],
        edge_positions: [0; 12],
        edge_orientations: [false; 12],
    };

    unpack_nibbles(
        &bytes[layout::CORNER_POSITIONS..layout::CORNER_ORIENTATIONS],
        &mut state.corner_positions,
    );
    unpack_nibbles(
        &bytes[layout::CORNER_ORIENTATIONS..layout::EDGE_POSITIONS],
        &mut state.corner_orientations,
    );
    unpack_nibbles(
        &bytes[layout::EDGE_POSITIONS..layout::EDGE_FLIPS_LOW],
        &mut state.edge_positions,
    );
    let (low_flips, high_flips) = state.edge_orientations.split_at_mut(8);
    unpack_flags(bytes[layout::EDGE_FLIPS_LOW], low_flips);
    unpack_flags(bytes[layout::EDGE_FLIPS_HIGH], high_flips);

    let moves = bytes[layout::MOVES..]
        .iter()
        .map(|byte| {
            let (face_index, turn_code) = nibbles(*byte);
            decode_move(face_index, turn_code)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((state, moves))
}

/// Parse a battery level notification (percentage in the first byte)
pub fn parse_battery_level(bytes: &[u8]) -> Result<u8, DecodeError> {
    bytes.first().copied().ok_or(DecodeError::Format { len: 0, min: 1 })
}

/// Parse a UUID string into its 128-bit value
pub fn parse_uuid(uuid_str: &str) -> anyhow::Result<u128> {
    let uuid_str = uuid_str.replace('-', "");

    if uuid_str.len() != 32 {
        return Err(anyhow::anyhow!("Invalid UUID format"));
    }

    Ok(u128::from_str_radix(&uuid_str, 16)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Solved cube followed by the move history R, U', F2, L
    const SOLVED_WITH_HISTORY: [u8; 20] = [
        0x12, 0x34, 0x56, 0x78, 0x33, 0x33, 0x33, 0x33, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x00,
        0x00, 0x51, 0x43, 0x62, 0x31,
    ];

    fn with_moves(moves: &[u8]) -> Vec<u8> {
        let mut bytes = SOLVED_WITH_HISTORY[..layout::MOVES].to_vec();
        bytes.extend_from_slice(moves);
        bytes
    }

    fn is_permutation(values: &[u8]) -> bool {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        sorted.iter().enumerate().all(|(i, v)| *v as usize == i + 1)
    }

    #[test]
    fn test_parse_uuid() {
        let uuid = parse_uuid(SERVICE_UUID).unwrap();
        assert_eq!(uuid >> 96, 0x0000aadb);
        assert!(parse_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_decode_solved_state() {
        let (state, moves) = decode(&SOLVED_WITH_HISTORY).unwrap();
        assert_eq!(state, CubeState::solved());
        assert!(is_permutation(&state.corner_positions));
        assert!(is_permutation(&state.edge_positions));

        let notations: Vec<_> = moves.iter().map(|m| m.notation.as_str()).collect();
        assert_eq!(notations, ["R", "U'", "F2", "L"]);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let first = decode(&SOLVED_WITH_HISTORY).unwrap();
        let second = decode(&SOLVED_WITH_HISTORY).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_scrambled_state() {
        // Arbitrary scrambled state
        let bytes = [
            0x42, 0x37, 0x16, 0x58, 0x11, 0x32, 0x22, 0x13, 0x12, 0x39, 0x56, 0x74, 0x8A, 0xBC,
            0x00, 0x00,
        ];
        let (state, moves) = decode(&bytes).unwrap();
        assert_eq!(state.corner_positions, [4, 2, 3, 7, 1, 6, 5, 8]);
        assert_eq!(state.corner_orientations, [1, 1, 3, 2, 2, 2, 1, 3]);
        let edges = [1, 2, 3, 9, 5, 6, 7, 4, 8, 10, 11, 12];
        assert_eq!(state.edge_positions, edges);
        assert!(is_permutation(&state.corner_positions));
        assert!(is_permutation(&state.edge_positions));
        assert!(moves.is_empty());
    }

    #[test]
    fn test_decode_edge_flips() {
        let mut bytes = SOLVED_WITH_HISTORY;
        bytes[layout::EDGE_FLIPS_LOW] = 0b1000_0001;
        bytes[layout::EDGE_FLIPS_HIGH] = 0b0010_1111;
        let (state, _) = decode(&bytes).unwrap();

        let flipped: Vec<usize> = state
            .edge_orientations
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| i)
            .collect();
        // Low nibble of byte 15 is not part of the state
        assert_eq!(flipped, [0, 7, 10]);
    }

    #[test]
    fn test_decode_short_buffer() {
        let err = decode(&SOLVED_WITH_HISTORY[..15]).unwrap_err();
        assert_eq!(err, DecodeError::Format { len: 15, min: 16 });
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_decode_without_moves() {
        let (state, moves) = decode(&SOLVED_WITH_HISTORY[..16]).unwrap();
        assert_eq!(state, CubeState::solved());
        assert!(moves.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_move_byte() {
        let mut bytes = SOLVED_WITH_HISTORY;
        bytes[18] = 0x00;
        assert_eq!(decode(&bytes), Err(DecodeError::UnknownFace(0)));

        bytes[18] = 0x54;
        assert_eq!(decode(&bytes), Err(DecodeError::UnknownMoveCode(4)));
    }

    #[test]
    fn test_move_byte_scenarios() {
        let (_, moves) = decode(&with_moves(&[0x51])).unwrap();
        let expected = Move {
            face: Face::R,
            amount: 1,
            notation: "R".to_string(),
        };
        assert_eq!(moves, [expected]);

        let (_, moves) = decode(&with_moves(&[0x53])).unwrap();
        assert_eq!(moves[0].amount, -1);
        assert_eq!(moves[0].notation, "R'");
    }

    #[test]
    fn test_move_table() {
        let expected = [(1, 1, ""), (2, 2, "2"), (3, -1, "'"), (9, -2, "2'")];
        for (face_index, face) in (1..=6).zip(FACE_TABLE) {
            for (code, amount, suffix) in expected {
                let m = decode_move(face_index, code).unwrap();
                assert_eq!(m.face, face);
                assert_eq!(m.amount, amount);
                assert_eq!(m.notation, format!("{face}{suffix}"));
            }
        }

        for code in (0..=15).filter(|c| ![1, 2, 3, 9].contains(c)) {
            let error = DecodeError::UnknownMoveCode(code);
            assert_eq!(decode_move(5, code), Err(error));
        }
    }

    #[test]
    fn test_unknown_face() {
        assert_eq!(decode_move(0, 1), Err(DecodeError::UnknownFace(0)));
        assert_eq!(decode_move(7, 1), Err(DecodeError::UnknownFace(7)));
    }

    #[test]
    fn test_battery_level() {
        assert_eq!(parse_battery_level(&[87]), Ok(87));
        assert!(parse_battery_level(&[]).is_err());
    }
}
