use crate::infrastructure::bluetooth::protocol::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cube face, in the order the device numbers them (index 0-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    B,
    D,
    L,
    U,
    R,
    F,
}

impl Face {
    /// All faces in device index order.
    pub const ALL: [Face; 6] = [Face::B, Face::D, Face::L, Face::U, Face::R, Face::F];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> char {
        match self {
            Self::B => 'B',
            Self::D => 'D',
            Self::L => 'L',
            Self::U => 'U',
            Self::R => 'R',
            Self::F => 'F',
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Sticker color, in the order the device numbers them (index 0-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Yellow,
    Orange,
    White,
    Red,
    Green,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Blue,
        Color::Yellow,
        Color::Orange,
        Color::White,
        Color::Red,
        Color::Green,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::White => "white",
            Self::Red => "red",
            Self::Green => "green",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single face turn reported by the cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub face: Face,
    /// Quarter turns: 1, 2, -1 or -2 (negative is counter-clockwise)
    pub amount: i8,
    /// Standard notation, e.g. `R`, `R2`, `R'`, `R2'`
    pub notation: String,
}

/// Raw cube state as reported by one notification.
///
/// Slot index is the array index; the value in `*_positions` is the 1-based
/// id of the cubie currently sitting in that slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeState {
    pub corner_positions: [u8; 8],
    /// Observed values are 1, 2 or 3 (3 = home orientation)
    pub corner_orientations: [u8; 8],
    pub edge_positions: [u8; 12],
    /// `true` = flipped
    pub edge_orientations: [bool; 12],
}

impl CubeState {
    /// The state a freshly solved cube reports.
    pub fn solved() -> Self {
        Self {
            corner_positions: [1, 2, 3, 4, 5, 6, 7, 8],
            corner_orientations: [3; 8],
            edge_positions: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
            edge_orientations: [false; 12],
        }
    }
}

/// Colors visible on one corner slot, in the slot's face order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CornerFacelets {
    pub position: [Face; 3],
    pub colors: [Color; 3],
}

/// Colors visible on one edge slot, in the slot's face order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeFacelets {
    pub position: [Face; 2],
    pub colors: [Color; 2],
}

/// Every visible facelet of the cube, derived from a [`CubeState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeColoring {
    pub corners: Vec<CornerFacelets>,
    pub edges: Vec<EdgeFacelets>,
}

/// Raw input from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One cube-state notification (normally 20 bytes)
    Notification(Vec<u8>),
    /// State read once on connect; its move bytes are history, not live turns
    InitialState(Vec<u8>),
    /// Battery percentage
    BatteryLevel(u8),
    Disconnected,
}

/// Events delivered to application subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CubeEvent {
    Move(Move),
    StateChanged(CubeState),
    BatteryChanged { level: u8 },
    /// A notification could not be decoded; the previous state is kept
    DecodeFailed(DecodeError),
    Disconnected,
}

/// A cube found while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDevice {
    pub name: String,
    pub address: u64,
    pub signal_strength: i16,
}
