//! Bluetooth Module
//!
//! Decodes Giiker cube traffic and delivers it as transport events.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Transport (trait)                     │
//! │  (recv: initial | notification | battery | disconnect)   │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┴─────────────┐
//!         │                           │
//!         ▼                           ▼
//! ┌──────────────────┐        ┌──────────────┐
//! │ BluetoothService │        │    Replay    │
//! │  (Windows only)  │        │              │
//! │ - Scanner        │        │ - hex lines  │
//! │ - Connection     │        │ - recordings │
//! └──────────────────┘        └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - UUIDs, state/move decoding
//! - [`transport`] - The transport trait
//! - [`replay`] - Recorded traffic from any reader
//! - `scanner`, `connection`, `service` - WinRT BLE implementation

pub mod protocol;
pub mod replay;
pub mod transport;

#[cfg(windows)]
pub mod connection;
#[cfg(windows)]
pub mod scanner;
#[cfg(windows)]
pub mod service;

#[cfg(windows)]
pub use service::BluetoothService;
pub use transport::Transport;
