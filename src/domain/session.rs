//! Cube Session
//!
//! Holds the last successfully decoded cube state and battery level, and
//! turns transport events into application events.

use crate::domain::coloring::{self, ProjectionError};
use crate::domain::models::{CubeColoring, CubeEvent, CubeState, TransportEvent};
use crate::infrastructure::bluetooth::protocol::{self, NOTIFICATION_LEN};
use tracing::{debug, info, warn};

/// Which of the decoded moves get dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveDispatch {
    /// Only the first move byte (the device's most recent move)
    #[default]
    Latest,
    /// Every move byte, in buffer order
    All,
}

#[derive(Debug, Default)]
pub struct CubeSession {
    state: Option<CubeState>,
    battery_level: Option<u8>,
    move_dispatch: MoveDispatch,
}

impl CubeSession {
    pub fn new(move_dispatch: MoveDispatch) -> Self {
        Self {
            move_dispatch,
            ..Default::default()
        }
    }

    /// Handle one transport event and return the events to dispatch, in order
    pub fn handle(&mut self, event: TransportEvent) -> Vec<CubeEvent> {
        match event {
            TransportEvent::Notification(bytes) => self.handle_notification(&bytes, true),
            TransportEvent::InitialState(bytes) => self.handle_notification(&bytes, false),
            TransportEvent::BatteryLevel(level) => {
                debug!("Battery level: {}%", level);
                self.battery_level = Some(level);
                vec![CubeEvent::BatteryChanged { level }]
            }
            TransportEvent::Disconnected => {
                info!("Cube disconnected, discarding cached state");
                self.state = None;
                self.battery_level = None;
                vec![CubeEvent::Disconnected]
            }
        }
    }

    fn handle_notification(&mut self, bytes: &[u8], live: bool) -> Vec<CubeEvent> {
        if bytes.len() != NOTIFICATION_LEN {
            debug!(
                "Unexpected notification length: {} (expected {})",
                bytes.len(),
                NOTIFICATION_LEN
            );
        }

        let (state, moves) = match protocol::decode(bytes) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Failed to decode notification: {}", e);
                return vec![CubeEvent::DecodeFailed(e)];
            }
        };

        self.state = Some(state.clone());

        let mut events = vec![CubeEvent::StateChanged(state)];
        if !live {
            return events;
        }
        let count = match self.move_dispatch {
            MoveDispatch::Latest => 1,
            MoveDispatch::All => moves.len(),
        };
        events.extend(moves.into_iter().take(count).map(CubeEvent::Move));
        events
    }

    pub fn state(&self) -> Option<&CubeState> {
        self.state.as_ref()
    }

    pub fn battery_level(&self) -> Option<u8> {
        self.battery_level
    }

    /// Visible colors of the current state, if any state has been received
    pub fn coloring(&self) -> Option<Result<CubeColoring, ProjectionError>> {
        self.state.as_ref().map(coloring::coloring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Face;
    use crate::infrastructure::bluetooth::protocol::DecodeError;

    const SOLVED_AFTER_R: [u8; 20] = [
        0x12, 0x34, 0x56, 0x78, 0x33, 0x33, 0x33, 0x33, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0x00,
        0x00, 0x51, 0x43, 0x62, 0x31,
    ];

    fn notation(event: &CubeEvent) -> Option<&str> {
        match event {
            CubeEvent::Move(m) => Some(m.notation.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_notification_adopts_state_and_dispatches_latest_move() {
        let mut session = CubeSession::default();
        let events = session.handle(TransportEvent::Notification(SOLVED_AFTER_R.to_vec()));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], CubeEvent::StateChanged(CubeState::solved()));
        match &events[1] {
            CubeEvent::Move(m) => {
                assert_eq!(m.face, Face::R);
                assert_eq!(m.notation, "R");
            }
            other => panic!("expected move, got {:?}", other),
        }
        assert_eq!(session.state(), Some(&CubeState::solved()));
        assert!(session.coloring().unwrap().is_ok());
    }

    #[test]
    fn test_dispatch_all_moves_in_order() {
        let mut session = CubeSession::new(MoveDispatch::All);
        let events = session.handle(TransportEvent::Notification(SOLVED_AFTER_R.to_vec()));
        let moves: Vec<_> = events.iter().filter_map(notation).collect();
        assert_eq!(moves, ["R", "U'", "F2", "L"]);
    }

    #[test]
    fn test_initial_state_dispatches_no_moves() {
        for dispatch in [MoveDispatch::Latest, MoveDispatch::All] {
            let mut session = CubeSession::new(dispatch);
            let events = session.handle(TransportEvent::InitialState(SOLVED_AFTER_R.to_vec()));

            assert_eq!(events, [CubeEvent::StateChanged(CubeState::solved())]);
            assert_eq!(session.state(), Some(&CubeState::solved()));
        }
    }

    #[test]
    fn test_initial_state_decode_failure() {
        let mut session = CubeSession::default();
        let events = session.handle(TransportEvent::InitialState(vec![0x12; 8]));
        let error = DecodeError::Format { len: 8, min: 16 };
        assert_eq!(events, [CubeEvent::DecodeFailed(error)]);
        assert!(session.state().is_none());
    }

    #[test]
    fn test_failed_decode_keeps_previous_state() {
        let mut session = CubeSession::default();
        session.handle(TransportEvent::Notification(SOLVED_AFTER_R.to_vec()));

        let events = session.handle(TransportEvent::Notification(vec![0x12; 10]));
        let error = DecodeError::Format { len: 10, min: 16 };
        assert_eq!(events, [CubeEvent::DecodeFailed(error)]);
        assert_eq!(session.state(), Some(&CubeState::solved()));

        let mut bad_move = SOLVED_AFTER_R;
        bad_move[16] = 0x75;
        let events = session.handle(TransportEvent::Notification(bad_move.to_vec()));
        let error = DecodeError::UnknownFace(7);
        assert_eq!(events, [CubeEvent::DecodeFailed(error)]);
        assert_eq!(session.state(), Some(&CubeState::solved()));
    }

    #[test]
    fn test_disconnect_discards_state() {
        let mut session = CubeSession::default();
        session.handle(TransportEvent::Notification(SOLVED_AFTER_R.to_vec()));
        session.handle(TransportEvent::BatteryLevel(64));
        assert_eq!(session.battery_level(), Some(64));

        let events = session.handle(TransportEvent::Disconnected);
        assert_eq!(events, [CubeEvent::Disconnected]);
        assert!(session.state().is_none());
        assert!(session.battery_level().is_none());
        assert!(session.coloring().is_none());
    }

    #[test]
    fn test_battery_event() {
        let mut session = CubeSession::default();
        let events = session.handle(TransportEvent::BatteryLevel(90));
        assert_eq!(events, [CubeEvent::BatteryChanged { level: 90 }]);
    }
}
