//! Session loop: drains a transport into the session and publishes the
//! resulting events.

use crate::domain::session::CubeSession;
use crate::infrastructure::bluetooth::Transport;
use crate::infrastructure::dispatcher::Dispatcher;
use anyhow::Result;
use tracing::{debug, info};

/// Process transport events one at a time until the transport is exhausted.
///
/// Each event is fully handled and dispatched before the next one is
/// received.
pub async fn run<T: Transport>(
    transport: &mut T,
    session: &mut CubeSession,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    let mut processed = 0usize;
    while let Some(event) = transport.recv().await? {
        for cube_event in session.handle(event) {
            if !dispatcher.publish(cube_event) {
                debug!("No subscribers for cube event");
            }
        }
        processed += 1;
    }

    info!("Transport closed after {} events", processed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CubeEvent, CubeState, TransportEvent};
    use crate::domain::session::MoveDispatch;
    use crate::infrastructure::bluetooth::protocol::DecodeError;
    use crate::infrastructure::bluetooth::replay::ReplayTransport;
    use tokio::sync::mpsc;

    const SOLVED: &str = "12345678 33333333 123456789abc 0000";

    #[tokio::test]
    async fn test_run_publishes_in_order() {
        let input = format!("battery 80\n{SOLVED} 53436231\n{SOLVED} 0f\ndisconnect\n");
        let mut transport = ReplayTransport::new(input.as_bytes());
        let mut session = CubeSession::new(MoveDispatch::Latest);
        let mut dispatcher = Dispatcher::new();
        let (_, mut rx) = dispatcher.subscribe();

        run(&mut transport, &mut session, &mut dispatcher).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(events.len(), 5);
        assert_eq!(events[0], CubeEvent::BatteryChanged { level: 80 });
        assert_eq!(events[1], CubeEvent::StateChanged(CubeState::solved()));
        match &events[2] {
            CubeEvent::Move(m) => assert_eq!(m.notation, "R'"),
            other => panic!("expected move, got {:?}", other),
        }
        assert_eq!(
            events[3],
            CubeEvent::DecodeFailed(DecodeError::UnknownFace(0))
        );
        assert_eq!(events[4], CubeEvent::Disconnected);
        assert!(session.state().is_none());
    }

    #[tokio::test]
    async fn test_run_with_channel_transport() {
        let (tx, mut transport) = mpsc::unbounded_channel();
        let mut session = CubeSession::default();
        let mut dispatcher = Dispatcher::new();
        let (_, mut rx) = dispatcher.subscribe();

        tx.send(TransportEvent::Notification(vec![0x00; 4])).unwrap();
        drop(tx);
        run(&mut transport, &mut session, &mut dispatcher).await.unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            CubeEvent::DecodeFailed(DecodeError::Format { len: 4, min: 16 })
        );
        assert!(session.state().is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_malformed_replay() {
        let mut transport = ReplayTransport::new("battery 12\nnot hex\n".as_bytes());
        let mut session = CubeSession::default();
        let mut dispatcher = Dispatcher::new();

        let result = run(&mut transport, &mut session, &mut dispatcher).await;
        assert!(result.is_err());
        assert_eq!(session.battery_level(), Some(12));
    }
}
