//! Transport abstraction
//!
//! A transport delivers cube notifications, battery levels and the disconnect
//! signal one at a time. The BLE service and the replay reader both end up
//! behind this trait, so the session loop never knows which one it is
//! talking to.

use crate::domain::models::TransportEvent;
use std::future::Future;
use tokio::sync::mpsc;

pub trait Transport {
    /// Wait for the next event. `Ok(None)` means the source is exhausted.
    fn recv(&mut self) -> impl Future<Output = anyhow::Result<Option<TransportEvent>>> + Send;
}

/// Channel-fed transport, used by callback-driven sources such as WinRT
/// notifications and by tests.
impl Transport for mpsc::UnboundedReceiver<TransportEvent> {
    async fn recv(&mut self) -> anyhow::Result<Option<TransportEvent>> {
        Ok(mpsc::UnboundedReceiver::recv(self).await)
    }
}
