//! BLE Scanner Module
//!
//! Handles Bluetooth LE discovery of Giiker cubes by advertised name.

use crate::domain::models::ScannedDevice;
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEScanningMode,
};
use windows::Foundation::TypedEventHandler;

/// BLE Scanner for discovering cubes
pub struct BleScanner {
    watcher: Option<BluetoothLEAdvertisementWatcher>,
}

impl BleScanner {
    pub fn new() -> Self {
        Self { watcher: None }
    }

    /// Start scanning, reporting every device whose name starts with
    /// `name_prefix` on `found`
    pub fn start(
        &mut self,
        name_prefix: &str,
        found: mpsc::UnboundedSender<ScannedDevice>,
    ) -> Result<()> {
        self.stop()?;

        info!("Starting BLE scan for devices named {}*", name_prefix);

        let watcher = BluetoothLEAdvertisementWatcher::new()?;
        watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;

        let prefix = name_prefix.to_string();
        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let name = args.Advertisement()?.LocalName()?.to_string();
                    if name.starts_with(&prefix) {
                        let device = ScannedDevice {
                            name,
                            address: args.BluetoothAddress()?,
                            signal_strength: args.RawSignalStrengthInDBm()?,
                        };
                        debug!("Found cube: {:?}", device);
                        let _ = found.send(device);
                    }
                }
                Ok(())
            },
        );

        watcher.Received(&handler)?;
        watcher.Start()?;
        self.watcher = Some(watcher);

        Ok(())
    }

    /// Stop scanning
    pub fn stop(&mut self) -> Result<()> {
        if let Some(watcher) = self.watcher.take() {
            info!("Stopping BLE scan...");
            watcher.Stop()?;
        }
        Ok(())
    }

    pub fn is_scanning(&self) -> bool {
        self.watcher.is_some()
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
