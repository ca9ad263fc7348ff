//! Bluetooth Service Module
//!
//! Coordinates scanning and connection, and forwards WinRT notifications to
//! a tokio channel as [`TransportEvent`]s.

use crate::domain::models::{ScannedDevice, TransportEvent};
use crate::infrastructure::bluetooth::{
    connection::{self, BleConnection, ConnectionConfig, ConnectionResult},
    protocol,
    scanner::BleScanner,
    transport::Transport,
};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattValueChangedEventArgs,
};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Foundation::TypedEventHandler;

/// Main Bluetooth service coordinating all BLE operations
pub struct BluetoothService {
    device: Option<BluetoothLEDevice>,
    state_characteristic: Option<GattCharacteristic>,
    battery_characteristic: Option<GattCharacteristic>,
    scanner: BleScanner,
    event_sender: mpsc::UnboundedSender<TransportEvent>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    config: ConnectionConfig,
}

impl BluetoothService {
    pub fn new(config: ConnectionConfig) -> Self {
        let (event_sender, events) = mpsc::unbounded_channel();
        Self {
            device: None,
            state_characteristic: None,
            battery_characteristic: None,
            scanner: BleScanner::new(),
            event_sender,
            events,
            config,
        }
    }

    /// Scan until the first cube shows up or `timeout` expires
    pub async fn discover(&mut self, timeout: Duration) -> Result<ScannedDevice> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.scanner.start(&self.config.name_prefix, tx)?;

        let found = tokio::time::timeout(timeout, rx.recv()).await;
        self.scanner.stop()?;

        match found {
            Ok(Some(device)) => {
                info!("Discovered {} at {:#X}", device.name, device.address);
                Ok(device)
            }
            Ok(None) => anyhow::bail!("Scanner stopped unexpectedly"),
            Err(_) => anyhow::bail!("No cube found within {:?}", timeout),
        }
    }

    /// Connect to a device by address and start forwarding notifications
    pub async fn connect(&mut self, address: u64) -> Result<()> {
        let connection = BleConnection::new(self.config.clone());
        let result = connection.connect(address).await?;

        self.setup_event_handlers(&result)?;

        // Notifications only arrive on change, so seed the session with the
        // current values
        let initial = BleConnection::read_value(&result.state_characteristic).await?;
        let _ = self.event_sender.send(TransportEvent::InitialState(initial));
        if let Some(battery) = &result.battery_characteristic {
            match BleConnection::read_value(battery).await {
                Ok(bytes) => self.forward_battery(&bytes),
                Err(e) => warn!("Could not read battery level: {}", e),
            }
        }

        self.device = Some(result.device);
        self.state_characteristic = Some(result.state_characteristic);
        self.battery_characteristic = result.battery_characteristic;

        info!("Connected to cube {:#X}", address);
        Ok(())
    }

    fn forward_battery(&self, bytes: &[u8]) {
        match protocol::parse_battery_level(bytes) {
            Ok(level) => {
                let _ = self.event_sender.send(TransportEvent::BatteryLevel(level));
            }
            Err(e) => warn!("Invalid battery notification: {}", e),
        }
    }

    /// Set up event handlers for data and connection status
    fn setup_event_handlers(&self, result: &ConnectionResult) -> Result<()> {
        let sender = self.event_sender.clone();
        let state_handler = TypedEventHandler::new(
            move |_: windows::core::Ref<GattCharacteristic>,
                  args: windows::core::Ref<GattValueChangedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    if let Ok(bytes) = connection::read_buffer(&args.CharacteristicValue()?) {
                        let _ = sender.send(TransportEvent::Notification(bytes));
                    }
                }
                Ok(())
            },
        );
        result.state_characteristic.ValueChanged(&state_handler)?;

        if let Some(battery) = &result.battery_characteristic {
            let sender = self.event_sender.clone();
            let battery_handler = TypedEventHandler::new(
                move |_: windows::core::Ref<GattCharacteristic>,
                      args: windows::core::Ref<GattValueChangedEventArgs>| {
                    if let Some(args) = args.as_ref() {
                        let bytes = connection::read_buffer(&args.CharacteristicValue()?)
                            .unwrap_or_default();
                        if let Ok(level) = protocol::parse_battery_level(&bytes) {
                            let _ = sender.send(TransportEvent::BatteryLevel(level));
                        }
                    }
                    Ok(())
                },
            );
            battery.ValueChanged(&battery_handler)?;
        }

        let sender = self.event_sender.clone();
        let status_handler =
            TypedEventHandler::new(move |dev: windows::core::Ref<BluetoothLEDevice>, _| {
                if let Some(dev) = dev.as_ref() {
                    if dev.ConnectionStatus()? == BluetoothConnectionStatus::Disconnected {
                        let _ = sender.send(TransportEvent::Disconnected);
                    }
                }
                Ok(())
            });
        result.device.ConnectionStatusChanged(&status_handler)?;

        Ok(())
    }

    /// Disconnect from the current device
    pub fn disconnect(&mut self) {
        if let Some(device) = self.device.take() {
            let _ = device.Close();
            info!("Disconnected from device");
            let _ = self.event_sender.send(TransportEvent::Disconnected);
        }
        self.state_characteristic = None;
        self.battery_characteristic = None;
    }

    pub fn is_connected(&self) -> bool {
        self.device.as_ref().map(BleConnection::is_connected).unwrap_or(false)
    }
}

impl Transport for BluetoothService {
    async fn recv(&mut self) -> Result<Option<TransportEvent>> {
        Ok(self.events.recv().await)
    }
}
