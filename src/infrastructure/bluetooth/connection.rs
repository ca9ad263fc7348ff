//! BLE Connection Module
//!
//! Handles device connection and GATT service access.

use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::protocol;
use anyhow::Result;
use tracing::{error, info, warn};
use windows::core::GUID;
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattClientCharacteristicConfigurationDescriptorValue,
    GattCommunicationStatus,
};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Storage::Streams::{DataReader, IBuffer};

/// Configuration for connection behavior
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Advertised name prefix to scan for
    pub name_prefix: String,
    /// Cube state service UUID
    pub service_uuid: String,
    /// Cube state characteristic UUID
    pub state_char_uuid: String,
    /// Battery service UUID
    pub battery_service_uuid: String,
    /// Battery level characteristic UUID
    pub battery_char_uuid: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            name_prefix: protocol::DEVICE_NAME_PREFIX.to_string(),
            service_uuid: protocol::SERVICE_UUID.to_string(),
            state_char_uuid: protocol::STATE_CHAR_UUID.to_string(),
            battery_service_uuid: protocol::BATTERY_SERVICE_UUID.to_string(),
            battery_char_uuid: protocol::BATTERY_LEVEL_CHAR_UUID.to_string(),
        }
    }
}

impl From<&Settings> for ConnectionConfig {
    fn from(s: &Settings) -> Self {
        Self {
            name_prefix: s.device_name_prefix.clone(),
            service_uuid: s.ble_service_uuid.clone(),
            state_char_uuid: s.ble_state_char_uuid.clone(),
            battery_service_uuid: s.ble_battery_service_uuid.clone(),
            battery_char_uuid: s.ble_battery_level_char_uuid.clone(),
        }
    }
}

/// Result of a successful connection
pub struct ConnectionResult {
    pub device: BluetoothLEDevice,
    pub state_characteristic: GattCharacteristic,
    /// Missing on firmwares without a battery service
    pub battery_characteristic: Option<GattCharacteristic>,
}

/// Copy the contents of a WinRT buffer
pub fn read_buffer(buffer: &IBuffer) -> Result<Vec<u8>> {
    let reader = DataReader::FromBuffer(buffer)?;
    let length = reader.UnconsumedBufferLength()? as usize;
    let mut bytes = vec![0u8; length];
    reader.ReadBytes(&mut bytes)?;
    Ok(bytes)
}

/// Parse a UUID string into a Windows GUID
pub fn parse_guid(uuid_str: &str) -> Result<GUID> {
    Ok(GUID::from_u128(protocol::parse_uuid(uuid_str)?))
}

/// BLE Connection handler
pub struct BleConnection {
    config: ConnectionConfig,
}

impl BleConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Connect to a device by Bluetooth address
    pub async fn connect(&self, address: u64) -> Result<ConnectionResult> {
        info!("Connecting to Bluetooth device: {:#X}", address);

        let device = BluetoothLEDevice::FromBluetoothAddressAsync(address)?.await?;
        info!("Device connected: {:?}", device.Name()?);

        let state_char = self
            .get_characteristic(
                &device,
                &self.config.service_uuid,
                &self.config.state_char_uuid,
            )
            .await?;
        self.enable_notifications(&state_char).await?;

        let battery_char = match self
            .get_characteristic(
                &device,
                &self.config.battery_service_uuid,
                &self.config.battery_char_uuid,
            )
            .await
        {
            Ok(c) => {
                if let Err(e) = self.enable_notifications(&c).await {
                    warn!("Battery notifications unavailable: {}", e);
                }
                Some(c)
            }
            Err(e) => {
                warn!("Battery service not available: {}", e);
                None
            }
        };

        Ok(ConnectionResult {
            device,
            state_characteristic: state_char,
            battery_characteristic: battery_char,
        })
    }

    /// Find one characteristic inside one service
    async fn get_characteristic(
        &self,
        device: &BluetoothLEDevice,
        service_uuid: &str,
        char_uuid: &str,
    ) -> Result<GattCharacteristic> {
        let service_guid = parse_guid(service_uuid)?;
        let char_guid = parse_guid(char_uuid)?;

        let services_result = device.GetGattServicesForUuidAsync(service_guid)?.await?;
        if services_result.Status()? != GattCommunicationStatus::Success {
            error!(
                "Failed to get GATT services: {:?}",
                services_result.Status()?
            );
            anyhow::bail!("Failed to get GATT services");
        }

        let services = services_result.Services()?;
        if services.Size()? == 0 {
            anyhow::bail!("Service {} not found", service_uuid);
        }
        let service = services.GetAt(0)?;

        let chars_result = service.GetCharacteristicsForUuidAsync(char_guid)?.await?;
        if chars_result.Status()? != GattCommunicationStatus::Success {
            anyhow::bail!("Failed to get characteristics");
        }

        let characteristics = chars_result.Characteristics()?;
        if characteristics.Size()? == 0 {
            anyhow::bail!("Characteristic {} not found", char_uuid);
        }

        info!("Found characteristic {}", char_uuid);
        Ok(characteristics.GetAt(0)?)
    }

    /// Read the current value of a characteristic
    pub async fn read_value(characteristic: &GattCharacteristic) -> Result<Vec<u8>> {
        let result = characteristic.ReadValueAsync()?.await?;
        if result.Status()? != GattCommunicationStatus::Success {
            anyhow::bail!("Read failed: {:?}", result.Status()?);
        }
        read_buffer(&result.Value()?)
    }

    /// Enable notifications with retry logic
    async fn enable_notifications(&self, characteristic: &GattCharacteristic) -> Result<()> {
        for attempt in 1..=3 {
            match characteristic
                .WriteClientCharacteristicConfigurationDescriptorAsync(
                    GattClientCharacteristicConfigurationDescriptorValue::Notify,
                )?
                .await
            {
                Ok(GattCommunicationStatus::Success) => {
                    info!("Notifications enabled");
                    return Ok(());
                }
                Ok(status) => {
                    warn!("Notification subscription returned status: {:?}", status);
                }
                Err(e) => {
                    warn!("Notification subscription attempt {} failed: {:?}", attempt, e);
                }
            }
            if attempt < 3 {
                tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            }
        }

        error!("Failed to enable notifications after all attempts");
        anyhow::bail!("Failed to enable notifications")
    }

    /// Check if device is connected
    pub fn is_connected(device: &BluetoothLEDevice) -> bool {
        device
            .ConnectionStatus()
            .map(|s| s == BluetoothConnectionStatus::Connected)
            .unwrap_or(false)
    }
}
