use crate::infrastructure::bluetooth::protocol;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "giiker_cube".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    // Discovery
    #[serde(default = "default_name_prefix")]
    pub device_name_prefix: String,
    #[serde(default = "default_scan_timeout_ms")]
    pub scan_timeout_ms: u64,
    #[serde(default)]
    pub last_connected_address: Option<u64>,

    // Advanced BLE Settings
    #[serde(default = "default_service_uuid")]
    pub ble_service_uuid: String,
    #[serde(default = "default_state_uuid")]
    pub ble_state_char_uuid: String,
    #[serde(default = "default_battery_service_uuid")]
    pub ble_battery_service_uuid: String,
    #[serde(default = "default_battery_level_uuid")]
    pub ble_battery_level_char_uuid: String,

    /// Dispatch every move of the device's history instead of only the latest
    #[serde(default = "default_false")]
    pub dispatch_move_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_settings: LogSettings::default(),
            device_name_prefix: default_name_prefix(),
            scan_timeout_ms: default_scan_timeout_ms(),
            last_connected_address: None,
            ble_service_uuid: default_service_uuid(),
            ble_state_char_uuid: default_state_uuid(),
            ble_battery_service_uuid: default_battery_service_uuid(),
            ble_battery_level_char_uuid: default_battery_level_uuid(),
            dispatch_move_history: false,
        }
    }
}

fn default_name_prefix() -> String {
    protocol::DEVICE_NAME_PREFIX.to_string()
}
fn default_scan_timeout_ms() -> u64 {
    15_000
}
fn default_service_uuid() -> String {
    protocol::SERVICE_UUID.to_string()
}
fn default_state_uuid() -> String {
    protocol::STATE_CHAR_UUID.to_string()
}
fn default_battery_service_uuid() -> String {
    protocol::BATTERY_SERVICE_UUID.to_string()
}
fn default_battery_level_uuid() -> String {
    protocol::BATTERY_LEVEL_CHAR_UUID.to_string()
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::with_path(settings_path))
    }

    /// Load settings from `settings_path`, falling back to defaults
    pub fn with_path(settings_path: PathBuf) -> Self {
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();
        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("GiikerCube");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn set_last_connected(&mut self, address: u64) -> anyhow::Result<()> {
        if self.settings.last_connected_address != Some(address) {
            self.settings.last_connected_address = Some(address);
            self.save()?;
        }
        Ok(())
    }
}
