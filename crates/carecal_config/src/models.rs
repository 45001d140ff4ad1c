// --- File: crates/carecal_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

// --- Logging Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// --- Clinic Config ---
// Clinic-wide settings shared by every provider.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClinicConfig {
    /// IANA time zone name, e.g. "Europe/Zurich".
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
        }
    }
}

fn default_time_zone() -> String {
    "Europe/Zurich".to_string()
}

// --- Schedule Defaults ---
// Seed values for a provider that has not saved its own settings yet.
// Times are "HH:MM" strings and weekdays are day names; they are validated
// when turned into a provider schedule, not here.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleDefaults {
    pub working_days: Vec<String>,
    pub work_start_time: String,
    pub work_end_time: String,
    pub slot_duration_minutes: u32,
    #[serde(default)]
    pub buffer_minutes: u32,
    #[serde(default)]
    pub break_enabled: bool,
    pub break_start_time: Option<String>,
    pub break_end_time: Option<String>,
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default = "default_true")]
    pub offline: bool,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            working_days: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            work_start_time: "09:00".to_string(),
            work_end_time: "18:00".to_string(),
            slot_duration_minutes: 30,
            buffer_minutes: 0,
            break_enabled: true,
            break_start_time: Some("13:00".to_string()),
            break_end_time: Some("14:00".to_string()),
            online: true,
            offline: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleSettings {
    /// Reuse composed days while none of the provider's inputs changed.
    #[serde(default)]
    pub memoize: bool,
    /// Most composed days kept when memoising; the oldest go first.
    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: usize,
    #[serde(default)]
    pub defaults: ScheduleDefaults,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            memoize: false,
            memo_capacity: default_memo_capacity(),
            defaults: ScheduleDefaults::default(),
        }
    }
}

fn default_memo_capacity() -> usize {
    512
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub clinic: ClinicConfig,
    #[serde(default)]
    pub schedule: ScheduleSettings,
}
