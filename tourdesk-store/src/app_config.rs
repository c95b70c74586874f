use serde::Deserialize;
use std::env;
use tourdesk_core::dates::DateNormalization;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub business_rules: BusinessRules,
    pub storage: StorageConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Time of day (UTC, `HH:MM`) the due-date sweep runs.
    #[serde(default = "default_sweep_at")]
    pub sweep_at: String,
    #[serde(default = "default_drain_interval")]
    pub drain_interval_seconds: u64,
    #[serde(default = "default_drain_batch")]
    pub drain_batch_size: i64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// A job claimed longer ago than this without being marked sent or
    /// failed is handed to the next drain.
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_seconds: i64,
}

impl SchedulerConfig {
    pub fn visibility_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.visibility_timeout_seconds.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_reminder_window")]
    pub reminder_window_days: i64,
    #[serde(default = "default_seats_per_vehicle")]
    pub seats_per_vehicle: u32,
    /// Days added to admin-entered tour and due dates. 0 disables the shift.
    #[serde(default = "default_date_offset")]
    pub date_offset_days: i64,
}

impl BusinessRules {
    pub fn date_normalization(&self) -> DateNormalization {
        DateNormalization::new(self.date_offset_days)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub root: String,
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub from_address: String,
}

fn default_max_connections() -> u32 { 5 }
fn default_sweep_at() -> String { "00:00".to_string() }
fn default_drain_interval() -> u64 { 60 }
fn default_drain_batch() -> i64 { 50 }
fn default_max_attempts() -> i32 { 5 }
fn default_visibility_timeout() -> i64 { 300 }
fn default_reminder_window() -> i64 { 5 }
fn default_seats_per_vehicle() -> u32 { 6 }
fn default_date_offset() -> i64 { 1 }
fn default_public_prefix() -> String { "storage".to_string() }
fn default_max_upload() -> usize { tourdesk_core::storage::MAX_UPLOAD_BYTES }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `TOURDESK__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("TOURDESK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_optional_keys_take_defaults() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [database]
                url = "postgres://localhost/tourdesk"
                [scheduler]
                max_attempts = 3
                [business_rules]
                date_offset_days = 0
                [storage]
                root = "/tmp/receipts"
                [mail]
                from_address = "office@example.com"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg: Config = s.try_deserialize().unwrap();

        assert_eq!(cfg.scheduler.sweep_at, "00:00");
        assert_eq!(cfg.scheduler.drain_interval_seconds, 60);
        assert_eq!(cfg.scheduler.max_attempts, 3);
        assert_eq!(cfg.scheduler.visibility_timeout(), chrono::Duration::minutes(5));
        assert_eq!(cfg.business_rules.reminder_window_days, 5);
        assert_eq!(cfg.business_rules.seats_per_vehicle, 6);
        assert_eq!(cfg.business_rules.date_normalization(), DateNormalization::identity());
        assert_eq!(cfg.storage.max_upload_bytes, 5 * 1024 * 1024);
    }
}
