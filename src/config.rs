//! Configuration loading from environment variables.
//!
//! All values are read from `LAZYMOUNT_*` variables with sensible defaults.
//! Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `LAZYMOUNT_DEBOUNCE_MS` | 100 | Coalescing window for viewport checks (ms) |
//! | `LAZYMOUNT_ROOT_MARGIN_PX` | 100 | Pre-visibility margin (px) |
//! | `LAZYMOUNT_THRESHOLD_PCT` | 10 | Minimum visible fraction (percent) |
//! | `LAZYMOUNT_PLACEHOLDER_HEIGHT` | 200 | Default placeholder height (px) |
//! | `LAZYMOUNT_EVENT_CAPACITY` | 64 | Lifecycle event buffer |
//! | `LAZYMOUNT_LOG` | info | Log filter directive |
//! | `LAZYMOUNT_LOG_FORMAT` | json | `json` or `pretty` |

use std::time::Duration;

use serde::Serialize;

use crate::telemetry::{LogConfig, LogFormat};
use crate::visibility::ObserveOptions;
use crate::VirtualizerConfig;

/// Effective configuration summary (serializable).
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub debounce_ms: u64,
    pub root_margin_px: u32,
    pub threshold_pct: u32,
    pub placeholder_height: u32,
    pub event_capacity: usize,
    pub log_level: String,
    pub log_format: String,
}

/// All configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub virtualizer: VirtualizerConfig,
    pub log: LogConfig,
}

fn parse_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u32>().unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

fn load_observe_options() -> ObserveOptions {
    let root_margin_px = parse_u32("LAZYMOUNT_ROOT_MARGIN_PX", 100);
    let threshold_pct = parse_u32("LAZYMOUNT_THRESHOLD_PCT", 10).min(100);
    ObserveOptions {
        root_margin_px,
        threshold: threshold_pct as f32 / 100.0,
    }
}

fn load_log_config() -> LogConfig {
    let level = std::env::var("LAZYMOUNT_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    let format = std::env::var("LAZYMOUNT_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or_default();
    LogConfig {
        format,
        level,
        output_path: None,
    }
}

/// Load all configuration from environment variables.
pub fn load() -> EnvConfig {
    let debounce_ms = parse_u64("LAZYMOUNT_DEBOUNCE_MS", 100).max(1);
    let placeholder_height = parse_u32("LAZYMOUNT_PLACEHOLDER_HEIGHT", 200).max(1);
    let event_capacity = parse_usize("LAZYMOUNT_EVENT_CAPACITY", 64).max(1);

    EnvConfig {
        virtualizer: VirtualizerConfig {
            debounce: Duration::from_millis(debounce_ms),
            observe: load_observe_options(),
            default_placeholder_height: placeholder_height,
            event_capacity,
        },
        log: load_log_config(),
    }
}

impl EnvConfig {
    pub fn effective_config(&self) -> EffectiveConfig {
        let v = &self.virtualizer;
        EffectiveConfig {
            debounce_ms: v.debounce.as_millis() as u64,
            root_margin_px: v.observe.root_margin_px,
            threshold_pct: (v.observe.threshold * 100.0).round() as u32,
            placeholder_height: v.default_placeholder_height,
            event_capacity: v.event_capacity,
            log_level: self.log.level.clone(),
            log_format: match self.log.format {
                LogFormat::Json => "json".to_string(),
                LogFormat::Pretty => "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "LAZYMOUNT_DEBOUNCE_MS",
        "LAZYMOUNT_ROOT_MARGIN_PX",
        "LAZYMOUNT_THRESHOLD_PCT",
        "LAZYMOUNT_PLACEHOLDER_HEIGHT",
        "LAZYMOUNT_EVENT_CAPACITY",
        "LAZYMOUNT_LOG",
        "LAZYMOUNT_LOG_FORMAT",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults_are_sensible() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        assert_eq!(cfg.virtualizer.debounce, Duration::from_millis(100));
        assert_eq!(cfg.virtualizer.observe.root_margin_px, 100);
        assert!((cfg.virtualizer.observe.threshold - 0.1).abs() < f32::EPSILON);
        assert_eq!(cfg.virtualizer.default_placeholder_height, 200);
        assert_eq!(cfg.virtualizer.event_capacity, 64);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.format, LogFormat::Json);
    }

    #[test]
    fn test_env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("LAZYMOUNT_DEBOUNCE_MS", "250");
        std::env::set_var("LAZYMOUNT_ROOT_MARGIN_PX", "300");
        std::env::set_var("LAZYMOUNT_THRESHOLD_PCT", "50");
        std::env::set_var("LAZYMOUNT_LOG", "lazymount=debug");
        std::env::set_var("LAZYMOUNT_LOG_FORMAT", "pretty");
        let cfg = load();
        assert_eq!(cfg.virtualizer.debounce, Duration::from_millis(250));
        assert_eq!(cfg.virtualizer.observe.root_margin_px, 300);
        assert!((cfg.virtualizer.observe.threshold - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.log.level, "lazymount=debug");
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        clear_env_vars();
    }

    #[test]
    fn test_invalid_env_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("LAZYMOUNT_DEBOUNCE_MS", "soon");
        std::env::set_var("LAZYMOUNT_PLACEHOLDER_HEIGHT", "-4");
        std::env::set_var("LAZYMOUNT_LOG_FORMAT", "xml");
        let cfg = load();
        assert_eq!(cfg.virtualizer.debounce, Duration::from_millis(100));
        assert_eq!(cfg.virtualizer.default_placeholder_height, 200);
        assert_eq!(cfg.log.format, LogFormat::Json);
        clear_env_vars();
    }

    #[test]
    fn test_floors_and_clamps() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("LAZYMOUNT_DEBOUNCE_MS", "0");
        std::env::set_var("LAZYMOUNT_THRESHOLD_PCT", "250");
        std::env::set_var("LAZYMOUNT_EVENT_CAPACITY", "0");
        let cfg = load();
        assert_eq!(cfg.virtualizer.debounce, Duration::from_millis(1));
        assert!((cfg.virtualizer.observe.threshold - 1.0).abs() < f32::EPSILON);
        assert_eq!(cfg.virtualizer.event_capacity, 1);
        clear_env_vars();
    }

    #[test]
    fn test_effective_config_round_trips_values() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let eff = load().effective_config();
        assert_eq!(eff.debounce_ms, 100);
        assert_eq!(eff.threshold_pct, 10);
        assert_eq!(eff.log_format, "json");
    }
}
