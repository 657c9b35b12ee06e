//! Process-wide configuration (SPEC_FULL.md §10.3, §5 "process-wide state").
//!
//! Lives behind an `RwLock`, not a one-shot cell, so a `CONFIGURE` event
//! (§6) can replace it after startup. Handler logic never reads this
//! directly; every engine operation takes `block_height_retention` as an
//! explicit argument. The demo CLI is the exception: it falls back to
//! `default_block_height_retention` when the caller didn't supply one.

use once_cell::sync::Lazy;
use std::error::Error;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct ModuleConfig {
    pub default_block_height_retention: i64,
    pub log_level: String,
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            default_block_height_retention: 288,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ModuleConfig {
    fn from_source(config: config::Config) -> Self {
        let default = Self::default();
        Self {
            default_block_height_retention: config
                .get_int("engine.default_block_height_retention")
                .unwrap_or(default.default_block_height_retention),
            log_level: config.get_string("logging.level").unwrap_or(default.log_level),
            log_format: config.get_string("logging.format").unwrap_or(default.log_format),
            metrics_enabled: config.get_bool("metrics.enabled").unwrap_or(default.metrics_enabled),
        }
    }
}

static GLOBAL_CONFIG: Lazy<RwLock<ModuleConfig>> = Lazy::new(|| RwLock::new(ModuleConfig::default()));

/// Load `config.toml` (if present) over the built-in defaults and install
/// it as the process-wide configuration. Safe to call more than once; the
/// last call wins.
pub fn init_global_config() -> Result<(), Box<dyn Error>> {
    let built = config::Config::builder()
        .add_source(config::File::with_name("config.toml").required(false))
        .build()?;
    let mut guard = GLOBAL_CONFIG.write().map_err(|_| "config lock poisoned")?;
    *guard = ModuleConfig::from_source(built);
    Ok(())
}

/// A snapshot of the current process-wide configuration.
pub fn get_global_config() -> ModuleConfig {
    GLOBAL_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Module-facing `update(CONFIGURE)` handler (§6): replace the
/// process-wide configuration under the write lock. Any other event is a
/// no-op.
pub fn apply_configure_event(config: ModuleConfig) {
    let mut guard = GLOBAL_CONFIG.write().unwrap_or_else(|e| e.into_inner());
    *guard = config;
}

/// Load a standalone `ModuleConfig` without touching the process-wide
/// cell, for binaries that want their own copy (the demo CLI).
pub fn load_config() -> Result<ModuleConfig, Box<dyn Error>> {
    let built = config::Config::builder()
        .add_source(config::File::with_name("config.toml").required(false))
        .build()?;
    Ok(ModuleConfig::from_source(built))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_retention() {
        let c = ModuleConfig::default();
        assert_eq!(c.default_block_height_retention, 288);
        assert!(c.metrics_enabled);
    }

    #[test]
    fn configure_event_replaces_global_config() {
        let mut custom = ModuleConfig::default();
        custom.default_block_height_retention = 42;
        apply_configure_event(custom);
        assert_eq!(get_global_config().default_block_height_retention, 42);
        apply_configure_event(ModuleConfig::default());
    }
}
