//! Engine configuration: policy thresholds and the store's calendar.
//!
//! Every threshold the reconciliation and alerting rules use lives here,
//! so a deployment can override them from `data/engine_config.json`.

use crate::error::{EngineError, EngineResult};
use chrono::{FixedOffset, Offset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenditionThresholds {
    /// Allowed gap between a denomination breakdown and the declared amount.
    pub breakdown_tolerance: Decimal,
    /// Absolute difference above which a "large difference" is flagged.
    pub large_difference: Decimal,
    /// Relative difference (percent of expected) above which it is flagged.
    pub relative_difference_pct: Decimal,
    /// Largest absolute difference that may still be auto-approved (inclusive).
    pub auto_approve_band: Decimal,
}

impl Default for RenditionThresholds {
    fn default() -> Self {
        Self {
            breakdown_tolerance:     Decimal::new(1, 2),
            large_difference:        Decimal::from(1000),
            relative_difference_pct: Decimal::from(5),
            auto_approve_band:       Decimal::from(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Absolute difference above which an alert goes out even when the
    /// rendition carries no discrepancy.
    pub alert_difference: Decimal,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            alert_difference: Decimal::from(500),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Store-local offset from UTC, in minutes (Chile is -240 or -180).
    pub utc_offset_minutes: i32,
}

impl CalendarConfig {
    /// The configured offset; out-of-range values (rejected by
    /// `EngineConfig::validate`) fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rendition: RenditionThresholds,
    pub alerts:    AlertPolicy,
    pub calendar:  CalendarConfig,
}

impl EngineConfig {
    /// Load from a JSON file. Missing sections keep their defaults.
    /// In tests, use `EngineConfig::default()`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        log::debug!("loaded engine config from {path}: {config:?}");
        Ok(config)
    }

    /// Reject thresholds that would make the policy meaningless.
    pub fn validate(&self) -> EngineResult<()> {
        let r = &self.rendition;
        let checks = [
            ("rendition.breakdown_tolerance", r.breakdown_tolerance),
            ("rendition.large_difference", r.large_difference),
            ("rendition.relative_difference_pct", r.relative_difference_pct),
            ("rendition.auto_approve_band", r.auto_approve_band),
            ("alerts.alert_difference", self.alerts.alert_difference),
        ];
        for (field, value) in checks {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(EngineError::validation(field, "threshold must be non-negative"));
            }
        }
        if offset_from_minutes(self.calendar.utc_offset_minutes).is_none() {
            return Err(EngineError::validation(
                "calendar.utc_offset_minutes",
                format!("{} is not a valid UTC offset", self.calendar.utc_offset_minutes),
            ));
        }
        if r.auto_approve_band > r.large_difference {
            log::warn!(
                "auto_approve_band {} exceeds large_difference {}: \
                 large differences will still block approval via their discrepancy",
                r.auto_approve_band,
                r.large_difference
            );
        }
        Ok(())
    }
}
