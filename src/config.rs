//! Element configuration.

use crate::element::DemandUnit;
use crate::error::{Error, Result};

// ============================================================================
// Admission
// ============================================================================

/// Configuration for the admission buffer of pull-mode input pads.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionConfig {
    /// Number of units the buffer keeps requested or queued.
    pub preferred_size: usize,

    /// Demand is topped up once requested + queued units fall to this
    /// percentage of `preferred_size`.
    pub low_watermark_percent: usize,

    /// Queued units above `preferred_size * overflow_factor` raise the
    /// overflow warning.
    pub overflow_factor: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            preferred_size: 40,
            low_watermark_percent: 50,
            overflow_factor: 4,
        }
    }
}

impl AdmissionConfig {
    /// Create a config with the given preferred size and default watermarks.
    pub fn with_preferred_size(preferred_size: usize) -> Self {
        Self {
            preferred_size,
            ..Default::default()
        }
    }

    /// Set the low watermark percentage.
    pub fn with_low_watermark_percent(mut self, percent: usize) -> Self {
        self.low_watermark_percent = percent;
        self
    }

    /// Set the overflow factor.
    pub fn with_overflow_factor(mut self, factor: usize) -> Self {
        self.overflow_factor = factor;
        self
    }

    /// Check the configuration for nonsensical values.
    pub fn validate(&self) -> Result<()> {
        if self.preferred_size == 0 {
            return Err(Error::Config("admission preferred_size must be > 0".into()));
        }
        if self.low_watermark_percent > 100 {
            return Err(Error::Config(format!(
                "admission low_watermark_percent must be <= 100, got {}",
                self.low_watermark_percent
            )));
        }
        if self.overflow_factor < 1 {
            return Err(Error::Config("admission overflow_factor must be >= 1".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Element
// ============================================================================

/// Element configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementConfig {
    /// Admission buffer settings for pull-mode input pads.
    pub admission: AdmissionConfig,

    /// Demand unit for pads that don't set one explicitly.
    pub default_demand_unit: DemandUnit,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            admission: AdmissionConfig::default(),
            default_demand_unit: DemandUnit::Buffers,
        }
    }
}

impl ElementConfig {
    /// Small admission buffers: less queued data, more demand messages.
    pub fn low_latency() -> Self {
        Self {
            admission: AdmissionConfig::with_preferred_size(4).with_low_watermark_percent(50),
            ..Default::default()
        }
    }

    /// Large admission buffers: fewer demand round-trips.
    pub fn throughput() -> Self {
        Self {
            admission: AdmissionConfig::with_preferred_size(256).with_low_watermark_percent(25),
            ..Default::default()
        }
    }

    /// Set the admission config.
    pub fn with_admission(mut self, admission: AdmissionConfig) -> Self {
        self.admission = admission;
        self
    }

    /// Set the default demand unit.
    pub fn with_demand_unit(mut self, unit: DemandUnit) -> Self {
        self.default_demand_unit = unit;
        self
    }

    /// Check the configuration for nonsensical values.
    pub fn validate(&self) -> Result<()> {
        self.admission.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_presets() {
        let config = ElementConfig::low_latency();
        assert_eq!(config.admission.preferred_size, 4);
        assert!(config.validate().is_ok());

        let config = ElementConfig::throughput();
        assert_eq!(config.admission.preferred_size, 256);
        assert_eq!(config.admission.low_watermark_percent, 25);

        let config = ElementConfig::default().with_demand_unit(DemandUnit::Bytes);
        assert_eq!(config.default_demand_unit, DemandUnit::Bytes);
    }

    #[test]
    fn test_admission_validation() {
        assert!(AdmissionConfig::default().validate().is_ok());
        assert!(AdmissionConfig::with_preferred_size(0).validate().is_err());
        assert!(
            AdmissionConfig::default()
                .with_low_watermark_percent(101)
                .validate()
                .is_err()
        );
        assert!(
            AdmissionConfig::default()
                .with_overflow_factor(0)
                .validate()
                .is_err()
        );
    }
}
