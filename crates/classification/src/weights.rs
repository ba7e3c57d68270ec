//! Parameter weight table.

use hazard_common::Parameter;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Raw weight settings as loaded from configuration.
///
/// `ppt` is not a weight but a flag enabling the precipitation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub dem: f64,
    pub slope: f64,
    pub lulc: f64,
    pub ndvi: f64,
    pub road: f64,
    pub settlement: f64,
    pub tmax: f64,
    pub rh: f64,
    pub aspect: f64,
    pub ppt: i64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            dem: 0.07,
            slope: 0.11,
            lulc: 0.24,
            ndvi: 0.13,
            road: 0.07,
            settlement: 0.07,
            tmax: 0.17,
            rh: 0.07,
            aspect: 0.07,
            ppt: 1,
        }
    }
}

impl WeightConfig {
    fn weights(&self) -> [(Parameter, f64); 9] {
        [
            (Parameter::Dem, self.dem),
            (Parameter::Slope, self.slope),
            (Parameter::Lulc, self.lulc),
            (Parameter::Ndvi, self.ndvi),
            (Parameter::Road, self.road),
            (Parameter::Settlement, self.settlement),
            (Parameter::Tmax, self.tmax),
            (Parameter::Rh, self.rh),
            (Parameter::Aspect, self.aspect),
        ]
    }

    /// Validate and freeze into a [`WeightTable`].
    ///
    /// Every violation is reported: zero weights, a sum that does not round
    /// to 1, and a precipitation flag outside {0, 1}.
    pub fn build(&self) -> Result<WeightTable, ConfigError> {
        let weights = self.weights();
        let mut violations = Vec::new();

        for (parameter, weight) in &weights {
            if *weight == 0.0 {
                violations.push(format!("weight of {} must be non-zero", parameter));
            }
        }

        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if sum.round_ties_even() != 1.0 {
            violations.push(format!("weights sum to {} which does not round to 1", sum));
        }

        if !matches!(self.ppt, 0 | 1) {
            violations.push(format!("ppt flag must be 0 or 1, got {}", self.ppt));
        }

        ConfigError::check("weight table", violations)?;

        Ok(WeightTable {
            weights,
            ppt_enabled: self.ppt == 1,
        })
    }
}

/// Validated, read-only parameter weights.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: [(Parameter, f64); 9],
    ppt_enabled: bool,
}

impl WeightTable {
    /// Weight of a parameter; precipitation reports its flag as 0 or 1.
    pub fn weight(&self, parameter: Parameter) -> f64 {
        if parameter == Parameter::Ppt {
            return if self.ppt_enabled { 1.0 } else { 0.0 };
        }
        self.weights
            .iter()
            .find(|(p, _)| *p == parameter)
            .map_or(0.0, |(_, w)| *w)
    }

    pub fn ppt_enabled(&self) -> bool {
        self.ppt_enabled
    }

    /// Weighted parameters (everything but the flag).
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        self.weights.iter().copied()
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        let config = WeightConfig::default();
        Self {
            weights: config.weights(),
            ppt_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        let table = WeightConfig::default().build().unwrap();
        assert_eq!(table, WeightTable::default());
        assert!((table.total() - 1.0).abs() < 1e-9);
        assert_eq!(table.weight(Parameter::Lulc), 0.24);
        assert_eq!(table.weight(Parameter::Ppt), 1.0);
        assert_eq!(table.iter().count(), 9);
    }

    #[test]
    fn test_zero_weight_rejected() {
        let config = WeightConfig {
            dem: 0.0,
            slope: 0.18,
            ..WeightConfig::default()
        };
        let err = config.build().unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(err.violations[0].contains("dem"));
    }

    #[test]
    fn test_sum_must_round_to_one() {
        let config = WeightConfig {
            lulc: 0.9,
            ..WeightConfig::default()
        };
        assert!(config.build().is_err());

        // 1.4 still rounds to 1
        let config = WeightConfig {
            lulc: 0.64,
            ..WeightConfig::default()
        };
        assert!(config.build().is_ok());
    }

    #[test]
    fn test_every_violation_reported() {
        let config = WeightConfig {
            dem: 0.0,
            rh: 0.0,
            lulc: 2.0,
            ppt: 2,
            ..WeightConfig::default()
        };
        let err = config.build().unwrap_err();
        assert_eq!(err.violations.len(), 4);
        assert_eq!(err.subject, "weight table");
    }

    #[test]
    fn test_ppt_flag_off() {
        let table = WeightConfig {
            ppt: 0,
            ..WeightConfig::default()
        }
        .build()
        .unwrap();
        assert!(!table.ppt_enabled());
        assert_eq!(table.weight(Parameter::Ppt), 0.0);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: WeightConfig = serde_yaml::from_str("dem: 0.1\nslope: 0.08\n").unwrap();
        assert_eq!(config.dem, 0.1);
        assert_eq!(config.lulc, 0.24);
        assert!(config.build().is_ok());
    }
}
