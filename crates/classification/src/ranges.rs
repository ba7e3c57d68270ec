//! Ordered range tables mapping continuous values to class codes.

use hazard_common::Parameter;
use tracing::warn;

use crate::error::{ClassificationError, Result};

/// Full turn for circular (angular) tables.
pub const FULL_CIRCLE: f64 = 360.0;

/// One entry of a range table.
///
/// Bounds are lower-inclusive and upper-exclusive; `None` leaves that side
/// open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationRange {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub class: f64,
}

impl ClassificationRange {
    /// `value < upper`
    pub const fn below(upper: f64, class: f64) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
            class,
        }
    }

    /// `value >= lower`
    pub const fn at_least(lower: f64, class: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
            class,
        }
    }

    /// `lower <= value < upper`
    pub const fn between(lower: f64, upper: f64, class: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
            class,
        }
    }

    pub fn is_open(&self) -> bool {
        self.lower.is_none() || self.upper.is_none()
    }

    /// Whether `value` falls inside the bounds. Nodata is not considered.
    pub fn contains(&self, value: f64) -> bool {
        let above = self.lower.map_or(true, |l| value >= l);
        let below = self.upper.map_or(true, |u| value < u);
        above && below
    }

    /// Code stored in the signed 8-bit output (truncated toward zero).
    pub fn output_code(&self) -> i8 {
        self.class.trunc() as i8
    }
}

/// Ordered range table for one parameter.
///
/// Entries are applied in order and a later match overrides an earlier one;
/// the order is never rearranged.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationTable {
    parameter: Parameter,
    ranges: Vec<ClassificationRange>,
    circular: bool,
}

impl ClassificationTable {
    /// Build and validate a table. Angular parameters get a circular table.
    pub fn new(parameter: Parameter, ranges: Vec<ClassificationRange>) -> Result<Self> {
        let table = Self::unchecked(parameter, ranges);
        table.validate()?;
        Ok(table)
    }

    pub(crate) fn unchecked(parameter: Parameter, ranges: Vec<ClassificationRange>) -> Self {
        let fractional: Vec<f64> = ranges
            .iter()
            .map(|r| r.class)
            .filter(|c| c.fract() != 0.0)
            .collect();
        if !fractional.is_empty() {
            warn!(
                parameter = %parameter,
                codes = ?fractional,
                "Class codes are not integral and will be truncated"
            );
        }

        Self {
            parameter,
            ranges,
            circular: parameter.is_angular(),
        }
    }

    /// Check the structural rules of the table.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(ClassificationError::invalid_table(self.parameter, reason));

        if self.ranges.is_empty() {
            return fail("table has no entries".to_string());
        }

        let open_lower = self.ranges.iter().filter(|r| r.lower.is_none()).count();
        let open_upper = self.ranges.iter().filter(|r| r.upper.is_none()).count();
        if open_lower > 1 || open_upper > 1 {
            return fail(format!(
                "at most one open-lower and one open-upper entry allowed, found {} and {}",
                open_lower, open_upper
            ));
        }

        for (i, range) in self.ranges.iter().enumerate() {
            if range.lower.is_none() && range.upper.is_none() {
                return fail(format!("entry {} is open on both sides", i));
            }
            if let (Some(l), Some(u)) = (range.lower, range.upper) {
                if !(l < u) {
                    return fail(format!("entry {} has lower bound {} >= upper bound {}", i, l, u));
                }
            }
            if !range.class.is_finite() {
                return fail(format!("entry {} has a non-finite class code", i));
            }
            if self.circular {
                match (range.lower, range.upper) {
                    (Some(l), Some(u)) if l >= 0.0 && u <= FULL_CIRCLE => {}
                    _ => {
                        return fail(format!(
                            "entry {} of a circular table must be closed within [0, 360]",
                            i
                        ))
                    }
                }
            }
        }

        Ok(())
    }

    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    pub fn ranges(&self) -> &[ClassificationRange] {
        &self.ranges
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    /// Value as compared against the bounds.
    ///
    /// A full turn on a circular table folds back to 0; everything else,
    /// including values outside [0, 360], is compared as is.
    pub fn normalize(&self, value: f64) -> f64 {
        if self.circular && value == FULL_CIRCLE {
            0.0
        } else {
            value
        }
    }

    /// Class of the last entry matching `value`.
    pub fn class_for(&self, value: f64) -> Option<f64> {
        let v = self.normalize(value);
        self.ranges
            .iter()
            .rev()
            .find(|r| r.contains(v))
            .map(|r| r.class)
    }

    /// Distinct output codes the table can produce, sorted.
    pub fn output_codes(&self) -> Vec<i8> {
        let mut codes: Vec<i8> = self.ranges.iter().map(|r| r.output_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_contains() {
        let r = ClassificationRange::between(10.0, 20.0, 3.0);
        assert!(r.contains(10.0));
        assert!(r.contains(19.999));
        assert!(!r.contains(20.0));
        assert!(!r.contains(f64::NAN));

        assert!(ClassificationRange::below(5.0, 1.0).contains(-1e9));
        assert!(ClassificationRange::at_least(5.0, 1.0).contains(5.0));
    }

    #[test]
    fn test_output_code_truncates() {
        assert_eq!(ClassificationRange::below(1.0, 0.1).output_code(), 0);
        assert_eq!(ClassificationRange::below(1.0, 0.01).output_code(), 0);
        assert_eq!(ClassificationRange::below(1.0, 9.0).output_code(), 9);
    }

    #[test]
    fn test_validation() {
        let two_open_lower = vec![
            ClassificationRange::below(1.0, 1.0),
            ClassificationRange::below(2.0, 2.0),
        ];
        assert!(ClassificationTable::new(Parameter::Dem, two_open_lower).is_err());

        let inverted = vec![ClassificationRange::between(5.0, 1.0, 1.0)];
        assert!(ClassificationTable::new(Parameter::Dem, inverted).is_err());

        assert!(ClassificationTable::new(Parameter::Dem, vec![]).is_err());

        let open_aspect = vec![ClassificationRange::at_least(0.0, 1.0)];
        assert!(ClassificationTable::new(Parameter::Aspect, open_aspect).is_err());
    }

    #[test]
    fn test_last_match_wins() {
        let table = ClassificationTable::new(
            Parameter::Slope,
            vec![
                ClassificationRange::below(20.0, 1.0),
                ClassificationRange::between(10.0, 30.0, 2.0),
                ClassificationRange::at_least(30.0, 3.0),
            ],
        )
        .unwrap();

        assert_eq!(table.class_for(5.0), Some(1.0));
        assert_eq!(table.class_for(15.0), Some(2.0));
        assert_eq!(table.class_for(45.0), Some(3.0));
        assert_eq!(table.output_codes(), vec![1, 2, 3]);
    }

    #[test]
    fn test_circular_normalization() {
        let table = ClassificationTable::new(
            Parameter::Aspect,
            vec![
                ClassificationRange::between(0.0, 180.0, 1.0),
                ClassificationRange::between(180.0, 360.0, 2.0),
            ],
        )
        .unwrap();

        assert!(table.is_circular());
        assert_eq!(table.class_for(360.0), Some(1.0));
        assert_eq!(table.class_for(359.9), Some(2.0));
        // Out of the circle's domain
        assert_eq!(table.class_for(-90.0), None);
        assert_eq!(table.class_for(540.0), None);
    }
}
