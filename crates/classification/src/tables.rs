//! Standard range tables for every hazard parameter.

use hazard_common::Parameter;
use once_cell::sync::Lazy;

use crate::ranges::{ClassificationRange as R, ClassificationTable};

/// Standard tables in [`Parameter::ALL`] order, built on first use.
static STANDARD_TABLES: Lazy<[ClassificationTable; 10]> = Lazy::new(|| Parameter::ALL.map(build));

pub fn standard_tables() -> &'static [ClassificationTable; 10] {
    &STANDARD_TABLES
}

/// Standard table for one parameter.
pub fn standard_table(parameter: Parameter) -> &'static ClassificationTable {
    &standard_tables()[parameter as usize]
}

fn build(parameter: Parameter) -> ClassificationTable {
    let ranges = match parameter {
        Parameter::Dem => vec![
            R::below(1000.0, 6.0),
            R::between(1000.0, 2000.0, 4.0),
            R::between(2000.0, 3000.0, 2.0),
            R::at_least(3000.0, 1.0),
        ],
        Parameter::Slope => vec![
            R::below(15.0, 6.0),
            R::between(15.0, 30.0, 4.0),
            R::between(30.0, 35.0, 2.0),
            R::at_least(35.0, 1.0),
        ],
        Parameter::Lulc => vec![
            R::below(2.0, 0.0),
            R::between(2.0, 4.0, 9.0),
            R::between(4.0, 11.0, 0.0),
            R::at_least(11.0, 5.0),
        ],
        Parameter::Ndvi => vec![
            R::below(0.3, 0.0),
            R::between(0.3, 0.5, 4.0),
            R::between(0.5, 0.7, 6.0),
            R::at_least(0.7, 9.0),
        ],
        Parameter::Road | Parameter::Settlement => vec![
            R::below(1000.0, 9.0),
            R::between(1000.0, 2000.0, 6.0),
            R::between(2000.0, 3000.0, 3.0),
            R::at_least(3000.0, 1.0),
        ],
        Parameter::Tmax => vec![
            R::below(10.0, 1.0),
            R::between(10.0, 15.0, 3.0),
            R::between(15.0, 25.0, 6.0),
            R::at_least(25.0, 9.0),
        ],
        Parameter::Rh => vec![
            R::below(10.0, 6.0),
            R::between(10.0, 30.0, 4.0),
            R::between(30.0, 50.0, 2.0),
            R::at_least(50.0, 1.0),
        ],
        Parameter::Ppt => vec![
            R::below(1.0, 1.0),
            R::between(1.0, 3.0, 0.1),
            R::between(3.0, 5.0, 0.01),
            R::at_least(5.0, 0.0),
        ],
        // North straddles the 0/360 seam
        Parameter::Aspect => vec![
            R::between(0.0, 22.5, 2.0),
            R::between(22.5, 67.5, 3.0),
            R::between(67.5, 112.5, 4.0),
            R::between(112.5, 157.5, 4.0),
            R::between(157.5, 202.5, 5.0),
            R::between(202.5, 247.5, 1.0),
            R::between(247.5, 292.5, 1.0),
            R::between(292.5, 337.5, 1.0),
            R::between(337.5, 360.0, 2.0),
        ],
    };
    ClassificationTable::unchecked(parameter, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_standard_table_is_valid() {
        for (table, parameter) in standard_tables().iter().zip(Parameter::ALL) {
            assert_eq!(table.parameter(), parameter);
            table.validate().unwrap();
        }
    }

    #[test]
    fn test_bucket_counts() {
        for parameter in Parameter::ALL {
            let expected = if parameter.is_angular() { 9 } else { 4 };
            assert_eq!(standard_table(parameter).ranges().len(), expected, "{}", parameter);
        }
    }

    #[test]
    fn test_aspect_compass_points() {
        let aspect = standard_table(Parameter::Aspect);
        let classes: Vec<_> = [0.0, 90.0, 180.0, 270.0, 360.0]
            .iter()
            .map(|&v| aspect.class_for(v))
            .collect();
        assert_eq!(
            classes,
            vec![Some(2.0), Some(4.0), Some(5.0), Some(1.0), Some(2.0)]
        );
    }

    #[test]
    fn test_ppt_codes_truncate_to_zero() {
        assert_eq!(standard_table(Parameter::Ppt).output_codes(), vec![0, 1]);
    }

    #[test]
    fn test_boundaries_are_lower_inclusive() {
        let dem = standard_table(Parameter::Dem);
        assert_eq!(dem.class_for(999.9), Some(6.0));
        assert_eq!(dem.class_for(1000.0), Some(4.0));
        assert_eq!(dem.class_for(3000.0), Some(1.0));
    }
}
