//! Pure validation primitives and the numeric limits shared by the setters.
//!
//! Every function here is total: bad input yields `false`, never a panic.

use std::collections::BTreeMap;

/// Inclusive numeric bounds for a configuration field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
    pub whole: bool,
}

pub const LIFT_RANGE: FieldRange = FieldRange {
    field: "lift",
    min: 0.0,
    max: 6.0,
    whole: false,
};

pub const ROUGHNESS_RANGE: FieldRange = FieldRange {
    field: "roughness",
    min: 0.0,
    max: 1.0,
    whole: false,
};

pub const RIM_DIAMETER_RANGE: FieldRange = FieldRange {
    field: "rim_diameter",
    min: 15.0,
    max: 20.0,
    whole: true,
};

pub const RIM_WIDTH_RANGE: FieldRange = FieldRange {
    field: "rim_width",
    min: 7.0,
    max: 12.0,
    whole: false,
};

pub const TIRE_DIAMETER_RANGE: FieldRange = FieldRange {
    field: "tire_diameter",
    min: 28.0,
    max: 40.0,
    whole: true,
};

pub const OPACITY_RANGE: FieldRange = FieldRange {
    field: "opacity",
    min: 0.0,
    max: 1.0,
    whole: false,
};

/// The one non-hex value accepted for rim colors.
pub const SILVER: &str = "silver";

impl FieldRange {
    /// Checks membership and returns the message the façade reports on failure.
    pub fn check(&self, value: f64) -> Result<f64, String> {
        if !is_in_range(value, self.min, self.max) {
            return Err(format!(
                "{} must be between {} and {} (got {})",
                self.field, self.min, self.max, value
            ));
        }
        if self.whole && value.fract() != 0.0 {
            return Err(format!(
                "{} must be a whole number (got {})",
                self.field, value
            ));
        }
        Ok(value)
    }
}

/// `#RRGGBB`, either case, no alpha.
pub fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}

/// Hex color or the literal `"silver"`.
pub fn is_rim_color(value: &str) -> bool {
    value == SILVER || is_hex_color(value)
}

/// Inclusive range check. NaN is never in range.
pub fn is_in_range(value: f64, min: f64, max: f64) -> bool {
    !value.is_nan() && value >= min && value <= max
}

pub fn is_known_id<V>(id: &str, catalog: &BTreeMap<String, V>) -> bool {
    catalog.contains_key(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_requires_six_digits() {
        assert!(is_hex_color("#FFD700"));
        assert!(is_hex_color("#ffd700"));
        assert!(!is_hex_color("#FFD70"));
        assert!(!is_hex_color("#FFD700AA"));
        assert!(!is_hex_color("FFD700"));
        assert!(!is_hex_color("#GGGGGG"));
        assert!(!is_hex_color(""));
    }

    #[test]
    fn rim_color_accepts_silver() {
        assert!(is_rim_color("silver"));
        assert!(is_rim_color("#000000"));
        assert!(!is_rim_color("Silver"));
        assert!(!is_rim_color("gold"));
    }

    #[test]
    fn range_is_inclusive_and_rejects_nan() {
        assert!(is_in_range(0.0, 0.0, 6.0));
        assert!(is_in_range(6.0, 0.0, 6.0));
        assert!(!is_in_range(-0.0001, 0.0, 6.0));
        assert!(!is_in_range(6.0001, 0.0, 6.0));
        assert!(!is_in_range(f64::NAN, 0.0, 6.0));
    }

    #[test]
    fn whole_ranges_reject_fractions() {
        assert!(RIM_DIAMETER_RANGE.check(17.0).is_ok());
        assert!(RIM_DIAMETER_RANGE.check(17.5).is_err());
        assert!(RIM_WIDTH_RANGE.check(8.5).is_ok());
        let message = TIRE_DIAMETER_RANGE.check(41.0).unwrap_err();
        assert!(message.contains("tire_diameter"));
    }

    #[test]
    fn known_id_checks_catalog_keys() {
        let mut catalog = BTreeMap::new();
        catalog.insert("jeep_jku".to_string(), ());
        assert!(is_known_id("jeep_jku", &catalog));
        assert!(!is_known_id("jeep_jk", &catalog));
    }
}
