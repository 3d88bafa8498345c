//! Unit table
//!
//! Maps the unit names used in the channel configuration to the divisor that
//! converts the raw 16-bit bus value into the physical value, and the unit
//! shown next to it. A unit's factor is `1 / divisor`.

use crate::types::{CodecError, Result};

/// A named scaling rule for an analog channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDefinition {
    /// Name used in `GetFactorAnalogNN` / `SetFactorAnalogNN`
    pub name: &'static str,
    /// physical = raw / divisor
    pub divisor: u16,
    /// Unit appended to the reading (may be empty)
    pub display_unit: &'static str,
}

impl UnitDefinition {
    /// Factor from raw to physical value
    pub fn scale_factor(&self) -> f64 {
        1.0 / f64::from(self.divisor)
    }
}

const fn unit(name: &'static str, divisor: u16, display_unit: &'static str) -> UnitDefinition {
    UnitDefinition {
        name,
        divisor,
        display_unit,
    }
}

static UNITS: [UnitDefinition; 26] = [
    unit("Dimensionslos", 1, ""),
    unit("Dimensionslos_(,1)", 10, ""),
    unit("Dimensionslos_(,01)", 100, ""),
    unit("Dimensionslos_(,5)", 2, ""),
    unit("Temperatur_(°C)", 10, "°C"),
    unit("Temperatur_(K)", 10, "K"),
    unit("Druck_(bar)", 100, "bar"),
    unit("Druck_(mbar)", 1, "mbar"),
    unit("Druck_(Pa)", 1, "Pa"),
    unit("Durchfluss_(l/h)", 1, "l/h"),
    unit("Durchfluss_(l/min)", 10, "l/min"),
    unit("Durchfluss_(l/d)", 1, "l/d"),
    unit("Durchfluss_(m³/h)", 10, "m³/h"),
    unit("Durchfluss_(m³/min)", 1000, "m³/min"),
    unit("Leistung_(kW)", 100, "kW"),
    unit("Leistung_(W)", 10, "W"),
    unit("Spannung_(V)", 100, "V"),
    unit("Stromstärke_(mA)", 10, "mA"),
    unit("Stromstärke_(A)", 10, "A"),
    unit("Widerstand_(kΩ)", 100, "kΩ"),
    unit("Widerstand_(Ω)", 10, "Ω"),
    unit("Geschwindigkeit_(km/h)", 1, "km/h"),
    unit("Geschwindigkeit_(m/s)", 10, "m/s"),
    unit("Grad_(°)", 10, "°"),
    unit("Feuchte_(%)", 10, "%"),
    unit("Strahlung_(W/m²)", 1, "W/m²"),
];

/// Look up a unit by its exact name.
pub fn lookup(name: &str) -> Option<&'static UnitDefinition> {
    UNITS.iter().find(|unit| unit.name == name)
}

/// Look up a unit, failing with [`CodecError::UnitError`] if it is not known.
pub fn resolve(name: &str) -> Result<&'static UnitDefinition> {
    lookup(name).ok_or_else(|| CodecError::UnitError(name.to_string()))
}

/// All known units, in table order
pub fn all() -> &'static [UnitDefinition] {
    &UNITS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_temperature() {
        let unit = lookup("Temperatur_(°C)").unwrap();
        assert_eq!(unit.divisor, 10);
        assert_eq!(unit.scale_factor(), 0.1);
        assert_eq!(unit.display_unit, "°C");
    }

    #[test]
    fn test_unknown_unit() {
        assert!(lookup("Temperature").is_none());
        assert!(matches!(resolve("furlong"), Err(CodecError::UnitError(_))));
    }

    #[test]
    fn test_table_invariants() {
        let mut names = HashSet::new();
        for unit in all() {
            assert!(unit.divisor > 0, "{} has a zero divisor", unit.name);
            assert!(names.insert(unit.name), "{} is listed twice", unit.name);
        }
        assert_eq!(names.len(), 26);
    }
}
