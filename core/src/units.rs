//! Unit conversions between the energy and length units the supported codes report in.
//!
//! The canonical units inside this crate are electron-volts for energy and Bohr for length;
//! bulk moduli are reported in GPa.
use std::str::FromStr;

use crate::error::{Error, Result};

pub const EV_TO_JOULE: f64 = 1.60218e-19;
pub const BOHR_TO_METRE: f64 = 5.29177249e-11;
pub const EV_TO_RYDBERG: f64 = 1.0 / 13.6056980659;
pub const RYDBERG_TO_EV: f64 = 13.6056980659;
pub const HARTREE_TO_EV: f64 = 2.0 * RYDBERG_TO_EV;
pub const ANGSTROM_TO_BOHR: f64 = 1.88973;
pub const BOHR_TO_ANGSTROM: f64 = 1.0 / ANGSTROM_TO_BOHR;
/// Derived from the Bohr constants so that every length conversion agrees with the others.
pub const ANGSTROM_TO_METRE: f64 = ANGSTROM_TO_BOHR * BOHR_TO_METRE;

/// Cubic Angstrom to cubic Bohr
pub const ANGSTROM3_TO_BOHR3: f64 = ANGSTROM_TO_BOHR * ANGSTROM_TO_BOHR * ANGSTROM_TO_BOHR;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EnergyUnit {
    ElectronVolt,
    Rydberg,
}

impl EnergyUnit {
    pub fn to_joule(self) -> f64 {
        match self {
            Self::ElectronVolt => EV_TO_JOULE,
            Self::Rydberg => EV_TO_JOULE / EV_TO_RYDBERG,
        }
    }
}

impl FromStr for EnergyUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eV" | "ev" => Ok(Self::ElectronVolt),
            "Ry" | "ry" | "rydberg" => Ok(Self::Rydberg),
            other => Err(Error::InvalidUnit(other.to_owned())),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Bohr,
    Angstrom,
}

impl LengthUnit {
    pub fn to_metre(self) -> f64 {
        match self {
            Self::Bohr => BOHR_TO_METRE,
            Self::Angstrom => ANGSTROM_TO_METRE,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bohr" | "Bohr" => Ok(Self::Bohr),
            "Å" | "A" | "ang" | "angstrom" => Ok(Self::Angstrom),
            other => Err(Error::InvalidUnit(other.to_owned())),
        }
    }
}

/// Factor converting a bulk modulus in `energy / length^3` into GPa.
pub fn bulk_modulus_factor(energy: EnergyUnit, length: LengthUnit) -> f64 {
    1e-9 * (energy.to_joule() / length.to_metre().powi(3))
}

/// Same as [`bulk_modulus_factor`], with the units given by name.
pub fn bulk_modulus_factor_named(energy: &str, length: &str) -> Result<f64> {
    Ok(bulk_modulus_factor(energy.parse()?, length.parse()?))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn ev_per_cubic_angstrom_in_gpa() {
        let factor = bulk_modulus_factor_named("eV", "Å").unwrap();
        assert!((factor - 160.2176).abs() < 1e-3, "got {factor}");
    }

    #[test]
    fn factors_are_mutually_consistent() {
        let ratio = bulk_modulus_factor(EnergyUnit::ElectronVolt, LengthUnit::Angstrom)
            / bulk_modulus_factor(EnergyUnit::Rydberg, LengthUnit::Bohr);

        assert_relative_eq!(
            ratio,
            EV_TO_RYDBERG / ANGSTROM3_TO_BOHR3,
            max_relative = 1e-12
        );
    }

    #[test]
    fn unknown_units_are_rejected() {
        assert!(matches!(
            bulk_modulus_factor_named("hartree", "bohr"),
            Err(Error::InvalidUnit(unit)) if unit == "hartree"
        ));
        assert!(matches!(
            bulk_modulus_factor_named("eV", "nm"),
            Err(Error::InvalidUnit(_))
        ));
    }
}
