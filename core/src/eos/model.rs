use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::error::{Error, Result};

/// The analytic energy-volume relations a fit can use.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum EosModel {
    Murnaghan,
    /// Third order Birch-Murnaghan
    BirchMurnaghan,
    Vinet,
}

impl EosModel {
    /// E(V) for the given parameters.
    pub fn energy(self, parameters: &EosParameters, volume: f64) -> f64 {
        let &EosParameters {
            e0,
            v0,
            b0,
            b0_prime: bp,
        } = parameters;

        match self {
            Self::Murnaghan => {
                e0 + b0 * volume / bp * ((v0 / volume).powf(bp) / (bp - 1.0) + 1.0)
                    - v0 * b0 / (bp - 1.0)
            }
            Self::BirchMurnaghan => {
                let eta = (v0 / volume).powf(2.0 / 3.0) - 1.0;
                e0 + 9.0 * v0 * b0 / 16.0 * (eta.powi(3) * bp + eta.powi(2) * (6.0 - 4.0 * (eta + 1.0)))
            }
            Self::Vinet => {
                let x = (volume / v0).cbrt();
                let eta = 1.5 * (bp - 1.0);
                e0 + 2.0 * b0 * v0 / (bp - 1.0).powi(2)
                    * (2.0 - (5.0 + 3.0 * bp * (x - 1.0) - 3.0 * x) * (-eta * (x - 1.0)).exp())
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Murnaghan => "murnaghan",
            Self::BirchMurnaghan => "birch",
            Self::Vinet => "vinet",
        }
    }
}

impl FromStr for EosModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "murnaghan" => Ok(Self::Murnaghan),
            "birch" | "birchmurnaghan" | "birch-murnaghan" | "birch_murnaghan" => {
                Ok(Self::BirchMurnaghan)
            }
            "vinet" => Ok(Self::Vinet),
            _ => Err(Error::UnknownModel(s.to_owned())),
        }
    }
}

impl TryFrom<String> for EosModel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for EosModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of an equation of state, in the units of the data it was fitted to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EosParameters {
    pub e0: f64,
    pub v0: f64,
    /// Bulk modulus
    pub b0: f64,
    /// Pressure derivative of the bulk modulus
    pub b0_prime: f64,
}

/// A fitted energy-volume curve.
pub trait EosCurve: fmt::Debug + Send + Sync {
    fn parameters(&self) -> EosParameters;

    fn energy(&self, volume: f64) -> f64;
}

/// An [`EosCurve`] given by one of the analytic models.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelCurve {
    pub model: EosModel,
    pub parameters: EosParameters,
}

impl EosCurve for ModelCurve {
    fn parameters(&self) -> EosParameters {
        self.parameters
    }

    fn energy(&self, volume: f64) -> f64 {
        self.model.energy(&self.parameters, volume)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{EosModel, EosParameters};

    const PARAMETERS: EosParameters = EosParameters {
        e0: -12.0,
        v0: 22.0,
        b0: 0.7,
        b0_prime: 4.2,
    };

    #[test]
    fn every_model_has_its_minimum_at_v0() {
        for model in [EosModel::Murnaghan, EosModel::BirchMurnaghan, EosModel::Vinet] {
            let at_minimum = model.energy(&PARAMETERS, PARAMETERS.v0);
            assert_relative_eq!(at_minimum, PARAMETERS.e0, epsilon = 1e-12);

            for volume in [18.0, 20.0, 24.0, 26.0] {
                assert!(model.energy(&PARAMETERS, volume) > at_minimum, "{model} at {volume}");
            }
        }
    }

    #[test]
    fn curvature_gives_the_bulk_modulus() {
        // B = V d2E/dV2 at the minimum
        let h = 1e-3;
        for model in [EosModel::Murnaghan, EosModel::BirchMurnaghan, EosModel::Vinet] {
            let v0 = PARAMETERS.v0;
            let second_derivative = (model.energy(&PARAMETERS, v0 + h)
                - 2.0 * model.energy(&PARAMETERS, v0)
                + model.energy(&PARAMETERS, v0 - h))
                / (h * h);
            assert_relative_eq!(v0 * second_derivative, PARAMETERS.b0, max_relative = 1e-5);
        }
    }

    #[test]
    fn model_names_parse() {
        assert_eq!("Murnaghan".parse::<EosModel>().unwrap(), EosModel::Murnaghan);
        assert_eq!("birch-murnaghan".parse::<EosModel>().unwrap(), EosModel::BirchMurnaghan);
        assert!("polynomial".parse::<EosModel>().is_err());
    }
}
