use serde::Deserialize;

use crate::{
    eos::EosModel,
    parse::{CodeFamily, EnergySelector},
};

/// How to turn a list of output files into an equation of state fit.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EosFitConfig {
    /// The equation of state to fit
    pub model: EosModel,
    /// The maximum number of iterations the fitter may take before the fit is
    /// considered to not converge
    pub max_iterations: usize,
    /// Which energy of each parsed file to use
    pub energy_selector: EnergySelector,
    /// Overrides the code family inferred from the first file's suffix
    pub code_family: Option<CodeFamily>,
}

impl Default for EosFitConfig {
    fn default() -> Self {
        Self {
            model: EosModel::Murnaghan,
            max_iterations: 10_000,
            energy_selector: EnergySelector::Any,
            code_family: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EosFitConfig;
    use crate::{
        eos::EosModel,
        parse::{CodeFamily, EnergySelector},
    };

    #[test]
    fn missing_fields_take_defaults() {
        let config: EosFitConfig = serde_json::from_str(r#"{"model": "birch"}"#).unwrap();

        assert_eq!(config.model, EosModel::BirchMurnaghan);
        assert_eq!(config.max_iterations, 10_000);
        assert_eq!(config.energy_selector, EnergySelector::Any);
        assert_eq!(config.code_family, None);
    }

    #[test]
    fn explicit_fields_are_read() {
        let config: EosFitConfig = serde_json::from_str(
            r#"{
                "max_iterations": 50,
                "energy_selector": "electronicCohesiveE",
                "code_family": "castep"
            }"#,
        )
        .unwrap();

        assert_eq!(config.model, EosModel::Murnaghan);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(
            config.energy_selector,
            EnergySelector::Field("electronicCohesiveE".to_owned())
        );
        assert_eq!(config.code_family, Some(CodeFamily::Castep));
    }
}
