//! Equation of state fits of parsed calculation outputs.
mod fitter;
mod model;
pub mod organizer;

use std::{path::Path, sync::Arc};

pub use fitter::{EosFitter, LevenbergMarquardt};
pub use model::{EosCurve, EosModel, EosParameters, ModelCurve};

use crate::{
    config::EosFitConfig,
    error::{Error, Result},
    parse::{parse_volumes_and_energies, ParserTable, VolumesAndEnergies},
    units::{bulk_modulus_factor, EnergyUnit, LengthUnit, ANGSTROM3_TO_BOHR3},
};

/// The smallest number of (V, E) points a fit is attempted with
pub const MIN_POINTS: usize = 5;

/// Number of volumes the fitted curve is sampled at
const FIT_SAMPLES: usize = 100;

/// The result of fitting an equation of state.
#[derive(Clone, Debug)]
pub struct EosFit {
    /// Equilibrium volume per atom, in cubic Bohr
    pub v0: f64,
    /// Equilibrium energy per atom, in eV
    pub e0: f64,
    /// Bulk modulus, in GPa
    pub b0: f64,
    /// The (V, E) points the fit was made to, sorted by volume
    pub data: Vec<(f64, f64)>,
    /// The fitted curve sampled over the same volume range, sorted by volume
    pub fit_data: Vec<(f64, f64)>,
    /// The fitted curve, in Angstrom^3 and eV
    pub curve: Arc<dyn EosCurve>,
}

impl EosFit {
    /// Energy per atom (eV) of the fitted curve at a volume per atom in cubic Bohr.
    pub fn energy_at(&self, volume: f64) -> f64 {
        self.curve.energy(volume / ANGSTROM3_TO_BOHR3)
    }
}

/// Parse the output files and fit an equation of state to their per-atom volumes and energies.
pub fn fit_eos<P: AsRef<Path>>(
    parsers: &ParserTable,
    fitter: &impl EosFitter,
    paths: &[P],
    config: &EosFitConfig,
) -> Result<EosFit> {
    let data = parse_volumes_and_energies(
        parsers,
        paths,
        config.code_family,
        &config.energy_selector,
    )?;
    fit_volumes_and_energies(fitter, &data, config)
}

/// Fit an equation of state to per-atom volumes (cubic Bohr) and energies (eV).
pub fn fit_volumes_and_energies(
    fitter: &impl EosFitter,
    data: &VolumesAndEnergies,
    config: &EosFitConfig,
) -> Result<EosFit> {
    let VolumesAndEnergies { volumes, energies } = data;
    let max_iterations = config.max_iterations;

    let found = volumes.len().min(energies.len());
    if found < MIN_POINTS {
        return Err(Error::InsufficientPoints {
            required: MIN_POINTS,
            found,
        });
    }

    // the fitter works in Angstrom^3 and eV
    let volumes_angstrom = volumes
        .iter()
        .map(|volume| volume / ANGSTROM3_TO_BOHR3)
        .collect::<Vec<_>>();

    let curve = fitter
        .fit(&volumes_angstrom, energies, config.model, max_iterations)
        .map_err(|err| match err {
            err @ Error::FitError { .. } => err,
            other => Error::FitError {
                max_iterations,
                reason: other.to_string(),
            },
        })?;

    let parameters = curve.parameters();
    let b0 = parameters.b0 * bulk_modulus_factor(EnergyUnit::ElectronVolt, LengthUnit::Angstrom);
    let v0 = parameters.v0 * ANGSTROM3_TO_BOHR3;

    let mut data = volumes
        .iter()
        .copied()
        .zip(energies.iter().copied())
        .collect::<Vec<_>>();
    data.sort_by(|(a, _), (b, _)| a.total_cmp(b));

    let min_volume = data[0].0 / ANGSTROM3_TO_BOHR3;
    let max_volume = data[data.len() - 1].0 / ANGSTROM3_TO_BOHR3;
    let step = (max_volume - min_volume) / (FIT_SAMPLES - 1) as f64;
    let fit_data = (0..FIT_SAMPLES)
        .map(|i| {
            let volume = min_volume + step * i as f64;
            (volume * ANGSTROM3_TO_BOHR3, curve.energy(volume))
        })
        .collect();

    log::debug!(
        "{} fit: v0 {v0:.4} bohr^3, e0 {:.6} eV, b0 {b0:.2} GPa",
        config.model,
        parameters.e0
    );

    Ok(EosFit {
        v0,
        e0: parameters.e0,
        b0,
        data,
        fit_data,
        curve,
    })
}

/// Fit several independent sets of output files. With the `rayon` feature the fits run in
/// parallel; results come back in input order either way.
pub fn fit_eos_many<P, F>(
    parsers: &ParserTable,
    fitter: &F,
    path_sets: &[Vec<P>],
    config: &EosFitConfig,
) -> Vec<Result<EosFit>>
where
    P: AsRef<Path> + Sync,
    F: EosFitter + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        path_sets
            .par_iter()
            .map(|paths| fit_eos(parsers, fitter, paths, config))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    path_sets
        .iter()
        .map(|paths| fit_eos(parsers, fitter, paths, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;

    use super::*;

    fn murnaghan_data(n: usize) -> VolumesAndEnergies {
        let exact = EosParameters {
            e0: -5.0,
            v0: 16.0,
            b0: 0.4,
            b0_prime: 4.0,
        };
        // descending, so the fit has to sort them
        let volumes_angstrom = (0..n).rev().map(|i| 14.0 + 0.5 * i as f64).collect::<Vec<_>>();

        VolumesAndEnergies {
            energies: volumes_angstrom
                .iter()
                .map(|&v| EosModel::Murnaghan.energy(&exact, v))
                .collect(),
            volumes: volumes_angstrom
                .iter()
                .map(|v| v * ANGSTROM3_TO_BOHR3)
                .collect(),
        }
    }

    #[test]
    fn too_few_points() {
        let result = fit_volumes_and_energies(
            &LevenbergMarquardt::default(),
            &murnaghan_data(4),
            &EosFitConfig::default(),
        );
        assert!(matches!(
            result,
            Err(Error::InsufficientPoints {
                required: 5,
                found: 4
            })
        ));
    }

    #[test]
    fn fitter_output_is_converted_and_sorted() {
        let fitter = |volumes: &[f64], _: &[f64], model: EosModel, _: usize| -> Result<Arc<dyn EosCurve>> {
            let fitted: Arc<dyn EosCurve> = Arc::new(ModelCurve {
                model,
                parameters: EosParameters {
                    e0: -5.0,
                    v0: volumes.iter().sum::<f64>() / volumes.len() as f64,
                    b0: 1.0,
                    b0_prime: 4.0,
                },
            });
            Ok(fitted)
        };

        let fit = fit_volumes_and_energies(&fitter, &murnaghan_data(9), &EosFitConfig::default())
            .unwrap();

        assert_relative_eq!(fit.b0, 160.21698, epsilon = 1e-3);
        assert_relative_eq!(fit.v0, 16.0 * ANGSTROM3_TO_BOHR3, max_relative = 1e-12);
        assert!(fit.data.windows(2).all(|pair| pair[0].0 <= pair[1].0));
        assert!(fit.fit_data.windows(2).all(|pair| pair[0].0 <= pair[1].0));
        assert_eq!(fit.fit_data.len(), 100);
        assert_relative_eq!(fit.fit_data[0].0, fit.data[0].0, max_relative = 1e-12);
        assert_relative_eq!(fit.fit_data[99].0, fit.data[8].0, max_relative = 1e-12);
    }

    #[test]
    fn fitter_errors_become_fit_errors() {
        let fitter = |_: &[f64], _: &[f64], _: EosModel, _: usize| -> Result<Arc<dyn EosCurve>> {
            Err(Error::UnknownModel("spline".to_owned()))
        };
        let config = EosFitConfig {
            max_iterations: 7,
            ..Default::default()
        };

        let result = fit_volumes_and_energies(&fitter, &murnaghan_data(6), &config);
        assert!(matches!(result, Err(Error::FitError { max_iterations: 7, .. })));
    }

    #[test]
    fn default_fitter_recovers_the_minimum() {
        let fit = fit_volumes_and_energies(
            &LevenbergMarquardt::default(),
            &murnaghan_data(9),
            &EosFitConfig::default(),
        )
        .unwrap();

        assert_relative_eq!(fit.e0, -5.0, max_relative = 1e-8);
        assert_relative_eq!(fit.v0, 16.0 * ANGSTROM3_TO_BOHR3, max_relative = 1e-6);
        assert_relative_eq!(fit.b0, 0.4 * 160.21698, max_relative = 1e-4);

        let (min, max) = (fit.data[0].0, fit.data[fit.data.len() - 1].0);
        assert!(min <= fit.v0 && fit.v0 <= max);
        assert_relative_eq!(fit.energy_at(fit.v0), fit.e0, epsilon = 1e-9);
    }
}
