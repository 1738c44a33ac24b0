use std::sync::Arc;

use nalgebra::{DMatrix, DVector, Vector4};

use crate::error::{Error, Result};

use super::model::{EosCurve, EosModel, EosParameters, ModelCurve};

/// Anything that can fit an equation of state to energy-volume data.
///
/// Volumes and energies are handed over in Angstrom^3 and eV; the returned curve is expected
/// to use the same units.
pub trait EosFitter {
    fn fit(
        &self,
        volumes: &[f64],
        energies: &[f64],
        model: EosModel,
        max_iterations: usize,
    ) -> Result<Arc<dyn EosCurve>>;
}

impl<F> EosFitter for F
where
    F: Fn(&[f64], &[f64], EosModel, usize) -> Result<Arc<dyn EosCurve>>,
{
    fn fit(
        &self,
        volumes: &[f64],
        energies: &[f64],
        model: EosModel,
        max_iterations: usize,
    ) -> Result<Arc<dyn EosCurve>> {
        self(volumes, energies, model, max_iterations)
    }
}

/// Damped least squares fit of the analytic models, started from a parabola through the data.
#[derive(Copy, Clone, Debug)]
pub struct LevenbergMarquardt {
    /// relative change in the residual (or the parameters) below which the fit is converged
    pub tolerance: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self { tolerance: 1e-12 }
    }
}

const MAX_DAMPING: f64 = 1e16;

impl EosFitter for LevenbergMarquardt {
    fn fit(
        &self,
        volumes: &[f64],
        energies: &[f64],
        model: EosModel,
        max_iterations: usize,
    ) -> Result<Arc<dyn EosCurve>> {
        let fail = |reason: &str| Error::FitError {
            max_iterations,
            reason: reason.to_owned(),
        };

        if volumes.len() != energies.len() {
            return Err(fail("volumes and energies differ in length"));
        }

        let guess = parabola_guess(volumes, energies).ok_or_else(|| {
            fail("the energies do not curve upwards, there is no minimum to fit")
        })?;
        log::trace!("initial guess for {model}: {guess:?}");

        let residuals = |parameters: &EosParameters| -> Option<DVector<f64>> {
            let residuals = DVector::from_iterator(
                volumes.len(),
                volumes
                    .iter()
                    .zip(energies)
                    .map(|(&volume, &energy)| model.energy(parameters, volume) - energy),
            );
            residuals.iter().all(|r| r.is_finite()).then_some(residuals)
        };
        let evaluate = |vector: &Vector4<f64>| -> Option<(EosParameters, DVector<f64>)> {
            let parameters = to_parameters(vector)?;
            Some((parameters, residuals(&parameters)?))
        };

        let mut best = guess;
        let mut current = residuals(&best).ok_or_else(|| fail("invalid initial guess"))?;
        let mut cost = current.norm_squared();
        let scale = energies.iter().map(|e| e * e).sum::<f64>();
        let mut damping = 1e-3;

        for iteration in 0..max_iterations {
            if cost <= f64::EPSILON.powi(2) * scale {
                return Ok(finish(model, best, iteration));
            }

            let parameters = from_parameters(&best);
            let jacobian = jacobian(&parameters, |vector| Some(evaluate(vector)?.1))
                .ok_or_else(|| fail("the residuals are not finite around the current parameters"))?;
            let normal = jacobian.transpose() * &jacobian;
            let gradient = jacobian.transpose() * &current;

            let mut damped = normal.clone();
            for k in 0..4 {
                damped[(k, k)] += damping * normal[(k, k)].max(f64::MIN_POSITIVE);
            }

            let step = damped
                .cholesky()
                .map(|cholesky| cholesky.solve(&-gradient))
                .ok_or_else(|| fail("singular normal equations"))?;
            let step = Vector4::from_column_slice(step.as_slice());

            match evaluate(&(parameters + step)) {
                Some((trial, trial_residuals)) if trial_residuals.norm_squared() < cost => {
                    let trial_cost = trial_residuals.norm_squared();
                    let converged = cost - trial_cost <= self.tolerance * cost
                        || step.norm() <= self.tolerance * parameters.norm();

                    log::trace!(
                        "iteration {iteration:<4} - cost {trial_cost:1.4e}, damping {damping:1.1e}"
                    );

                    best = trial;
                    current = trial_residuals;
                    cost = trial_cost;
                    damping = (damping / 10.0).max(1e-12);

                    if converged {
                        return Ok(finish(model, best, iteration));
                    }
                }
                // no downhill step left: the parameters sit at the minimum to machine precision
                _ if damping >= MAX_DAMPING => return Ok(finish(model, best, iteration)),
                _ => damping *= 10.0,
            }
        }

        Err(fail("did not converge"))
    }
}

fn finish(model: EosModel, parameters: EosParameters, iterations: usize) -> Arc<dyn EosCurve> {
    log::debug!("{model} fit converged after {iterations} iterations: {parameters:?}");
    Arc::new(ModelCurve { model, parameters })
}

fn to_parameters(vector: &Vector4<f64>) -> Option<EosParameters> {
    let parameters = EosParameters {
        e0: vector[0],
        v0: vector[1],
        b0: vector[2],
        b0_prime: vector[3],
    };

    let valid = vector.iter().all(|x| x.is_finite())
        && parameters.v0 > 0.0
        && parameters.b0 > 0.0
        && (parameters.b0_prime - 1.0).abs() > 1e-8;
    valid.then_some(parameters)
}

fn from_parameters(parameters: &EosParameters) -> Vector4<f64> {
    Vector4::new(
        parameters.e0,
        parameters.v0,
        parameters.b0,
        parameters.b0_prime,
    )
}

/// Central difference jacobian of the residuals
fn jacobian(
    parameters: &Vector4<f64>,
    residuals: impl Fn(&Vector4<f64>) -> Option<DVector<f64>>,
) -> Option<DMatrix<f64>> {
    let columns = (0..4)
        .map(|k| {
            let h = 1e-6 * parameters[k].abs().max(1e-3);
            let mut forward = *parameters;
            let mut backward = *parameters;
            forward[k] += h;
            backward[k] -= h;
            Some((residuals(&forward)? - residuals(&backward)?) / (2.0 * h))
        })
        .collect::<Option<Vec<_>>>()?;

    Some(DMatrix::from_columns(&columns))
}

/// Least squares parabola E = aV^2 + bV + c, turned into a starting point for the models.
fn parabola_guess(volumes: &[f64], energies: &[f64]) -> Option<EosParameters> {
    let n = volumes.len();
    if n < 3 {
        return None;
    }

    // center the volumes to keep the normal equations well conditioned
    let mean = volumes.iter().sum::<f64>() / n as f64;
    let design = DMatrix::from_fn(n, 3, |i, j| (volumes[i] - mean).powi(j as i32));
    let rhs = DVector::from_column_slice(energies);

    let coefficients = design.svd(true, true).solve(&rhs, 1e-14).ok()?;
    let (c, b, a) = (coefficients[0], coefficients[1], coefficients[2]);

    if !(a > 0.0) {
        return None;
    }

    let shift = -b / (2.0 * a);
    let v0 = mean + shift;
    if !(v0 > 0.0) {
        return None;
    }

    Some(EosParameters {
        e0: c + b * shift + a * shift * shift,
        v0,
        b0: 2.0 * a * v0,
        b0_prime: 4.0,
    })
}
