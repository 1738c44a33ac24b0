//! Hartree potential of a spherically symmetric density on a logarithmic radial grid.
//!
//! The grid is r_i = r_0 exp(nu i), so derivatives along the index turn into radial
//! derivatives by dividing by dr/di = nu r_i. The potential is returned in Rydberg.
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// The five point stencils need this many points
pub const MIN_GRID_POINTS: usize = 5;

/// Hartree potential V_H(r) for the density rho(r), given as (r, rho) pairs with r strictly
/// increasing. `mesh_parameter` is the nu of the logarithmic grid.
pub fn radial_hartree(density: &[(f64, f64)], mesh_parameter: f64) -> Result<Vec<(f64, f64)>> {
    let n = density.len();
    if n < MIN_GRID_POINTS {
        return Err(Error::GridTooSmall {
            required: MIN_GRID_POINTS,
            found: n,
        });
    }

    if let Some(&(r, _)) = density.iter().find(|(r, _)| !(*r > 0.0)) {
        return Err(Error::NonPositive {
            quantity: "radial grid point",
            value: r,
        });
    }

    if let Some(pair) = density.windows(2).find(|pair| !(pair[1].0 > pair[0].0)) {
        return Err(Error::NonPositive {
            quantity: "radial grid spacing",
            value: pair[1].0 - pair[0].0,
        });
    }

    let radii = density.iter().map(|&(r, _)| r).collect::<Vec<_>>();

    // w = 4 pi r rho, W = 4 pi r^2 rho
    let w = density
        .iter()
        .map(|&(r, rho)| 4.0 * PI * r * rho)
        .collect::<Vec<_>>();
    let big_w = density
        .iter()
        .map(|&(r, rho)| 4.0 * PI * r * r * rho)
        .collect::<Vec<_>>();

    let radial_derivative = |values: &[f64]| {
        index_derivative(values)
            .into_iter()
            .zip(&radii)
            .map(|(derivative, r)| derivative / (r * mesh_parameter))
            .collect::<Vec<_>>()
    };

    let dw = radial_derivative(&w);
    let dbig_w = radial_derivative(&big_w);

    // enclosed charge Q(r) and the running integral of w
    let charge = hermite_cumulative(&radii, &big_w, &dbig_w);
    let outer = hermite_cumulative(&radii, &w, &dw);
    let outer_total = outer[n - 1];

    log::debug!("hartree potential for a total charge of {:.6}", charge[n - 1]);

    Ok(radii
        .iter()
        .zip(charge.iter().zip(&outer))
        .map(|(&r, (&q, &q_tilde))| (r, 2.0 * (outer_total - q_tilde + q / r)))
        .collect())
}

/// Derivative with respect to the grid index from five point stencils: one sided at the two
/// points on each edge, central everywhere else. Needs at least five values.
fn index_derivative(y: &[f64]) -> Vec<f64> {
    let n = y.len();

    (0..n)
        .map(|i| match i {
            0 => (-25.0 * y[0] + 48.0 * y[1] - 36.0 * y[2] + 16.0 * y[3] - 3.0 * y[4]) / 12.0,
            1 => (-3.0 * y[0] - 10.0 * y[1] + 18.0 * y[2] - 6.0 * y[3] + y[4]) / 12.0,
            i if i == n - 2 => {
                (3.0 * y[n - 1] + 10.0 * y[n - 2] - 18.0 * y[n - 3] + 6.0 * y[n - 4] - y[n - 5])
                    / 12.0
            }
            i if i == n - 1 => {
                (25.0 * y[n - 1] - 48.0 * y[n - 2] + 36.0 * y[n - 3] - 16.0 * y[n - 4]
                    + 3.0 * y[n - 5])
                    / 12.0
            }
            i => (y[i - 2] - 8.0 * y[i - 1] + 8.0 * y[i + 1] - y[i + 2]) / 12.0,
        })
        .collect()
}

/// Running integral of y from the first grid point, using the cubic Hermite rule on each
/// interval.
fn hermite_cumulative(r: &[f64], y: &[f64], dy: &[f64]) -> Vec<f64> {
    let mut integral = Vec::with_capacity(r.len());
    let mut sum = 0.0;
    integral.push(sum);

    for i in 0..r.len() - 1 {
        let delta = r[i + 1] - r[i];
        sum += delta * (6.0 * (y[i] + y[i + 1]) + delta * (dy[i] - dy[i + 1])) / 12.0;
        integral.push(sum);
    }

    integral
}
