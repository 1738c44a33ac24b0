//! Formation energies of point defects and surfaces from total energies of supercells.
//!
//! All energies share one unit, which is also the unit of the result (per area for
//! surfaces).
use crate::error::{Error, Result};

fn check_atoms(atoms: usize) -> Result<f64> {
    if atoms == 0 {
        return Err(Error::NonPositive {
            quantity: "atom count",
            value: 0.0,
        });
    }
    Ok(atoms as f64)
}

/// E_defect - (N - 1) / N E_bulk, for a bulk cell of `bulk_atoms` atoms with one removed.
pub fn vacancy_formation_energy(defect: f64, bulk: f64, bulk_atoms: usize) -> Result<f64> {
    let n = check_atoms(bulk_atoms)?;
    Ok(defect - (n - 1.0) / n * bulk)
}

/// E_defect - (N + 1) / N E_bulk, for a bulk cell of `bulk_atoms` atoms with one added.
pub fn interstitial_formation_energy(defect: f64, bulk: f64, bulk_atoms: usize) -> Result<f64> {
    let n = check_atoms(bulk_atoms)?;
    Ok(defect - (n + 1.0) / n * bulk)
}

/// (E_slab - N e_bulk) / 2A: a slab has two surfaces of area A.
pub fn surface_energy(
    slab: f64,
    slab_atoms: usize,
    bulk_per_atom: f64,
    area: f64,
) -> Result<f64> {
    let n = check_atoms(slab_atoms)?;
    if !(area > 0.0) {
        return Err(Error::NonPositive {
            quantity: "surface area",
            value: area,
        });
    }
    Ok((slab - n * bulk_per_atom) / (2.0 * area))
}
