//! Placing an interstitial atom into a hexagonal close-packed cell.
use std::{fmt, str::FromStr};

use itertools::{iproduct, Itertools};
use nalgebra::Vector3;

use crate::{
    cell::Cell,
    error::{Error, Result},
};

/// (alpha, beta, gamma) of a hexagonal cell, in degrees
const HEXAGONAL_ANGLES: [f64; 3] = [90.0, 90.0, 120.0];
const ANGLE_TOLERANCE: f64 = 1e-3;

/// Atoms closer than this to the centring atom's plane are not out of plane
const OUT_OF_PLANE: f64 = 1e-2;
/// Neighbours this close in distance count as equally near
const TIE_TOLERANCE: f64 = 1e-8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InterstitialSite {
    Tetrahedral,
    BasalTetrahedral,
}

impl InterstitialSite {
    /// Height of the site above the centring atom, for a nearest out of plane neighbour at
    /// distance `d` whose bond makes an angle with cosine `cos_theta` with the c axis.
    fn height(self, d: f64, cos_theta: f64) -> f64 {
        match self {
            Self::Tetrahedral => 0.5 * d / cos_theta,
            Self::BasalTetrahedral => d * cos_theta,
        }
    }
}

impl FromStr for InterstitialSite {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tetrahedral" => Ok(Self::Tetrahedral),
            "basal_tetrahedral" => Ok(Self::BasalTetrahedral),
            _ => Err(Error::UnknownSite(s.to_owned())),
        }
    }
}

impl fmt::Display for InterstitialSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tetrahedral => "tetrahedral",
            Self::BasalTetrahedral => "basal_tetrahedral",
        })
    }
}

/// Which atom the interstitial is placed relative to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CentringStrategy {
    /// The atom of the 3x3x3 supercell nearest to a + b + c
    #[default]
    Centre,
    /// Always the first atom of the cell
    FirstAtom,
}

/// Add an atom at an interstitial `site` of the hexagonal cell and return its cartesian
/// position. The element defaults to that of the cell's first atom.
///
/// The site is found from the nearest neighbour of the centring atom that lies out of its
/// basal plane, searching a 3x3x3 supercell. Heights are measured along c, which is z for
/// cells built with [`Cell::from_parameters`].
pub fn add_interstitial_hcp(
    cell: &mut Cell,
    site: InterstitialSite,
    element: Option<&str>,
    strategy: CentringStrategy,
) -> Result<Vector3<f64>> {
    let angles = cell.lattice_angles();
    if angles
        .iter()
        .zip(HEXAGONAL_ANGLES)
        .any(|(angle, expected)| (angle - expected).abs() > ANGLE_TOLERANCE)
    {
        return Err(Error::WrongLattice { angles });
    }

    let element = match (element, cell.sites().first()) {
        (Some(element), _) => element.to_owned(),
        (None, Some(first)) => first.element().to_owned(),
        (None, None) => return Err(Error::InvalidCell("the cell has no sites".to_owned())),
    };

    let [a, b, c] = *cell.lattice_vectors();
    let c_axis = c.normalize();

    // (index of the site in the cell, position in the supercell); the unshifted copy first
    let supercell = iproduct!(0..3, 0..3, 0..3)
        .flat_map(|(i, j, k)| {
            let shift = Vector3::new(i as f64, j as f64, k as f64);
            cell.sites()
                .iter()
                .enumerate()
                .map(move |(index, site)| (index, site.fractional() + shift))
        })
        .map(|(index, fractional)| (index, cell.to_cartesian(&fractional)))
        .collect::<Vec<_>>();

    let centring = match strategy {
        CentringStrategy::FirstAtom => 0,
        CentringStrategy::Centre => {
            let target = a + b + c;
            supercell
                .iter()
                .position_min_by(|(_, p), (_, q)| (p - target).norm().total_cmp(&(q - target).norm()))
                .unwrap_or(0)
        }
    };
    let (centring_site, centre) = supercell[centring];

    let out_of_plane = supercell
        .iter()
        .map(|(_, position)| position - centre)
        .filter(|bond| bond.dot(&c_axis).abs() > OUT_OF_PLANE)
        .collect::<Vec<_>>();

    let nearest = out_of_plane
        .iter()
        .map(|bond| bond.norm())
        .min_by(f64::total_cmp)
        .ok_or_else(|| Error::InvalidCell("no atom lies out of the basal plane".to_owned()))?;

    // of equally near neighbours, take the one highest along c
    let bond = out_of_plane
        .iter()
        .filter(|bond| bond.norm() <= nearest + TIE_TOLERANCE)
        .max_by(|u, v| u.dot(&c_axis).total_cmp(&v.dot(&c_axis)))
        .ok_or_else(|| Error::InvalidCell("no atom lies out of the basal plane".to_owned()))?;

    let cos_theta = bond.dot(&c_axis) / nearest;
    let height = site.height(nearest, cos_theta);

    let origin = cell.to_cartesian(cell.sites()[centring_site].fractional());
    let position = origin + c_axis * height;

    log::debug!(
        "{site} interstitial {element} next to site {centring_site}: d = {nearest:.6}, \
         cos theta = {cos_theta:.6}, height {height:.6}"
    );

    cell.push_cartesian(&element, &position)?;
    Ok(position)
}
