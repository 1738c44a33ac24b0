use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    config::ConfigCell,
    error::{Error, Result},
};

/// A single atom of a crystal cell, in fractional coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    pub(crate) fractional: Vector3<f64>,
    pub(crate) element: String,
}

impl Site {
    pub fn new(element: impl Into<String>, fractional: [f64; 3]) -> Self {
        Self {
            fractional: Vector3::from(fractional),
            element: element.into(),
        }
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn fractional(&self) -> &Vector3<f64> {
        &self.fractional
    }
}

/// A periodic crystal cell: three lattice vectors and a list of sites.
///
/// Lengths are in whatever unit the cell was built with; nothing in here converts them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigCell", into = "ConfigCell")]
pub struct Cell {
    /// The lattice vectors a, b and c
    pub(crate) lattice: [Vector3<f64>; 3],
    pub(crate) sites: Vec<Site>,
}

impl Cell {
    /// Create a cell from its lattice vectors and fractional sites.
    pub fn from_lattice_vectors(lattice: [Vector3<f64>; 3], sites: Vec<Site>) -> Result<Self> {
        let volume = triple_product(&lattice).abs();
        if !(volume > f64::EPSILON) {
            return Err(Error::InvalidCell(format!(
                "lattice vectors span a volume of {volume}"
            )));
        }

        if let Some(index) = sites.iter().position(|site| site.element.is_empty()) {
            return Err(Error::InvalidCell(format!(
                "site {index} has an empty element label"
            )));
        }

        Ok(Self { lattice, sites })
    }

    /// Create a cell from lattice parameters (a, b, c) and angles (alpha, beta, gamma) in degrees.
    ///
    /// `a` lies along x and `b` in the xy-plane.
    pub fn from_parameters(lengths: [f64; 3], angles: [f64; 3], sites: Vec<Site>) -> Result<Self> {
        let [a, b, c] = lengths;
        let [alpha, beta, gamma] = angles.map(f64::to_radians);

        let (sin_gamma, cos_gamma) = gamma.sin_cos();
        let cx = c * beta.cos();
        let cy = c * (alpha.cos() - beta.cos() * cos_gamma) / sin_gamma;
        let cz_squared = c * c - cx * cx - cy * cy;
        if !(cz_squared > 0.0) {
            return Err(Error::InvalidCell(format!(
                "angles {angles:?} do not describe a three dimensional cell"
            )));
        }

        let lattice = [
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(b * cos_gamma, b * sin_gamma, 0.0),
            Vector3::new(cx, cy, cz_squared.sqrt()),
        ];

        Self::from_lattice_vectors(lattice, sites)
    }

    pub fn lattice_vectors(&self) -> &[Vector3<f64>; 3] {
        &self.lattice
    }

    /// The lengths of the lattice vectors, (a, b, c)
    pub fn lattice_parameters(&self) -> [f64; 3] {
        self.lattice.map(|vector| vector.norm())
    }

    /// The lattice angles (alpha, beta, gamma) in degrees
    pub fn lattice_angles(&self) -> [f64; 3] {
        let [a, b, c] = &self.lattice;
        [b.angle(c), a.angle(c), a.angle(b)].map(f64::to_degrees)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn n_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn fractional_coordinates(&self) -> Vec<Vector3<f64>> {
        self.sites.iter().map(|site| site.fractional).collect()
    }

    pub fn cartesian_coordinates(&self) -> Vec<Vector3<f64>> {
        self.sites
            .iter()
            .map(|site| self.to_cartesian(&site.fractional))
            .collect()
    }

    pub fn element_list(&self) -> Vec<&str> {
        self.sites.iter().map(|site| site.element.as_str()).collect()
    }

    /// |a . (b x c)|
    pub fn volume(&self) -> f64 {
        triple_product(&self.lattice).abs()
    }

    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        let [a, b, c] = &self.lattice;
        fractional.x * a + fractional.y * b + fractional.z * c
    }

    pub fn to_fractional(&self, cartesian: &Vector3<f64>) -> Result<Vector3<f64>> {
        let inverse = Matrix3::from_columns(&self.lattice)
            .try_inverse()
            .ok_or_else(|| Error::InvalidCell("singular lattice".to_owned()))?;
        Ok(inverse * cartesian)
    }

    /// Append a site given in cartesian coordinates.
    pub fn push_cartesian(&mut self, element: &str, cartesian: &Vector3<f64>) -> Result<()> {
        if element.is_empty() {
            return Err(Error::InvalidCell("empty element label".to_owned()));
        }

        let fractional = self.to_fractional(cartesian)?;
        self.sites.push(Site {
            fractional,
            element: element.to_owned(),
        });
        Ok(())
    }
}

fn triple_product([a, b, c]: &[Vector3<f64>; 3]) -> f64 {
    a.dot(&b.cross(c))
}
