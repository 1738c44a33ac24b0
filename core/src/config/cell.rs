use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    cell::{Cell, Site},
    error::Error,
};

/// Represents a crystal cell in a config file or a stored record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigCell {
    lattice_vectors: [[f64; 3]; 3],
    #[serde(default)]
    sites: Vec<ConfigSite>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ConfigSite {
    element: String,
    fractional: [f64; 3],
}

impl TryFrom<ConfigCell> for Cell {
    type Error = Error;

    fn try_from(value: ConfigCell) -> Result<Self, Self::Error> {
        let ConfigCell {
            lattice_vectors,
            sites,
        } = value;

        let sites = sites
            .into_iter()
            .map(|site| Site::new(site.element, site.fractional))
            .collect();

        Cell::from_lattice_vectors(lattice_vectors.map(Vector3::from), sites)
    }
}

impl From<Cell> for ConfigCell {
    fn from(value: Cell) -> Self {
        Self {
            lattice_vectors: value.lattice.map(|vector| vector.into()),
            sites: value
                .sites
                .into_iter()
                .map(|site| ConfigSite {
                    element: site.element,
                    fractional: site.fractional.into(),
                })
                .collect(),
        }
    }
}
