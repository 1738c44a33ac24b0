//! Reader for the `.castep` output of the plane-wave code.
//!
//! Only the last lattice, last set of fractional coordinates and last final energy are kept,
//! so geometry optimisations report their final structure.
use std::{fs, path::Path};

use nalgebra::Vector3;

use crate::{
    cell::{Cell, Site},
    error::{Error, Result},
};

use super::{Energies, ParsedFile};

pub fn parse_castep(path: &Path) -> Result<ParsedFile> {
    let contents = fs::read_to_string(path)?;
    parse_castep_str(&contents).map_err(|reason| Error::UnknownFormat {
        path: path.to_path_buf(),
        reason,
    })
}

pub(crate) fn parse_castep_str(contents: &str) -> std::result::Result<ParsedFile, String> {
    let lines = contents.lines().collect::<Vec<_>>();

    let mut final_energy = None;
    let mut lattice = None;
    let mut sites = None;

    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();

        // "Final energy, E             =  -856.3478129088     eV"
        if trimmed.starts_with("Final energy") {
            final_energy = number_before(trimmed, "eV").or(final_energy);
        }

        if trimmed.starts_with("Real Lattice(A)") {
            lattice = Some(read_lattice(&lines[index + 1..])?);
        }

        if trimmed.contains("Fractional coordinates of atoms") {
            // skip the column header and the separator
            sites = Some(read_sites(lines.get(index + 3..).unwrap_or_default()));
        }
    }

    let lattice = lattice.ok_or("no lattice block")?;
    let sites = sites.ok_or("no fractional coordinates block")?;
    let cell = Cell::from_lattice_vectors(lattice, sites).map_err(|err| err.to_string())?;

    let energies = Energies {
        electronic_total_e: final_energy,
        ..Default::default()
    };

    Ok(ParsedFile::new(energies, cell))
}

fn read_lattice(lines: &[&str]) -> std::result::Result<[Vector3<f64>; 3], String> {
    let mut vectors = [Vector3::zeros(); 3];

    for (vector, line) in vectors.iter_mut().zip(lines) {
        let numbers = line
            .split_whitespace()
            .take(3)
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| format!("bad lattice line `{line}`: {err}"))?;

        let &[x, y, z] = numbers.as_slice() else {
            return Err(format!("lattice line `{line}` has fewer than three numbers"));
        };
        *vector = Vector3::new(x, y, z);
    }

    if lines.len() < 3 {
        return Err("truncated lattice block".to_owned());
    }
    Ok(vectors)
}

// lines look like "x  Si           1         0.000000   0.000000   0.000000   x"
fn read_sites(lines: &[&str]) -> Vec<Site> {
    lines
        .iter()
        .map_while(|line| {
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            let &["x", element, _number, u, v, w, "x"] = tokens.as_slice() else {
                return None;
            };

            let fractional = [u, v, w].map(|value| value.parse::<f64>().ok());
            match fractional {
                [Some(u), Some(v), Some(w)] => Some(Site::new(element, [u, v, w])),
                _ => None,
            }
        })
        .collect()
}

fn number_before(line: &str, marker: &str) -> Option<f64> {
    let before = &line[..line.find(marker)?];
    before.split_whitespace().last()?.parse().ok()
}
