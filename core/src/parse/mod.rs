//! Turning the output files of the supported codes into per-atom volumes and energies.
//!
//! The parsers themselves are plain callables collected into a [`ParserTable`]; the adapter
//! in here only picks one per file, applies the unit conversions of the code family, and
//! divides by the number of atoms.
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    cell::Cell,
    error::{Error, Result},
    units::{ANGSTROM3_TO_BOHR3, HARTREE_TO_EV, RYDBERG_TO_EV},
};

pub mod castep;

pub const TOTAL_ENERGY: &str = "electronicTotalE";
pub const COHESIVE_ENERGY: &str = "electronicCohesiveE";

/// The energies reported by a single calculation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Energies {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electronic_total_e: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electronic_cohesive_e: Option<f64>,
    /// Any other field the parser or the record store kept. Only numbers among them are
    /// energies; nulls and anything else are carried along untouched.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl Energies {
    /// Look up an energy by its field name.
    pub fn get(&self, field: &str) -> Option<f64> {
        match field {
            TOTAL_ENERGY => self.electronic_total_e,
            COHESIVE_ENERGY => self.electronic_cohesive_e,
            other => self.other.get(other).and_then(serde_json::Value::as_f64),
        }
    }

    /// Pick the energy the selector asks for. `origin` only names the source in errors.
    ///
    /// [`EnergySelector::Any`] falls back from the total to the cohesive energy when the
    /// total is absent; a present but non-finite value is an error, not a reason to fall back.
    pub fn select(&self, selector: &EnergySelector, origin: &str) -> Result<f64> {
        let (field, value) = match selector {
            EnergySelector::Any => match (self.electronic_total_e, self.electronic_cohesive_e) {
                (Some(total), _) => (TOTAL_ENERGY, total),
                (None, Some(cohesive)) => (COHESIVE_ENERGY, cohesive),
                (None, None) => {
                    return Err(Error::MissingEnergy {
                        field: format!("{TOTAL_ENERGY} or {COHESIVE_ENERGY}"),
                        origin: origin.to_owned(),
                    })
                }
            },
            EnergySelector::Field(field) => {
                let value = match (self.get(field), self.other.get(field)) {
                    (Some(value), _) => value,
                    // present, but not a number
                    (None, Some(_)) => f64::NAN,
                    (None, None) => {
                        return Err(Error::MissingEnergy {
                            field: field.clone(),
                            origin: origin.to_owned(),
                        })
                    }
                };
                (field.as_str(), value)
            }
        };

        if !value.is_finite() {
            return Err(Error::InvalidEnergy {
                field: field.to_owned(),
                value,
            });
        }
        Ok(value)
    }
}

/// Which energy of a calculation to use.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnergySelector {
    /// The total electronic energy, or the cohesive energy if there is no total
    #[default]
    Any,
    Field(String),
}

impl From<String> for EnergySelector {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("any") {
            Self::Any
        } else {
            Self::Field(value)
        }
    }
}

impl From<&str> for EnergySelector {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<EnergySelector> for String {
    fn from(value: EnergySelector) -> Self {
        match value {
            EnergySelector::Any => "any".to_owned(),
            EnergySelector::Field(field) => field,
        }
    }
}

/// The result of parsing one output file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFile {
    pub energies: Energies,
    pub numb_atoms: usize,
    pub unit_cell: Cell,
}

impl ParsedFile {
    /// A parsed file whose atom count is the number of sites in the cell.
    pub fn new(energies: Energies, unit_cell: Cell) -> Self {
        Self {
            energies,
            numb_atoms: unit_cell.n_sites(),
            unit_cell,
        }
    }
}

/// The family of codes an output file came from. Each family reports volumes and
/// energies in its own units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeFamily {
    /// Plane-wave code, `.castep` files in Angstrom and eV
    Castep,
    /// Tight-binding code, `.out` files in Bohr and Rydberg
    Plato,
    /// Gaussian-basis code, `.cpout` files in Angstrom and Hartree
    Cp2k,
    /// Serialized [`ParsedFile`]s, already in Bohr and eV
    Json,
}

impl CodeFamily {
    /// Infer the code family from a file suffix.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|extension| extension.to_str());

        match extension {
            Some("castep") => Ok(Self::Castep),
            Some("out") => Ok(Self::Plato),
            Some("cpout") => Ok(Self::Cp2k),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::UnknownFormat {
                path: path.to_path_buf(),
                reason: format!("unrecognised suffix {extension:?}"),
            }),
        }
    }

    /// Multiply a cell volume by this to get cubic Bohr.
    pub fn volume_factor(self) -> f64 {
        match self {
            Self::Castep | Self::Cp2k => ANGSTROM3_TO_BOHR3,
            Self::Plato | Self::Json => 1.0,
        }
    }

    /// Multiply an energy by this to get eV.
    pub fn energy_factor(self) -> f64 {
        match self {
            Self::Castep | Self::Json => 1.0,
            Self::Plato => RYDBERG_TO_EV,
            Self::Cp2k => HARTREE_TO_EV,
        }
    }
}

type ParserFn = dyn Fn(&Path) -> Result<ParsedFile> + Send + Sync;

/// Dispatch table from code family to the parser used for its output files.
#[derive(Default)]
pub struct ParserTable {
    parsers: HashMap<CodeFamily, Box<ParserFn>>,
}

impl ParserTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with the parsers this crate ships: serialized json records and castep output.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(CodeFamily::Json, parse_json)
            .register(CodeFamily::Castep, castep::parse_castep)
    }

    /// Register (or replace) the parser for a code family.
    pub fn register(
        mut self,
        family: CodeFamily,
        parser: impl Fn(&Path) -> Result<ParsedFile> + Send + Sync + 'static,
    ) -> Self {
        self.parsers.insert(family, Box::new(parser));
        self
    }

    pub fn parse(&self, family: CodeFamily, path: &Path) -> Result<ParsedFile> {
        let parser = self
            .parsers
            .get(&family)
            .ok_or_else(|| Error::UnknownFormat {
                path: path.to_path_buf(),
                reason: format!("no parser registered for {family:?}"),
            })?;
        parser(path)
    }
}

impl fmt::Debug for ParserTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.parsers.keys()).finish()
    }
}

/// Read a [`ParsedFile`] that was serialized as json.
pub fn parse_json(path: &Path) -> Result<ParsedFile> {
    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}

/// Per-atom volumes (cubic Bohr) and energies (eV), in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumesAndEnergies {
    pub volumes: Vec<f64>,
    pub energies: Vec<f64>,
}

/// Parse every file and return its per-atom volume and energy in canonical units.
///
/// The code family is inferred from the first path unless `family` is given.
pub fn parse_volumes_and_energies<P: AsRef<Path>>(
    table: &ParserTable,
    paths: &[P],
    family: Option<CodeFamily>,
    selector: &EnergySelector,
) -> Result<VolumesAndEnergies> {
    let Some(first) = paths.first() else {
        return Ok(VolumesAndEnergies::default());
    };

    let family = match family {
        Some(family) => family,
        None => CodeFamily::from_path(first.as_ref())?,
    };

    let mut output = VolumesAndEnergies {
        volumes: Vec::with_capacity(paths.len()),
        energies: Vec::with_capacity(paths.len()),
    };

    for path in paths {
        let path = path.as_ref();
        let parsed = table.parse(family, path)?;
        let origin = path.display().to_string();

        if parsed.numb_atoms == 0 {
            return Err(Error::NonPositive {
                quantity: "number of atoms",
                value: 0.0,
            });
        }
        let n_sites = parsed.unit_cell.n_sites();
        if n_sites != 0 && n_sites != parsed.numb_atoms {
            return Err(Error::UnknownFormat {
                path: path.to_path_buf(),
                reason: format!(
                    "{} atoms reported but the cell holds {n_sites} sites",
                    parsed.numb_atoms
                ),
            });
        }

        let n_atoms = parsed.numb_atoms as f64;
        let energy = parsed.energies.select(selector, &origin)? * family.energy_factor();
        let volume = parsed.unit_cell.volume() * family.volume_factor();

        log::debug!("{origin}: volume {volume:.4} bohr^3, energy {energy:.6} eV, {n_atoms} atoms");

        output.volumes.push(volume / n_atoms);
        output.energies.push(energy / n_atoms);
    }

    Ok(output)
}
