use std::path::PathBuf;

/// Every way a call into this crate can fail.
///
/// All variants are pre-condition or configuration failures detected at the call
/// boundary; nothing is retried internally.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid unit `{0}`")]
    InvalidUnit(String),

    #[error("unknown output format for {path:?}: {reason}")]
    UnknownFormat { path: PathBuf, reason: String },

    #[error("no energy field `{field}` in {origin}")]
    MissingEnergy { field: String, origin: String },

    #[error("energy field `{field}` does not hold a finite number ({value})")]
    InvalidEnergy { field: String, value: f64 },

    #[error("an equation of state fit needs at least {required} points, got {found}")]
    InsufficientPoints { required: usize, found: usize },

    #[error("equation of state fit failed within {max_iterations} iterations: {reason}")]
    FitError {
        max_iterations: usize,
        reason: String,
    },

    #[error("unknown equation of state model `{0}`")]
    UnknownModel(String),

    #[error("radial grid needs at least {required} points, got {found}")]
    GridTooSmall { required: usize, found: usize },

    #[error("blocking analysis needs at least two samples, got {0}")]
    EmptyInput(usize),

    #[error("lattice angles {angles:?} are not hexagonal (90, 90, 120)")]
    WrongLattice { angles: [f64; 3] },

    #[error("unknown interstitial site `{0}`")]
    UnknownSite(String),

    #[error("cannot place {markers} markers on {sites} sites with an adjacency set of {adjacent}")]
    ImpossibleFill {
        sites: usize,
        markers: usize,
        adjacent: usize,
    },

    #[error("no records matched the filter")]
    NoRecords,

    #[error("record is missing a numeric `{0}`")]
    InvalidRecord(String),

    #[error("structure `{0}` appears more than once")]
    DuplicateStructure(String),

    #[error("mixed methods in one group: `{0}` and `{1}`")]
    MixedMethods(String, String),

    #[error("mixed elements in one group: `{0}` and `{1}`")]
    MixedElements(String, String),

    #[error("method `{0}` is not present")]
    UnknownMethod(String),

    #[error("duplicate entry for pair ({0}, {1}) and structure `{2}`")]
    DuplicateEntry(String, String, String),

    #[error("invalid cell: {0}")]
    InvalidCell(String),

    #[error("{quantity} must be positive, got {value}")]
    NonPositive { quantity: &'static str, value: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
