use serde::Deserialize;

use crate::blocking::VarianceConvention;

/// Options for the blocking analysis of a correlated series.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BlockingConfig {
    /// The highest blocking order to report. Blocking also stops once fewer than
    /// two blocks remain.
    pub max_order: usize,
    pub convention: VarianceConvention,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            max_order: usize::MAX,
            convention: VarianceConvention::default(),
        }
    }
}
