//! Standard error of the mean of a correlated series by repeated blocking.
//!
//! Each order averages disjoint neighbouring pairs of the previous one. Once the blocks are
//! longer than the correlation time the standard error stops growing and can be read off.
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    config::BlockingConfig,
    error::{Error, Result},
};

/// How the variance of the mean is formed from the population variance σ² of a block
/// of length n.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceConvention {
    /// σ² / (n - 1)
    #[default]
    Corrected,
    /// σ² / n - 1, which some reference outputs were produced with. Yields NaN standard
    /// errors whenever σ² < n.
    Legacy,
}

impl VarianceConvention {
    fn variance_of_mean(self, variance: f64, n: usize) -> f64 {
        match self {
            Self::Corrected => variance / (n - 1) as f64,
            Self::Legacy => variance / n as f64 - 1.0,
        }
    }
}

/// Statistics of one blocking order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockingRecord {
    pub order: usize,
    pub mean: f64,
    /// Standard deviation of the mean
    pub std_mean: f64,
    /// Standard deviation of `std_mean`
    pub std_std_mean: f64,
}

/// Blocking analysis with the corrected variance, up to and including `max_order`.
///
/// Reference outputs produced with σ² / n - 1 will not match these standard errors. Use
/// [`blocking_stats_with`] and [`VarianceConvention::Legacy`] to reproduce them.
pub fn blocking_stats(x: &[f64], max_order: usize) -> Result<Vec<BlockingRecord>> {
    blocking_stats_with(
        x,
        &BlockingConfig {
            max_order,
            ..Default::default()
        },
    )
}

/// Blocking analysis of `x`, one record per order until fewer than two blocks remain or
/// `config.max_order` is reached.
pub fn blocking_stats_with(x: &[f64], config: &BlockingConfig) -> Result<Vec<BlockingRecord>> {
    if x.len() < 2 {
        return Err(Error::EmptyInput(x.len()));
    }

    let mut records = Vec::new();
    let mut block = x.to_vec();

    for order in 0..=config.max_order {
        if block.len() < 2 {
            break;
        }

        records.push(block_record(order, &block, config.convention));

        // a trailing odd element is dropped
        block = block
            .iter()
            .tuples()
            .map(|(a, b)| 0.5 * (a + b))
            .collect();
    }

    log::debug!("{} blocking orders from {} samples", records.len(), x.len());
    Ok(records)
}

fn block_record(order: usize, block: &[f64], convention: VarianceConvention) -> BlockingRecord {
    let n = block.len();
    let mean = block.iter().sum::<f64>() / n as f64;
    let variance = block.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;

    let std_mean = convention.variance_of_mean(variance, n).sqrt();

    BlockingRecord {
        order,
        mean,
        std_mean,
        std_std_mean: std_mean / (2.0 * (n - 1) as f64).sqrt(),
    }
}
