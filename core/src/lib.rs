pub mod blocking;
pub mod cell;
pub mod config;
pub mod convergence;
pub mod energetics;
pub mod eos;
pub mod error;
pub mod hartree;
pub mod interstitial;
pub mod pairs;
pub mod parse;
pub mod probability;
pub mod units;

pub use error::{Error, Result};
