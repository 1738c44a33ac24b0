pub use blocking::BlockingConfig;
pub use cell::ConfigCell;
pub use eos::EosFitConfig;

mod blocking;
mod cell;
mod eos;
