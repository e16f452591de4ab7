pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod parallel;
pub mod sim;

pub use error::{AreaDamageError, Result};
