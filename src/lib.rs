pub mod analyzer;
pub mod boundary;
pub mod calculator;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod output;
pub mod strategy;

pub use calculator::{ResolvedVersion, VersionCalculator};
pub use error::{GitVersionError, Result};
