//! Commit message analysis

pub mod version_analyzer;

pub use version_analyzer::VersionAnalyzer;
