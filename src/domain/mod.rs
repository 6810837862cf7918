//! Domain logic - pure business rules independent of git operations

pub mod branch;
pub mod commit;
pub mod version;

pub use branch::{sanitize_branch_name, trailing_segment, BranchKind, Workflow};
pub use commit::ParsedCommit;
pub use version::{SemanticVersion, VersionBump};
