//! Git operations abstraction layer
//!
//! The version engine only sees the [Repository] trait. Implementations:
//!
//! - [repository::Git2Repository]: a real repository read through the `git2` crate
//! - [mock::MockRepository]: an in-memory linear history for tests
//! - [cache::CachedRepository]: memoizes another implementation for one resolution run
//!
//! All queries are read-only.

pub mod cache;
pub mod mock;
pub mod repository;

pub use cache::CachedRepository;
pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::SemanticVersion;
use crate::error::Result;

/// Commit information used for merge message analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit id
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Commit date, `YYYY-MM-DD HH:MM:SS +ZZZZ`
    pub date: String,
}

/// Branch name reported when HEAD is detached
pub const DETACHED_HEAD: &str = "HEAD";

/// Pick the newest of several tags on one commit.
///
/// Names that parse as a version once any non-numeric prefix is dropped outrank those that
/// do not and compare by precedence; the rest compare by name.
pub fn newest_tag<'a, I>(names: I) -> Option<&'a String>
where
    I: IntoIterator<Item = &'a String>,
{
    names.into_iter().max_by(|a, b| {
        tag_version(a)
            .cmp(&tag_version(b))
            .then_with(|| a.cmp(b))
    })
}

fn tag_version(name: &str) -> Option<SemanticVersion> {
    SemanticVersion::parse(name.trim_start_matches(|c: char| !c.is_ascii_digit())).ok()
}

/// Read-only repository queries consumed by the version engine.
///
/// ## Error Handling
///
/// "Nothing found" is reported through empty collections or `None`; `Err` is reserved
/// for queries that could not be answered.
pub trait Repository: Send + Sync {
    /// Whether version-control metadata is present
    fn is_repository(&self) -> bool;

    /// Short name of the checked out branch, or [DETACHED_HEAD]
    fn current_branch(&self) -> Result<String>;

    /// Full id of the HEAD commit
    fn head_sha(&self) -> Result<String>;

    /// Abbreviated id of the HEAD commit
    fn head_short_sha(&self) -> Result<String>;

    /// Nearest tag reachable from HEAD
    fn latest_tag(&self) -> Result<Option<String>>;

    /// Every tag whose commit is an ancestor of (or equal to) HEAD
    fn tags_reachable_from_head(&self) -> Result<Vec<String>>;

    /// Commit id a tag points at
    fn commit_sha_for_tag(&self, tag: &str) -> Result<String>;

    /// Remote branch names with the remote prefix stripped
    fn all_remote_branches(&self) -> Result<Vec<String>>;

    /// Best common ancestor of two branches, `None` for unrelated histories
    fn merge_base(&self, branch_a: &str, branch_b: &str) -> Result<Option<String>>;

    /// Most recent commits reachable from HEAD, newest first
    fn commit_history(&self, limit: usize) -> Result<Vec<CommitInfo>>;

    /// Messages of commits reachable from HEAD but not from `reference`, newest first.
    ///
    /// `reference` may be a tag or a commit id; `None` means the whole history.
    fn commits_since(&self, reference: Option<&str>) -> Result<Vec<String>>;

    /// Number of commits reachable from HEAD but not from `reference`
    fn commit_count_since(&self, reference: Option<&str>) -> Result<usize>;

    /// Date of the HEAD commit
    fn commit_date(&self) -> Result<String>;
}
