//! Base version strategies
//!
//! Each [Strategy] inspects the repository through a [VersionContext] and yields zero or
//! more [BaseVersion] candidates. The [StrategyManager] runs the enabled strategies in
//! priority order and [select_base_version] picks the one the engine builds on.

pub mod manager;
pub mod strategies;

pub use manager::{select_base_version, StrategyManager};

use crate::config::{BranchPolicy, Config};
use crate::domain::SemanticVersion;
use crate::error::{GitVersionError, Result};
use crate::git::Repository;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of base version evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Constant `0.0.0`
    Fallback,
    /// Explicit override or the configured `next-version`
    ConfiguredNextVersion,
    /// Version tags reachable from HEAD
    TaggedCommit,
    /// A version embedded in the current branch name
    VersionInBranchName,
    /// Versions of release branches, anchored at their merge base
    TrackReleaseBranches,
    /// Versions of branches named in recent merge commits
    MergeMessage,
    /// Latest tag on a main branch
    Mainline,
}

impl Strategy {
    /// Execution order of the manager; earlier strategies win ties
    pub const PRIORITY: [Strategy; 7] = [
        Strategy::ConfiguredNextVersion,
        Strategy::VersionInBranchName,
        Strategy::TaggedCommit,
        Strategy::TrackReleaseBranches,
        Strategy::MergeMessage,
        Strategy::Mainline,
        Strategy::Fallback,
    ];

    /// Collect this strategy's candidates
    pub fn base_versions(self, ctx: &VersionContext<'_>) -> Result<Vec<BaseVersion>> {
        match self {
            Strategy::Fallback => Ok(strategies::fallback()),
            Strategy::ConfiguredNextVersion => strategies::configured_next_version(ctx),
            Strategy::TaggedCommit => strategies::tagged_commit(ctx),
            Strategy::VersionInBranchName => Ok(strategies::version_in_branch_name(ctx)),
            Strategy::TrackReleaseBranches => strategies::track_release_branches(ctx),
            Strategy::MergeMessage => strategies::merge_message(ctx),
            Strategy::Mainline => strategies::mainline(ctx),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Fallback => "Fallback",
            Strategy::ConfiguredNextVersion => "ConfiguredNextVersion",
            Strategy::TaggedCommit => "TaggedCommit",
            Strategy::VersionInBranchName => "VersionInBranchName",
            Strategy::TrackReleaseBranches => "TrackReleaseBranches",
            Strategy::MergeMessage => "MergeMessage",
            Strategy::Mainline => "Mainline",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A candidate base version together with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct BaseVersion {
    pub version: SemanticVersion,
    /// Human readable description of the evidence
    pub source: String,
    /// Whether the engine may bump this candidate
    pub should_increment: bool,
    /// Commit the evidence is anchored at; empty when there is none
    pub source_commit: String,
    pub strategy: Strategy,
}

impl BaseVersion {
    /// The `0.0.0` candidate used when no evidence exists
    pub fn fallback() -> Self {
        BaseVersion {
            version: SemanticVersion::new(0, 0, 0),
            source: "Fallback base version".to_string(),
            should_increment: true,
            source_commit: String::new(),
            strategy: Strategy::Fallback,
        }
    }
}

/// Read-only inputs shared by every strategy during one resolution
pub struct VersionContext<'a> {
    pub repo: &'a dyn Repository,
    pub config: &'a Config,
    pub branch: String,
    /// Full id of the commit being versioned
    pub commit: String,
    pub policy: BranchPolicy,
    /// Enabled strategies
    pub strategies: Vec<Strategy>,
    /// Caller-supplied next version; takes precedence over `config.next_version`
    pub next_version: Option<String>,
    tag_prefix: Regex,
    merge_formats: Vec<Regex>,
}

impl<'a> VersionContext<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        config: &'a Config,
        branch: impl Into<String>,
        commit: impl Into<String>,
        policy: BranchPolicy,
        next_version: Option<String>,
    ) -> Result<Self> {
        let tag_prefix = Regex::new(&format!("^(?:{})", config.tag_prefix)).map_err(|e| {
            GitVersionError::config(format!("invalid tag-prefix '{}': {}", config.tag_prefix, e))
        })?;

        let merge_formats = config
            .merge_message_formats
            .iter()
            .map(|(name, pattern)| {
                Regex::new(pattern).map_err(|e| {
                    GitVersionError::config(format!("invalid merge-message-formats.{}: {}", name, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VersionContext {
            repo,
            config,
            branch: branch.into(),
            commit: commit.into(),
            policy,
            strategies: config.strategies.clone(),
            next_version: next_version.filter(|v| !v.trim().is_empty()),
            tag_prefix,
            merge_formats,
        })
    }

    /// Replace the enabled strategy list
    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = Strategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    /// Parse a tag name as a version after stripping the configured prefix
    pub fn parse_tag(&self, tag: &str) -> Result<SemanticVersion> {
        let stripped = self.tag_prefix.replace(tag, "");
        SemanticVersion::parse(&stripped)
    }

    /// Configured merge message formats, in declaration order
    pub fn merge_formats(&self) -> &[Regex] {
        &self.merge_formats
    }
}
