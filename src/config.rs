use crate::domain::{BranchKind, VersionBump, Workflow};
use crate::error::{GitVersionError, Result};
use crate::strategy::Strategy;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a branch bumps its base version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum IncrementStrategy {
    None,
    #[default]
    Patch,
    Minor,
    Major,
    /// Use the global `increment` setting
    Inherit,
}

impl IncrementStrategy {
    /// Bump this strategy stands for; an unresolved `Inherit` behaves like `Patch`
    pub fn as_bump(self) -> Option<VersionBump> {
        match self {
            IncrementStrategy::None => None,
            IncrementStrategy::Patch | IncrementStrategy::Inherit => Some(VersionBump::Patch),
            IncrementStrategy::Minor => Some(VersionBump::Minor),
            IncrementStrategy::Major => Some(VersionBump::Major),
        }
    }
}

/// Situations in which the configured increment is suppressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PreventIncrement {
    pub of_merged_branch: bool,
    pub when_current_commit_tagged: bool,
    pub when_branch_merged: bool,
}

/// Declarative rules for one family of branches.
///
/// Policies are read-only once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BranchPolicy {
    /// Filled from the configuration key
    #[serde(default, skip_serializing)]
    pub name: String,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub increment: IncrementStrategy,
    #[serde(default)]
    pub prevent_increment: PreventIncrement,
    /// Pre-release label template; `{BranchName}` is substituted
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub source_branches: BTreeSet<String>,
    #[serde(default)]
    pub is_main_branch: bool,
    #[serde(default)]
    pub is_release_branch: bool,
    #[serde(default)]
    pub tracks_release_branches: bool,
    #[serde(default)]
    pub track_merge_message: bool,
    #[serde(default)]
    pub pre_release_weight: i32,
}

/// Which input decides the size of the bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum CommitMessageIncrementMode {
    /// Commit messages decide; the policy's increment is ignored
    Enabled,
    /// The branch policy decides; commit messages are ignored
    #[default]
    Disabled,
}

/// Commits whose evidence is discarded
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct IgnoreConfig {
    pub sha: Vec<String>,
}

fn default_tag_prefix() -> String {
    "[vV]".to_string()
}

fn default_major_bump_message() -> String {
    r"\+semver:\s*(breaking|major)".to_string()
}

fn default_minor_bump_message() -> String {
    r"\+semver:\s*(feature|minor)".to_string()
}

fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy::Fallback,
        Strategy::ConfiguredNextVersion,
        Strategy::MergeMessage,
        Strategy::TaggedCommit,
        Strategy::TrackReleaseBranches,
        Strategy::VersionInBranchName,
    ]
}

fn default_branches() -> IndexMap<String, BranchPolicy> {
    BranchKind::NAMED
        .iter()
        .map(|kind| (kind.policy_name().to_string(), kind.default_policy()))
        .collect()
}

/// Complete configuration for version resolution
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub next_version: Option<String>,

    /// Increment used by policies declaring `Inherit`
    #[serde(default = "inherit")]
    pub increment: IncrementStrategy,

    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default)]
    pub workflow: Workflow,

    #[serde(default)]
    pub commit_message_incrementing: CommitMessageIncrementMode,

    #[serde(default = "default_major_bump_message")]
    pub major_version_bump_message: String,

    #[serde(default = "default_minor_bump_message")]
    pub minor_version_bump_message: String,

    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,

    /// Extra merge message formats; each regex needs a `SourceBranch` group
    #[serde(default)]
    pub merge_message_formats: IndexMap<String, String>,

    #[serde(default)]
    pub ignore: IgnoreConfig,

    #[serde(default = "default_branches")]
    pub branches: IndexMap<String, BranchPolicy>,
}

fn inherit() -> IncrementStrategy {
    IncrementStrategy::Inherit
}

impl Default for Config {
    fn default() -> Self {
        Config {
            next_version: None,
            increment: IncrementStrategy::Inherit,
            tag_prefix: default_tag_prefix(),
            workflow: Workflow::default(),
            commit_message_incrementing: CommitMessageIncrementMode::default(),
            major_version_bump_message: default_major_bump_message(),
            minor_version_bump_message: default_minor_bump_message(),
            strategies: default_strategies(),
            merge_message_formats: IndexMap::new(),
            ignore: IgnoreConfig::default(),
            branches: default_branches(),
        }
    }
}

impl Config {
    /// Resolve the policy governing `branch`.
    ///
    /// Order: exact key, then each policy's regex in declaration order, then the
    /// `<name>/` prefix, then the built-in default. Overlapping regexes resolve to the
    /// first declared policy.
    pub fn policy_for(&self, branch: &str) -> BranchPolicy {
        if let Some(policy) = self.branches.get(branch) {
            return policy.clone();
        }

        for policy in self.branches.values() {
            let Some(pattern) = policy.regex.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            match Regex::new(pattern) {
                Ok(regex) if regex.is_match(branch) => return policy.clone(),
                Ok(_) => {}
                Err(e) => warn!(policy = %policy.name, error = %e, "skipping invalid branch regex"),
            }
        }

        if let Some(policy) = self
            .branches
            .iter()
            .find(|(name, _)| branch.starts_with(&format!("{}/", name)))
            .map(|(_, policy)| policy)
        {
            return policy.clone();
        }

        BranchKind::Unknown.default_policy()
    }

    /// Resolve a policy increment, following `Inherit` to the global setting
    pub fn effective_increment(&self, policy: &BranchPolicy) -> IncrementStrategy {
        match policy.increment {
            IncrementStrategy::Inherit => match self.increment {
                IncrementStrategy::Inherit => IncrementStrategy::Patch,
                global => global,
            },
            other => other,
        }
    }

    /// Whether evidence anchored at `sha` must be discarded
    pub fn is_ignored(&self, sha: &str) -> bool {
        !sha.is_empty()
            && self
                .ignore
                .sha
                .iter()
                .any(|ignored| !ignored.is_empty() && (sha.starts_with(ignored.as_str()) || ignored.starts_with(sha)))
    }

    /// Fill derived fields after deserialization
    fn normalize(mut self) -> Self {
        for (name, policy) in self.branches.iter_mut() {
            policy.name = name.clone();
        }
        self
    }

    /// Reject patterns that cannot be compiled
    pub fn validate(&self) -> Result<()> {
        let check = |what: &str, pattern: &str| -> Result<()> {
            Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| GitVersionError::config(format!("invalid {} '{}': {}", what, pattern, e)))
        };

        check("tag-prefix", &self.tag_prefix)?;
        check("major-version-bump-message", &self.major_version_bump_message)?;
        check("minor-version-bump-message", &self.minor_version_bump_message)?;

        for (name, pattern) in &self.merge_message_formats {
            check(&format!("merge-message-formats.{}", name), pattern)?;
            if !pattern.contains("?P<SourceBranch>") && !pattern.contains("?<SourceBranch>") {
                return Err(GitVersionError::config(format!(
                    "merge-message-formats.{} must capture a 'SourceBranch' group",
                    name
                )));
            }
        }

        for (name, policy) in &self.branches {
            if let Some(pattern) = &policy.regex {
                check(&format!("branches.{}.regex", name), pattern)?;
            }
        }

        Ok(())
    }

    /// Parse configuration text in the format implied by `extension`
    pub fn from_str_with_format(content: &str, extension: &str) -> Result<Self> {
        let config: Config = match extension.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)
                .map_err(|e| GitVersionError::config(format!("failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(content)
                .map_err(|e| GitVersionError::config(format!("failed to parse JSON: {}", e)))?,
            "yml" | "yaml" => serde_yaml::from_str(content)
                .map_err(|e| GitVersionError::config(format!("failed to parse YAML: {}", e)))?,
            other => {
                return Err(GitVersionError::config(format!(
                    "unsupported configuration file format: '{}'",
                    other
                )))
            }
        };

        let config = config.normalize();
        config.validate()?;
        Ok(config)
    }
}

const DISCOVERY_FILES: [&str; 4] = [
    "GitVersion.toml",
    "GitVersion.yml",
    "GitVersion.yaml",
    "GitVersion.json",
];

/// Find a configuration file in `dir`, then in the user config directory
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    DISCOVERY_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .or_else(|| {
            dirs::config_dir()
                .map(|config_dir| config_dir.join("gitversion").join("config.toml"))
                .filter(|path| path.is_file())
        })
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter (must exist)
/// 2. `GitVersion.{toml,yml,yaml,json}` in the current directory
/// 3. `<config_dir>/gitversion/config.toml`
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(path) => {
            if !path.is_file() {
                return Err(GitVersionError::config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match discover_config(Path::new(".")) {
            Some(path) => path,
            None => {
                debug!("no configuration file found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    debug!(path = %path.display(), "loading configuration");
    let content = fs::read_to_string(&path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    Config::from_str_with_format(&content, extension)
}
