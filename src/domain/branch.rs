//! Branch classification and the canonical per-kind branch policies.
//!
//! The same table feeds `Config::default()`, the classifier's absorbing case and the
//! labels used when synthesizing pre-release strings.

use crate::config::{BranchPolicy, IncrementStrategy, PreventIncrement};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Branching model used to classify branch names
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Workflow {
    #[default]
    #[value(name = "gitflow")]
    GitFlow,
    #[value(name = "githubflow")]
    GitHubFlow,
    #[value(name = "trunk")]
    Trunk,
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workflow::GitFlow => write!(f, "gitflow"),
            Workflow::GitHubFlow => write!(f, "githubflow"),
            Workflow::Trunk => write!(f, "trunk"),
        }
    }
}

/// Role of a branch within its workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchKind {
    Main,
    Develop,
    Feature,
    Release,
    Hotfix,
    Support,
    Unknown,
}

/// GitFlow classifiers, tried in order; the first match wins.
static GITFLOW_CLASSIFIERS: Lazy<Vec<(BranchKind, Regex)>> = Lazy::new(|| {
    BranchKind::NAMED
        .iter()
        .filter_map(|kind| kind.default_regex().map(|pattern| (*kind, pattern)))
        .map(|(kind, pattern)| {
            let regex = Regex::new(pattern).expect("built-in branch regex is valid");
            (kind, regex)
        })
        .collect()
});

impl BranchKind {
    /// Kinds with a canonical policy name, in classification order
    pub const NAMED: [BranchKind; 6] = [
        BranchKind::Main,
        BranchKind::Develop,
        BranchKind::Release,
        BranchKind::Feature,
        BranchKind::Hotfix,
        BranchKind::Support,
    ];

    /// Classify a branch name under the given workflow
    pub fn classify(branch: &str, workflow: Workflow) -> Self {
        match workflow {
            Workflow::GitFlow => GITFLOW_CLASSIFIERS
                .iter()
                .find(|(_, regex)| regex.is_match(branch))
                .map(|(kind, _)| *kind)
                .unwrap_or(BranchKind::Unknown),
            Workflow::GitHubFlow => {
                if matches!(branch, "main" | "master") {
                    BranchKind::Main
                } else {
                    BranchKind::Feature
                }
            }
            Workflow::Trunk => BranchKind::Main,
        }
    }

    /// Policy name used as the key in the branch configuration map
    pub fn policy_name(&self) -> &'static str {
        match self {
            BranchKind::Main => "main",
            BranchKind::Develop => "develop",
            BranchKind::Feature => "feature",
            BranchKind::Release => "release",
            BranchKind::Hotfix => "hotfix",
            BranchKind::Support => "support",
            BranchKind::Unknown => "unknown",
        }
    }

    fn default_regex(&self) -> Option<&'static str> {
        match self {
            BranchKind::Main => Some("^(master|main)$"),
            BranchKind::Develop => Some("^dev(elop)?(ment)?$"),
            BranchKind::Feature => Some(r"^features?[/-]"),
            BranchKind::Release => Some(r"^releases?[/-]"),
            BranchKind::Hotfix => Some(r"^hotfix(es)?[/-]"),
            BranchKind::Support => Some(r"^support[/-]"),
            BranchKind::Unknown => None,
        }
    }

    /// Pre-release label applied when the policy does not set one
    pub fn default_label(&self) -> Option<&'static str> {
        match self {
            BranchKind::Main => None,
            BranchKind::Develop => Some("alpha"),
            BranchKind::Release => Some("beta"),
            BranchKind::Hotfix => Some("hotfix"),
            BranchKind::Feature | BranchKind::Support | BranchKind::Unknown => {
                Some(BRANCH_NAME_PLACEHOLDER)
            }
        }
    }

    /// Canonical policy for this kind of branch
    pub fn default_policy(&self) -> BranchPolicy {
        let sources = |names: &[&str]| -> BTreeSet<String> {
            names.iter().map(|name| name.to_string()).collect()
        };

        let base = BranchPolicy {
            name: self.policy_name().to_string(),
            regex: self.default_regex().map(str::to_string),
            increment: IncrementStrategy::Patch,
            prevent_increment: PreventIncrement::default(),
            label: self.default_label().map(str::to_string),
            source_branches: BTreeSet::new(),
            is_main_branch: false,
            is_release_branch: false,
            tracks_release_branches: false,
            track_merge_message: true,
            pre_release_weight: 30000,
        };

        match self {
            BranchKind::Main => BranchPolicy {
                is_main_branch: true,
                pre_release_weight: 55000,
                ..base
            },
            BranchKind::Develop => BranchPolicy {
                increment: IncrementStrategy::Minor,
                source_branches: sources(&["main"]),
                tracks_release_branches: true,
                pre_release_weight: 0,
                ..base
            },
            BranchKind::Feature => BranchPolicy {
                increment: IncrementStrategy::Inherit,
                source_branches: sources(&["develop", "main", "release", "support", "hotfix"]),
                ..base
            },
            BranchKind::Release => BranchPolicy {
                prevent_increment: PreventIncrement {
                    when_current_commit_tagged: true,
                    ..PreventIncrement::default()
                },
                source_branches: sources(&["develop", "main", "support"]),
                is_release_branch: true,
                ..base
            },
            BranchKind::Hotfix => BranchPolicy {
                source_branches: sources(&["main", "support"]),
                is_release_branch: true,
                pre_release_weight: 40000,
                ..base
            },
            BranchKind::Support => BranchPolicy {
                source_branches: sources(&["main"]),
                track_merge_message: false,
                pre_release_weight: 55000,
                ..base
            },
            BranchKind::Unknown => BranchPolicy {
                track_merge_message: false,
                ..base
            },
        }
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.policy_name())
    }
}

/// Placeholder substituted with the (sanitized) branch name in label templates
pub const BRANCH_NAME_PLACEHOLDER: &str = "{BranchName}";

/// Replace every non-alphanumeric character with `-`
pub fn sanitize_branch_name(branch: &str) -> String {
    branch
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Last `/`-delimited segment of a branch name
pub fn trailing_segment(branch: &str) -> &str {
    branch.rsplit('/').next().unwrap_or(branch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitflow_classification() {
        let cases = [
            ("main", BranchKind::Main),
            ("master", BranchKind::Main),
            ("develop", BranchKind::Develop),
            ("feature/user-auth", BranchKind::Feature),
            ("release/1.2.0", BranchKind::Release),
            ("hotfix/critical-fix", BranchKind::Hotfix),
            ("support/v1.x", BranchKind::Support),
            ("random-branch", BranchKind::Unknown),
            ("mainline", BranchKind::Unknown),
        ];
        for (branch, expected) in cases {
            assert_eq!(
                BranchKind::classify(branch, Workflow::GitFlow),
                expected,
                "branch {}",
                branch
            );
        }
    }

    #[test]
    fn test_githubflow_classification() {
        assert_eq!(
            BranchKind::classify("main", Workflow::GitHubFlow),
            BranchKind::Main
        );
        assert_eq!(
            BranchKind::classify("some-feature", Workflow::GitHubFlow),
            BranchKind::Feature
        );
        assert_eq!(
            BranchKind::classify("develop", Workflow::GitHubFlow),
            BranchKind::Feature
        );
    }

    #[test]
    fn test_trunk_classification() {
        assert_eq!(
            BranchKind::classify("any-branch", Workflow::Trunk),
            BranchKind::Main
        );
    }

    #[test]
    fn test_default_policies() {
        let main = BranchKind::Main.default_policy();
        assert!(main.is_main_branch);
        assert_eq!(main.increment, IncrementStrategy::Patch);
        assert_eq!(main.label, None);

        let develop = BranchKind::Develop.default_policy();
        assert!(develop.tracks_release_branches);
        assert_eq!(develop.increment, IncrementStrategy::Minor);

        let unknown = BranchKind::Unknown.default_policy();
        assert_eq!(unknown.increment, IncrementStrategy::Patch);
        assert_eq!(unknown.label.as_deref(), Some("{BranchName}"));
        assert_eq!(unknown.regex, None);
    }

    #[test]
    fn test_sanitize_branch_name() {
        assert_eq!(sanitize_branch_name("feature/user_auth.v2"), "feature-user-auth-v2");
        assert_eq!(sanitize_branch_name("simple"), "simple");
    }

    #[test]
    fn test_trailing_segment() {
        assert_eq!(trailing_segment("feature/team/login"), "login");
        assert_eq!(trailing_segment("develop"), "develop");
    }
}
