use std::fmt;

fn short(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Evidence the engine skipped while resolving a version.
/// These are non-fatal issues that should be reported to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceWarning {
    /// No new commits since the commit the base version is anchored at
    NoNewCommits {
        anchor: String,
        current_commit_hash: String,
    },
    /// Tag exists but cannot be parsed as a semantic version
    UnparsableTag { tag: String, reason: String },
    /// Candidate anchored at a commit listed in `ignore.sha`
    IgnoredCommit { sha: String, source: String },
    /// A source branch could not be compared with the current branch
    UnresolvableBranch { branch: String, reason: String },
}

impl fmt::Display for EvidenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvidenceWarning::NoNewCommits {
                anchor,
                current_commit_hash,
            } => write!(
                f,
                "No new commits since '{}' (current: {})",
                short(anchor),
                short(current_commit_hash)
            ),
            EvidenceWarning::UnparsableTag { tag, reason } => {
                write!(f, "Cannot parse tag '{}': {}", tag, reason)
            }
            EvidenceWarning::IgnoredCommit { sha, source } => {
                write!(f, "Ignoring {} anchored at ignored commit {}", source, short(sha))
            }
            EvidenceWarning::UnresolvableBranch { branch, reason } => {
                write!(f, "Cannot inspect branch '{}': {}", branch, reason)
            }
        }
    }
}
