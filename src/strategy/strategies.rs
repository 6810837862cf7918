//! Evidence producers behind each [Strategy] variant.
//!
//! Unparsable evidence is skipped; repository failures propagate to the manager.

use super::{BaseVersion, Strategy, VersionContext};
use crate::boundary::EvidenceWarning;
use crate::domain::SemanticVersion;
use crate::error::{GitVersionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Recent commits inspected for merge messages
pub const MERGE_HISTORY_DEPTH: usize = 50;

static VERSION_IN_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z\-]+(?:\.[0-9A-Za-z\-]+)*))?")
        .expect("version-in-name pattern is valid")
});

static RELEASE_BRANCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^releases?[/-]").expect("release branch pattern is valid"));

static BUILTIN_MERGE_FORMATS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^Merge branch '(?P<SourceBranch>[^']+)'",
        r"^Merge remote-tracking branch '(?:[^/']+/)?(?P<SourceBranch>[^']+)'",
        r"^Merge pull request #\d+ (?:from|in) (?:[^\s/]+/)?(?P<SourceBranch>\S+)",
        r"^Merge (?P<SourceBranch>\S+) into \S+",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("built-in merge format is valid"))
    .collect()
});

/// Find a `major.minor.patch[-pre]` version anywhere in a branch name
pub fn version_in_name(name: &str) -> Option<SemanticVersion> {
    let captures = VERSION_IN_NAME.captures(name)?;
    let number = |index: usize| captures.get(index)?.as_str().parse::<u64>().ok();

    let version = SemanticVersion::new(number(1)?, number(2)?, number(3)?);
    Some(match captures.get(4) {
        Some(pre) => version.with_pre_release(pre.as_str()),
        None => version,
    })
}

/// Branch a merge commit message names as its source
pub fn merged_branch<'m>(formats: &[Regex], message: &'m str) -> Option<&'m str> {
    let subject = message.lines().next().unwrap_or_default();
    formats
        .iter()
        .chain(BUILTIN_MERGE_FORMATS.iter())
        .find_map(|format| format.captures(subject)?.name("SourceBranch"))
        .map(|m| m.as_str())
}

pub fn fallback() -> Vec<BaseVersion> {
    vec![BaseVersion::fallback()]
}

pub fn configured_next_version(ctx: &VersionContext<'_>) -> Result<Vec<BaseVersion>> {
    let Some(value) = ctx
        .next_version
        .as_deref()
        .or(ctx.config.next_version.as_deref())
        .filter(|v| !v.trim().is_empty())
    else {
        return Ok(Vec::new());
    };

    let version = SemanticVersion::parse(value.trim()).map_err(|e| {
        GitVersionError::InvalidConfiguredVersion {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(vec![BaseVersion {
        version,
        source: format!("Configured next version '{}'", value),
        should_increment: false,
        source_commit: String::new(),
        strategy: Strategy::ConfiguredNextVersion,
    }])
}

pub fn tagged_commit(ctx: &VersionContext<'_>) -> Result<Vec<BaseVersion>> {
    let mut candidates = Vec::new();

    for tag in ctx.repo.tags_reachable_from_head()? {
        let version = match ctx.parse_tag(&tag) {
            Ok(version) => version,
            Err(e) => {
                let warning = EvidenceWarning::UnparsableTag {
                    tag: tag.clone(),
                    reason: e.to_string(),
                };
                warn!("{}", warning);
                continue;
            }
        };

        let sha = ctx.repo.commit_sha_for_tag(&tag)?;
        candidates.push(BaseVersion {
            version,
            source: format!("Tag '{}'", tag),
            should_increment: true,
            source_commit: sha,
            strategy: Strategy::TaggedCommit,
        });
    }

    Ok(candidates)
}

pub fn version_in_branch_name(ctx: &VersionContext<'_>) -> Vec<BaseVersion> {
    version_in_name(&ctx.branch)
        .map(|version| BaseVersion {
            version,
            source: format!("Version in branch name '{}'", ctx.branch),
            should_increment: false,
            source_commit: ctx.commit.clone(),
            strategy: Strategy::VersionInBranchName,
        })
        .into_iter()
        .collect()
}

pub fn track_release_branches(ctx: &VersionContext<'_>) -> Result<Vec<BaseVersion>> {
    if !ctx.policy.tracks_release_branches {
        return Ok(Vec::new());
    }

    let mut candidates = Vec::new();
    for branch in ctx.repo.all_remote_branches()? {
        if !RELEASE_BRANCH.is_match(&branch) {
            continue;
        }
        let Some(version) = version_in_name(&branch) else {
            debug!(branch = %branch, "release branch carries no version");
            continue;
        };
        let Some(merge_base) = ctx.repo.merge_base(&branch, &ctx.branch)? else {
            debug!(branch = %branch, "release branch shares no history with current branch");
            continue;
        };

        candidates.push(BaseVersion {
            version,
            source: format!("Release branch '{}'", branch),
            should_increment: true,
            source_commit: merge_base,
            strategy: Strategy::TrackReleaseBranches,
        });
    }

    Ok(candidates)
}

pub fn merge_message(ctx: &VersionContext<'_>) -> Result<Vec<BaseVersion>> {
    if !ctx.policy.track_merge_message {
        return Ok(Vec::new());
    }

    let should_increment = !ctx.policy.prevent_increment.of_merged_branch;
    let mut candidates = Vec::new();

    for commit in ctx.repo.commit_history(MERGE_HISTORY_DEPTH)? {
        let Some(branch) = merged_branch(ctx.merge_formats(), &commit.message) else {
            continue;
        };
        let Some(version) = version_in_name(branch) else {
            debug!(branch = %branch, sha = %commit.sha, "merged branch carries no version");
            continue;
        };

        candidates.push(BaseVersion {
            version,
            source: format!("Merge message '{}'", commit.message.lines().next().unwrap_or_default()),
            should_increment,
            source_commit: commit.sha,
            strategy: Strategy::MergeMessage,
        });
    }

    Ok(candidates)
}

pub fn mainline(ctx: &VersionContext<'_>) -> Result<Vec<BaseVersion>> {
    if !ctx.policy.is_main_branch {
        return Ok(Vec::new());
    }

    let zero = |source: &str| BaseVersion {
        version: SemanticVersion::new(0, 0, 0),
        source: source.to_string(),
        should_increment: true,
        source_commit: String::new(),
        strategy: Strategy::Mainline,
    };

    let Some(tag) = ctx.repo.latest_tag()? else {
        return Ok(vec![zero("Mainline (no tags)")]);
    };

    match ctx.parse_tag(&tag) {
        Ok(version) => Ok(vec![BaseVersion {
            version,
            source: format!("Mainline from tag '{}'", tag),
            should_increment: true,
            source_commit: ctx.repo.commit_sha_for_tag(&tag)?,
            strategy: Strategy::Mainline,
        }]),
        Err(e) => {
            let warning = EvidenceWarning::UnparsableTag {
                tag,
                reason: e.to_string(),
            };
            warn!("{}", warning);
            Ok(vec![zero("Mainline (unparsable tag)")])
        }
    }
}
