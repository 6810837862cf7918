//! Version resolution pipeline
//!
//! classify branch → collect base versions → select → increment → synthesize labels.

use crate::analyzer::VersionAnalyzer;
use crate::boundary::EvidenceWarning;
use crate::config::{BranchPolicy, CommitMessageIncrementMode, Config};
use crate::domain::branch::BRANCH_NAME_PLACEHOLDER;
use crate::domain::{
    sanitize_branch_name, trailing_segment, BranchKind, SemanticVersion, VersionBump, Workflow,
};
use crate::error::{GitVersionError, Result};
use crate::git::{CachedRepository, Repository};
use crate::strategy::{select_base_version, BaseVersion, Strategy, StrategyManager, VersionContext};
use tracing::{debug, info};

/// Why the configured increment was suppressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreventReason {
    /// Base version came from a merged branch and `of-merged-branch` is set
    MergedBranch,
    /// A version tag points at the current commit
    CurrentCommitTagged,
    /// The current commit is where a source branch was merged
    BranchMerged,
}

/// Outcome of the increment step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementDecision {
    /// Caller override, applied unconditionally
    Forced(VersionBump),
    Apply(VersionBump),
    /// The selected candidate must be used as is
    NotEligible,
    Prevented(PreventReason),
    /// Policy increment is `None`
    NoIncrement,
}

impl IncrementDecision {
    pub fn bump(&self) -> Option<VersionBump> {
        match self {
            IncrementDecision::Forced(bump) | IncrementDecision::Apply(bump) => Some(*bump),
            _ => None,
        }
    }
}

/// Decide how the selected candidate is bumped.
///
/// `planned` is the bump from the single configured source of truth (commit messages or
/// the branch policy).
pub fn decide_increment(
    candidate: &BaseVersion,
    forced: Option<VersionBump>,
    prevented: Option<PreventReason>,
    planned: Option<VersionBump>,
) -> IncrementDecision {
    if let Some(bump) = forced {
        return IncrementDecision::Forced(bump);
    }
    if !candidate.should_increment {
        return IncrementDecision::NotEligible;
    }
    if let Some(reason) = prevented {
        return IncrementDecision::Prevented(reason);
    }
    match planned {
        Some(bump) => IncrementDecision::Apply(bump),
        None => IncrementDecision::NoIncrement,
    }
}

/// Pre-release tag of a release branch, taken after the last `-` of its trailing segment
fn release_tag(branch: &str) -> Option<String> {
    if !branch.contains('/') {
        return None;
    }
    let (_, tag) = trailing_segment(branch).rsplit_once('-')?;
    (!tag.is_empty()).then(|| sanitize_branch_name(tag))
}

/// Label prepended to the commit count, `None` when the branch gets no pre-release
pub fn pre_release_label(kind: BranchKind, branch: &str, policy: &BranchPolicy) -> Option<String> {
    match kind {
        BranchKind::Main => return None,
        BranchKind::Release => {
            if let Some(tag) = release_tag(branch) {
                return Some(tag);
            }
        }
        _ => {}
    }

    let template = policy.label.as_deref().or(kind.default_label())?;
    let name = match kind {
        BranchKind::Feature => sanitize_branch_name(trailing_segment(branch)),
        _ => sanitize_branch_name(branch),
    };
    let label = template.replace(BRANCH_NAME_PLACEHOLDER, &name);
    (!label.is_empty()).then_some(label)
}

/// Attach the branch-specific pre-release label and build metadata
pub fn synthesize(
    mut version: SemanticVersion,
    kind: BranchKind,
    branch: &str,
    policy: &BranchPolicy,
    commit_count: usize,
    short_sha: &str,
) -> SemanticVersion {
    if kind == BranchKind::Main {
        version.pre_release = None;
    } else if commit_count > 0 {
        if let Some(label) = pre_release_label(kind, branch, policy) {
            version.pre_release = Some(format!("{}.{}", label, commit_count));
        }
    }
    version.build = Some(format!("{}+{}", commit_count, short_sha));
    version
}

/// Everything known about the version of the current commit
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVersion {
    pub version: SemanticVersion,
    pub branch: String,
    pub kind: BranchKind,
    pub sha: String,
    pub short_sha: String,
    pub commit_date: String,
    /// Description of the selected base version
    pub source: String,
    /// Commit the selected base version is anchored at, empty if none
    pub source_sha: String,
    pub commits_since_source: usize,
    pub pre_release_weight: i32,
    pub increment: IncrementDecision,
}

/// Resolves versions for one repository and configuration
pub struct VersionCalculator<R> {
    repo: CachedRepository<R>,
    config: Config,
}

impl<R: Repository> VersionCalculator<R> {
    pub fn new(repo: R, config: Config) -> Self {
        VersionCalculator {
            repo: CachedRepository::new(repo),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The memoizing repository used by every resolution
    pub fn repository(&self) -> &CachedRepository<R> {
        &self.repo
    }

    /// Compute the version of HEAD.
    ///
    /// `branch` overrides the checked out branch name; `next_version` overrides the
    /// configured next version.
    pub fn resolve_version(
        &self,
        branch: Option<&str>,
        workflow: Workflow,
        forced: Option<VersionBump>,
        next_version: Option<&str>,
    ) -> Result<SemanticVersion> {
        Ok(self.resolve(branch, workflow, forced, next_version)?.version)
    }

    /// Like [VersionCalculator::resolve_version], keeping the provenance of the result
    pub fn resolve(
        &self,
        branch: Option<&str>,
        workflow: Workflow,
        forced: Option<VersionBump>,
        next_version: Option<&str>,
    ) -> Result<ResolvedVersion> {
        if !self.repo.is_repository() {
            return Err(GitVersionError::NotARepository(
                "no version control metadata found".to_string(),
            ));
        }

        let branch = match branch.filter(|b| !b.is_empty()) {
            Some(branch) => branch.to_string(),
            None => self.repo.current_branch()?,
        };
        let sha = self.repo.head_sha()?;
        let short_sha = self.repo.head_short_sha()?;

        let kind = BranchKind::classify(&branch, workflow);
        let policy = self.policy_for(&branch, kind, workflow);
        debug!(branch = %branch, kind = %kind, policy = %policy.name, %workflow, "classified branch");

        let ctx = VersionContext::new(
            &self.repo,
            &self.config,
            branch.as_str(),
            sha.as_str(),
            policy,
            next_version.map(str::to_string),
        )?;

        let candidates = StrategyManager::new(&ctx.strategies).base_versions(&ctx)?;
        let base = select_base_version(&candidates)
            .cloned()
            .unwrap_or_else(BaseVersion::fallback);
        info!(version = %base.version, source = %base.source, "selected base version");

        let anchor = self.count_anchor(&base, &sha)?;
        let commit_count = self.repo.commit_count_since(anchor.as_deref())?;
        if commit_count == 0 {
            if let Some(anchor) = &anchor {
                let warning = EvidenceWarning::NoNewCommits {
                    anchor: anchor.clone(),
                    current_commit_hash: sha.clone(),
                };
                debug!("{}", warning);
            }
        }

        let prevented = self.prevention(&ctx, &base)?;
        let planned = self.planned_increment(&ctx.policy, anchor.as_deref())?;
        let decision = decide_increment(&base, forced, prevented, planned);
        debug!(?decision, "increment decision");

        let mut version = base.version.clone();
        if let Some(bump) = decision.bump() {
            version.increment(bump)?;
        }

        let version = synthesize(version, kind, &branch, &ctx.policy, commit_count, &short_sha);
        info!(version = %version, "resolved version");

        Ok(ResolvedVersion {
            version,
            kind,
            sha,
            short_sha,
            commit_date: self.repo.commit_date()?,
            source: base.source,
            source_sha: base.source_commit,
            commits_since_source: commit_count,
            pre_release_weight: ctx.policy.pre_release_weight,
            increment: decision,
            branch,
        })
    }

    /// GitFlow honours configured policies; the other workflows use the policy of the kind
    fn policy_for(&self, branch: &str, kind: BranchKind, workflow: Workflow) -> BranchPolicy {
        match workflow {
            Workflow::GitFlow => self.config.policy_for(branch),
            Workflow::GitHubFlow | Workflow::Trunk => self
                .config
                .branches
                .get(kind.policy_name())
                .cloned()
                .unwrap_or_else(|| kind.default_policy()),
        }
    }

    /// Reference commits are counted from: the base version's commit, else the latest tag
    fn count_anchor(&self, base: &BaseVersion, head: &str) -> Result<Option<String>> {
        if !base.source_commit.is_empty() && base.source_commit != head {
            return Ok(Some(base.source_commit.clone()));
        }
        self.repo.latest_tag()
    }

    fn planned_increment(
        &self,
        policy: &BranchPolicy,
        anchor: Option<&str>,
    ) -> Result<Option<VersionBump>> {
        match self.config.commit_message_incrementing {
            CommitMessageIncrementMode::Enabled => {
                let analyzer = VersionAnalyzer::new(&self.config)?;
                let messages = self.repo.commits_since(anchor)?;
                Ok(Some(analyzer.analyze_messages(&messages)))
            }
            CommitMessageIncrementMode::Disabled => {
                Ok(self.config.effective_increment(policy).as_bump())
            }
        }
    }

    fn prevention(
        &self,
        ctx: &VersionContext<'_>,
        base: &BaseVersion,
    ) -> Result<Option<PreventReason>> {
        let prevent = ctx.policy.prevent_increment;

        if prevent.of_merged_branch && base.strategy == Strategy::MergeMessage {
            return Ok(Some(PreventReason::MergedBranch));
        }

        if prevent.when_current_commit_tagged {
            for tag in self.repo.tags_reachable_from_head()? {
                if ctx.parse_tag(&tag).is_ok() && self.repo.commit_sha_for_tag(&tag)? == ctx.commit {
                    return Ok(Some(PreventReason::CurrentCommitTagged));
                }
            }
        }

        if prevent.when_branch_merged {
            for source in &ctx.policy.source_branches {
                if *source == ctx.branch {
                    continue;
                }
                match self.repo.merge_base(source, &ctx.branch) {
                    Ok(Some(merge_base)) if merge_base == ctx.commit => {
                        return Ok(Some(PreventReason::BranchMerged));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let warning = EvidenceWarning::UnresolvableBranch {
                            branch: source.clone(),
                            reason: e.to_string(),
                        };
                        debug!("{}", warning);
                    }
                }
            }
        }

        Ok(None)
    }
}
