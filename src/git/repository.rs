use crate::error::{GitVersionError, Result};
use crate::git::{newest_tag, CommitInfo, DETACHED_HEAD};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{BranchType, ErrorCode, Oid, Repository as Git2Repo, Sort};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Discover the repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path)
            .map_err(|e| GitVersionError::NotARepository(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "opened git repository");

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn head_oid(&self) -> Result<Oid> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    /// Resolve a tag, branch, remote branch or commit id to a commit
    fn resolve_commit(&self, name: &str) -> Result<Oid> {
        if let Ok(object) = self.repo.revparse_single(name) {
            return Ok(object.peel_to_commit()?.id());
        }

        let remotes = self.repo.remotes()?;
        for remote in remotes.iter().flatten() {
            let candidate = format!("refs/remotes/{}/{}", remote, name);
            if let Ok(reference) = self.repo.find_reference(&candidate) {
                return Ok(reference.peel_to_commit()?.id());
            }
        }

        Err(GitVersionError::repository(format!(
            "cannot resolve '{}' to a commit",
            name
        )))
    }

    /// Map of commit id to the tags pointing at it; tags on non-commits are skipped
    fn tag_targets(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let mut targets: HashMap<Oid, Vec<String>> = HashMap::new();
        let names = self.repo.tag_names(None)?;

        for name in names.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            match reference.peel_to_commit() {
                Ok(commit) => targets.entry(commit.id()).or_default().push(name.to_string()),
                Err(e) => debug!(tag = name, error = %e, "tag does not point at a commit"),
            }
        }

        Ok(targets)
    }

    fn walk_from_head(&self, hide: Option<&str>) -> Result<git2::Revwalk<'_>> {
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        walk.push_head()?;
        if let Some(reference) = hide {
            walk.hide(self.resolve_commit(reference)?)?;
        }
        Ok(walk)
    }
}

fn format_commit_time(time: git2::Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
        .unwrap_or_else(|| Utc.fix());
    match DateTime::from_timestamp(time.seconds(), 0) {
        Some(utc) => utc
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M:%S %z")
            .to_string(),
        None => time.seconds().to_string(),
    }
}

impl super::Repository for Git2Repository {
    fn is_repository(&self) -> bool {
        // Opening already went through discovery.
        !self.repo.path().as_os_str().is_empty()
    }

    fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) if head.is_branch() => {
                Ok(head.shorthand().unwrap_or(DETACHED_HEAD).to_string())
            }
            Ok(_) => Ok(DETACHED_HEAD.to_string()),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.repo.find_reference("HEAD")?;
                let target = head.symbolic_target().unwrap_or(DETACHED_HEAD);
                Ok(target.trim_start_matches("refs/heads/").to_string())
            }
            Err(_) => Ok(DETACHED_HEAD.to_string()),
        }
    }

    fn head_sha(&self) -> Result<String> {
        Ok(self.head_oid()?.to_string())
    }

    fn head_short_sha(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        let short = commit.as_object().short_id()?;
        Ok(short
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| commit.id().to_string()[..7].to_string()))
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        let targets = self.tag_targets()?;
        if targets.is_empty() {
            return Ok(None);
        }

        for oid in self.walk_from_head(None)? {
            if let Some(tags) = targets.get(&oid?) {
                return Ok(newest_tag(tags).cloned());
            }
        }

        Ok(None)
    }

    fn tags_reachable_from_head(&self) -> Result<Vec<String>> {
        let head = self.head_oid()?;
        let mut reachable = Vec::new();

        for (oid, tags) in self.tag_targets()? {
            if oid == head || self.repo.graph_descendant_of(head, oid)? {
                reachable.extend(tags);
            }
        }

        reachable.sort();
        Ok(reachable)
    }

    fn commit_sha_for_tag(&self, tag: &str) -> Result<String> {
        let reference = self
            .repo
            .find_reference(&format!("refs/tags/{}", tag))
            .map_err(|e| GitVersionError::repository(format!("cannot find tag '{}': {}", tag, e)))?;
        Ok(reference.peel_to_commit()?.id().to_string())
    }

    fn all_remote_branches(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in self.repo.branches(Some(BranchType::Remote))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()? else {
                continue;
            };
            // "origin/release/1.0" -> "release/1.0"
            let Some((_, short)) = name.split_once('/') else {
                continue;
            };
            if short != "HEAD" {
                names.push(short.to_string());
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    fn merge_base(&self, branch_a: &str, branch_b: &str) -> Result<Option<String>> {
        let a = self.resolve_commit(branch_a)?;
        let b = self.resolve_commit(branch_b)?;

        match self.repo.merge_base(a, b) {
            Ok(oid) => Ok(Some(oid.to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn commit_history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        let mut commits = Vec::new();

        for oid in self.walk_from_head(None)?.take(limit) {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(CommitInfo {
                sha: commit.id().to_string(),
                message: commit.message().unwrap_or_default().to_string(),
                date: format_commit_time(commit.time()),
            });
        }

        Ok(commits)
    }

    fn commits_since(&self, reference: Option<&str>) -> Result<Vec<String>> {
        let mut messages = Vec::new();

        for oid in self.walk_from_head(reference)? {
            let commit = self.repo.find_commit(oid?)?;
            messages.push(commit.message().unwrap_or_default().to_string());
        }

        Ok(messages)
    }

    fn commit_count_since(&self, reference: Option<&str>) -> Result<usize> {
        let mut count = 0;
        for oid in self.walk_from_head(reference)? {
            oid?;
            count += 1;
        }
        Ok(count)
    }

    fn commit_date(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(format_commit_time(commit.time()))
    }
}

// SAFETY: all access goes through &self read-only queries; libgit2 is built thread-safe
// and no interior state of the handle is shared outside this wrapper.
unsafe impl Sync for Git2Repository {}
