use crate::error::{GitVersionError, Result};
use crate::git::{newest_tag, CommitInfo, Repository};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Mock repository with a linear history, for testing without actual git operations
pub struct MockRepository {
    is_repository: bool,
    branch: String,
    /// Oldest first
    commits: Vec<CommitInfo>,
    tags: HashMap<String, String>,
    remote_branches: Vec<String>,
    merge_bases: HashMap<(String, String), String>,
    failing: HashSet<&'static str>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl MockRepository {
    /// Create a new empty mock repository checked out on `main`
    pub fn new() -> Self {
        MockRepository {
            is_repository: true,
            branch: "main".to_string(),
            commits: Vec::new(),
            tags: HashMap::new(),
            remote_branches: Vec::new(),
            merge_bases: HashMap::new(),
            failing: HashSet::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// A directory without version-control metadata
    pub fn not_a_repository() -> Self {
        MockRepository {
            is_repository: false,
            ..Self::new()
        }
    }

    /// Append a commit with a generated id; returns the id
    pub fn add_commit(&mut self, message: impl Into<String>) -> String {
        let sha = format!("c{:06x}{:033x}", self.commits.len() + 1, 0);
        self.add_commit_with_sha(sha.clone(), message);
        sha
    }

    /// Append a commit with an explicit id
    pub fn add_commit_with_sha(&mut self, sha: impl Into<String>, message: impl Into<String>) {
        let day = self.commits.len() % 28 + 1;
        self.commits.push(CommitInfo {
            sha: sha.into(),
            message: message.into(),
            date: format!("2024-01-{:02} 12:00:00 +0000", day),
        });
    }

    /// Tag the newest commit
    pub fn tag_head(&mut self, name: impl Into<String>) {
        if let Some(head) = self.commits.last() {
            let sha = head.sha.clone();
            self.tags.insert(name.into(), sha);
        }
    }

    /// Add a tag pointing at a commit id
    pub fn add_tag(&mut self, name: impl Into<String>, sha: impl Into<String>) {
        self.tags.insert(name.into(), sha.into());
    }

    /// Set the checked out branch
    pub fn set_current_branch(&mut self, branch: impl Into<String>) {
        self.branch = branch.into();
    }

    pub fn add_remote_branch(&mut self, branch: impl Into<String>) {
        self.remote_branches.push(branch.into());
    }

    /// Record the merge base of two branches (order-insensitive)
    pub fn set_merge_base(
        &mut self,
        branch_a: impl Into<String>,
        branch_b: impl Into<String>,
        sha: impl Into<String>,
    ) {
        let (a, b) = (branch_a.into(), branch_b.into());
        let sha = sha.into();
        self.merge_bases.insert((b.clone(), a.clone()), sha.clone());
        self.merge_bases.insert((a, b), sha);
    }

    /// Make the named query return an error, e.g. `"tags_reachable_from_head"`
    pub fn fail_query(&mut self, query: &'static str) {
        self.failing.insert(query);
    }

    /// How many times a query was answered
    pub fn call_count(&self, query: &str) -> usize {
        self.calls.lock().get(query).copied().unwrap_or(0)
    }

    fn record(&self, query: &'static str) -> Result<()> {
        *self.calls.lock().entry(query).or_insert(0) += 1;
        if self.failing.contains(query) {
            return Err(GitVersionError::repository(format!("{} failed", query)));
        }
        Ok(())
    }

    fn head(&self) -> Result<&CommitInfo> {
        self.commits
            .last()
            .ok_or_else(|| GitVersionError::repository("repository has no commits"))
    }

    /// Index of the commit a tag or commit id refers to
    fn position_of(&self, reference: &str) -> Result<usize> {
        let sha = self.tags.get(reference).map(String::as_str).unwrap_or(reference);
        self.commits
            .iter()
            .position(|commit| !sha.is_empty() && commit.sha.starts_with(sha))
            .ok_or_else(|| GitVersionError::repository(format!("unknown revision '{}'", reference)))
    }

    fn commits_after(&self, reference: Option<&str>) -> Result<&[CommitInfo]> {
        match reference {
            Some(reference) => {
                let index = self.position_of(reference)?;
                Ok(&self.commits[index + 1..])
            }
            None => Ok(&self.commits),
        }
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn is_repository(&self) -> bool {
        self.is_repository
    }

    fn current_branch(&self) -> Result<String> {
        self.record("current_branch")?;
        Ok(self.branch.clone())
    }

    fn head_sha(&self) -> Result<String> {
        self.record("head_sha")?;
        Ok(self.head()?.sha.clone())
    }

    fn head_short_sha(&self) -> Result<String> {
        self.record("head_short_sha")?;
        Ok(self.head()?.sha.chars().take(7).collect())
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        self.record("latest_tag")?;
        for commit in self.commits.iter().rev() {
            let newest = newest_tag(
                self.tags
                    .iter()
                    .filter(|(_, sha)| **sha == commit.sha)
                    .map(|(name, _)| name),
            );
            if let Some(name) = newest {
                return Ok(Some(name.clone()));
            }
        }
        Ok(None)
    }

    fn tags_reachable_from_head(&self) -> Result<Vec<String>> {
        self.record("tags_reachable_from_head")?;
        let mut tags: Vec<String> = self
            .tags
            .iter()
            .filter(|(_, sha)| self.commits.iter().any(|commit| commit.sha == **sha))
            .map(|(name, _)| name.clone())
            .collect();
        tags.sort();
        Ok(tags)
    }

    fn commit_sha_for_tag(&self, tag: &str) -> Result<String> {
        self.record("commit_sha_for_tag")?;
        self.tags
            .get(tag)
            .cloned()
            .ok_or_else(|| GitVersionError::repository(format!("cannot find tag '{}'", tag)))
    }

    fn all_remote_branches(&self) -> Result<Vec<String>> {
        self.record("all_remote_branches")?;
        Ok(self.remote_branches.clone())
    }

    fn merge_base(&self, branch_a: &str, branch_b: &str) -> Result<Option<String>> {
        self.record("merge_base")?;
        Ok(self
            .merge_bases
            .get(&(branch_a.to_string(), branch_b.to_string()))
            .cloned())
    }

    fn commit_history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        self.record("commit_history")?;
        Ok(self.commits.iter().rev().take(limit).cloned().collect())
    }

    fn commits_since(&self, reference: Option<&str>) -> Result<Vec<String>> {
        self.record("commits_since")?;
        Ok(self
            .commits_after(reference)?
            .iter()
            .rev()
            .map(|commit| commit.message.clone())
            .collect())
    }

    fn commit_count_since(&self, reference: Option<&str>) -> Result<usize> {
        self.record("commit_count_since")?;
        Ok(self.commits_after(reference)?.len())
    }

    fn commit_date(&self) -> Result<String> {
        self.record("commit_date")?;
        Ok(self.head()?.date.clone())
    }
}
