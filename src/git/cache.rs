//! Per-run memoization of repository queries.
//!
//! A resolution asks some questions several times (HEAD id, reachable tags). The
//! wrapper answers each distinct query from the underlying repository at most once.
//! Errors are not cached; a failed query aborts the run anyway.

use crate::error::Result;
use crate::git::{CommitInfo, Repository};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

/// Repository wrapper that caches every answer for the lifetime of the wrapper
pub struct CachedRepository<R> {
    inner: R,
    current_branch: OnceCell<String>,
    head_sha: OnceCell<String>,
    head_short_sha: OnceCell<String>,
    latest_tag: OnceCell<Option<String>>,
    reachable_tags: OnceCell<Vec<String>>,
    remote_branches: OnceCell<Vec<String>>,
    commit_date: OnceCell<String>,
    tag_shas: Mutex<HashMap<String, String>>,
    merge_bases: Mutex<HashMap<(String, String), Option<String>>>,
    histories: Mutex<HashMap<usize, Vec<CommitInfo>>>,
    commits_since: Mutex<HashMap<Option<String>, Vec<String>>>,
    counts_since: Mutex<HashMap<Option<String>, usize>>,
}

fn memoize<K, V>(
    cache: &Mutex<HashMap<K, V>>,
    key: K,
    query: impl FnOnce() -> Result<V>,
) -> Result<V>
where
    K: Eq + Hash,
    V: Clone,
{
    if let Some(value) = cache.lock().get(&key) {
        return Ok(value.clone());
    }
    // The lock is not held while the underlying repository runs the query.
    let value = query()?;
    cache.lock().insert(key, value.clone());
    Ok(value)
}

impl<R: Repository> CachedRepository<R> {
    pub fn new(inner: R) -> Self {
        CachedRepository {
            inner,
            current_branch: OnceCell::new(),
            head_sha: OnceCell::new(),
            head_short_sha: OnceCell::new(),
            latest_tag: OnceCell::new(),
            reachable_tags: OnceCell::new(),
            remote_branches: OnceCell::new(),
            commit_date: OnceCell::new(),
            tag_shas: Mutex::new(HashMap::new()),
            merge_bases: Mutex::new(HashMap::new()),
            histories: Mutex::new(HashMap::new()),
            commits_since: Mutex::new(HashMap::new()),
            counts_since: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Repository> Repository for CachedRepository<R> {
    fn is_repository(&self) -> bool {
        self.inner.is_repository()
    }

    fn current_branch(&self) -> Result<String> {
        self.current_branch
            .get_or_try_init(|| self.inner.current_branch())
            .cloned()
    }

    fn head_sha(&self) -> Result<String> {
        self.head_sha
            .get_or_try_init(|| self.inner.head_sha())
            .cloned()
    }

    fn head_short_sha(&self) -> Result<String> {
        self.head_short_sha
            .get_or_try_init(|| self.inner.head_short_sha())
            .cloned()
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        self.latest_tag
            .get_or_try_init(|| self.inner.latest_tag())
            .cloned()
    }

    fn tags_reachable_from_head(&self) -> Result<Vec<String>> {
        self.reachable_tags
            .get_or_try_init(|| self.inner.tags_reachable_from_head())
            .cloned()
    }

    fn commit_sha_for_tag(&self, tag: &str) -> Result<String> {
        memoize(&self.tag_shas, tag.to_string(), || {
            self.inner.commit_sha_for_tag(tag)
        })
    }

    fn all_remote_branches(&self) -> Result<Vec<String>> {
        self.remote_branches
            .get_or_try_init(|| self.inner.all_remote_branches())
            .cloned()
    }

    fn merge_base(&self, branch_a: &str, branch_b: &str) -> Result<Option<String>> {
        let key = (branch_a.to_string(), branch_b.to_string());
        memoize(&self.merge_bases, key, || {
            self.inner.merge_base(branch_a, branch_b)
        })
    }

    fn commit_history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        memoize(&self.histories, limit, || self.inner.commit_history(limit))
    }

    fn commits_since(&self, reference: Option<&str>) -> Result<Vec<String>> {
        memoize(&self.commits_since, reference.map(str::to_string), || {
            self.inner.commits_since(reference)
        })
    }

    fn commit_count_since(&self, reference: Option<&str>) -> Result<usize> {
        memoize(&self.counts_since, reference.map(str::to_string), || {
            self.inner.commit_count_since(reference)
        })
    }

    fn commit_date(&self) -> Result<String> {
        self.commit_date
            .get_or_try_init(|| self.inner.commit_date())
            .cloned()
    }
}
