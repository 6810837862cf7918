use super::{BaseVersion, Strategy, VersionContext};
use crate::boundary::EvidenceWarning;
use crate::error::Result;
use tracing::{debug, warn};

/// Runs enabled strategies in priority order and pools their candidates
#[derive(Debug, Clone)]
pub struct StrategyManager {
    order: Vec<Strategy>,
}

impl StrategyManager {
    /// Keep the enabled strategies, ordered by [Strategy::PRIORITY]
    pub fn new(enabled: &[Strategy]) -> Self {
        let order = Strategy::PRIORITY
            .into_iter()
            .filter(|strategy| enabled.contains(strategy))
            .collect();
        StrategyManager { order }
    }

    /// Strategies that will run, in execution order
    pub fn order(&self) -> &[Strategy] {
        &self.order
    }

    /// Collect every candidate.
    ///
    /// The first failing strategy aborts the run. Candidates anchored at ignored commits
    /// are dropped; if nothing remains the fallback candidate is used.
    pub fn base_versions(&self, ctx: &VersionContext<'_>) -> Result<Vec<BaseVersion>> {
        let mut pool = Vec::new();

        for strategy in &self.order {
            let candidates = strategy
                .base_versions(ctx)
                .map_err(|e| e.in_strategy(*strategy))?;
            debug!(strategy = %strategy, count = candidates.len(), "collected base versions");
            pool.extend(candidates);
        }

        pool.retain(|candidate| {
            let ignored = ctx.config.is_ignored(&candidate.source_commit);
            if ignored {
                let warning = EvidenceWarning::IgnoredCommit {
                    sha: candidate.source_commit.clone(),
                    source: candidate.source.clone(),
                };
                warn!("{}", warning);
            }
            !ignored
        });

        if pool.is_empty() {
            debug!("no base version evidence, using fallback");
            pool.extend(Strategy::Fallback.base_versions(ctx)?);
        }

        Ok(pool)
    }
}

/// Pick the candidate the engine builds on.
///
/// A configured next version is authoritative. Otherwise the greatest version wins;
/// among equal versions the earlier (higher priority) candidate is kept.
pub fn select_base_version(candidates: &[BaseVersion]) -> Option<&BaseVersion> {
    if let Some(configured) = candidates
        .iter()
        .find(|candidate| candidate.strategy == Strategy::ConfiguredNextVersion)
    {
        return Some(configured);
    }

    candidates.iter().fold(None, |best, candidate| match best {
        Some(current) if candidate.version <= current.version => Some(current),
        _ => Some(candidate),
    })
}
