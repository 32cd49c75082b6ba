use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    core::identity::{
        matcher::Matcher,
        types::{IdentityId, Template},
    },
    storage::IdentityStore,
    utils::{
        config::ResolutionConfig,
        error::{AttendanceError, Result},
        metrics::{Metrics, ScanOutcome},
    },
};

/// Acceptance policy applied to every probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionPolicy {
    pub min_template_len: usize,
    pub acceptance_threshold: f32,
}

impl From<&ResolutionConfig> for ResolutionPolicy {
    fn from(config: &ResolutionConfig) -> Self {
        Self {
            min_template_len: config.min_template_len,
            acceptance_threshold: config.acceptance_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub identity_id: IdentityId,
    pub display_name: String,
    pub score: f32,
}

/// Maps a probe template to an enrolled identity. Pure: never writes.
pub struct ResolutionService {
    store: Arc<dyn IdentityStore>,
    matcher: Arc<dyn Matcher>,
    policy: ResolutionPolicy,
    metrics: Arc<Metrics>,
}

impl ResolutionService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        matcher: Arc<dyn Matcher>,
        policy: ResolutionPolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { store, matcher, policy, metrics }
    }

    pub async fn resolve(&self, probe: Template) -> Result<Resolution> {
        if let Err(e) = probe.validate(self.policy.min_template_len) {
            self.metrics.record_scan(ScanOutcome::Malformed);
            return Err(e.into());
        }

        let candidates = self.store.candidates(&probe).await?;
        if candidates.is_empty() {
            debug!("No enrolled identities to match against");
            self.metrics.record_scan(ScanOutcome::Unmatched);
            return Err(AttendanceError::NoMatch);
        }

        // scoring is CPU bound; keep it off the async workers
        let matcher = self.matcher.clone();
        let (best, candidates) = tokio::task::spawn_blocking(move || {
            let best = matcher.best_match(&probe, &candidates);
            (best, candidates)
        })
        .await
        .map_err(|e| AttendanceError::Internal(format!("matcher task failed: {}", e)))?;

        let best = match best {
            Some(best) => best,
            None => {
                self.metrics.record_scan(ScanOutcome::Unmatched);
                return Err(AttendanceError::NoMatch);
            }
        };

        if best.score < self.policy.acceptance_threshold {
            debug!(
                score = best.score,
                threshold = self.policy.acceptance_threshold,
                "Best match below acceptance threshold"
            );
            self.metrics.record_scan(ScanOutcome::Unmatched);
            return Err(AttendanceError::NoMatch);
        }

        let display_name = match candidates.iter().find(|c| c.id == best.identity_id) {
            Some(identity) => identity.display_name.clone(),
            None => {
                warn!(identity = %best.identity_id, "Matcher returned an identity outside the candidate set");
                self.metrics.record_scan(ScanOutcome::Unmatched);
                return Err(AttendanceError::NoMatch);
            }
        };

        info!(
            identity = %best.identity_id,
            matcher = self.matcher.name(),
            score = best.score,
            "Probe resolved"
        );
        self.metrics.record_scan(ScanOutcome::Matched);

        Ok(Resolution {
            identity_id: best.identity_id,
            display_name,
            score: best.score,
        })
    }
}
