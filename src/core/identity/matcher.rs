// src/core/identity/matcher.rs
use std::sync::Arc;

use super::types::{Identity, IdentityId, Template};
use crate::utils::error::{AttendanceError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub identity_id: IdentityId,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}

/// Scores probe templates against enrolled references.
///
/// Implementors only need `score`; the provided `best_match` applies the
/// tie-break (equal top scores resolve to the lowest identity id). An
/// implementation backed by an index may override `best_match` but must
/// keep that tie-break.
#[cfg_attr(test, mockall::automock)]
pub trait Matcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Similarity of `probe` to `reference`, or `None` if they cannot be
    /// compared.
    fn score(&self, probe: &Template, reference: &Template) -> Option<f32>;

    fn best_match(&self, probe: &Template, candidates: &[Identity]) -> Option<MatchScore> {
        select_best(candidates.iter().filter_map(|candidate| {
            self.score(probe, &candidate.template).map(|score| MatchScore {
                identity_id: candidate.id,
                score,
            })
        }))
    }
}

/// Highest score wins; equal scores resolve to the lowest identity id.
/// Non-finite scores are discarded.
pub fn select_best<I>(scores: I) -> Option<MatchScore>
where
    I: IntoIterator<Item = MatchScore>,
{
    scores
        .into_iter()
        .filter(|candidate| candidate.score.is_finite())
        .fold(None, |best: Option<MatchScore>, candidate| match best {
            None => Some(candidate),
            Some(current) => {
                let better = candidate.score > current.score
                    || (candidate.score == current.score
                        && candidate.identity_id < current.identity_id);
                Some(if better { candidate } else { current })
            }
        })
}

/// Compares the overlapping prefix of both templates and scales by the
/// length ratio so truncated samples score lower.
fn overlap(probe: &Template, reference: &Template) -> Option<(usize, f32)> {
    let shorter = probe.len().min(reference.len());
    let longer = probe.len().max(reference.len());
    if shorter == 0 {
        return None;
    }
    Some((shorter, shorter as f32 / longer as f32))
}

/// Cosine similarity, negative correlation clamped to zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosineMatcher;

impl Matcher for CosineMatcher {
    fn name(&self) -> &'static str {
        "cosine"
    }

    fn score(&self, probe: &Template, reference: &Template) -> Option<f32> {
        let (len, length_ratio) = overlap(probe, reference)?;
        let a = &probe.features()[..len];
        let b = &reference.features()[..len];

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (&x, &y) in a.iter().zip(b.iter()) {
            dot += x as f64 * y as f64;
            norm_a += x as f64 * x as f64;
            norm_b += y as f64 * y as f64;
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return None;
        }

        let cosine = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0) as f32;
        Some(cosine * length_ratio)
    }
}

/// `1 / (1 + rms distance)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EuclideanMatcher;

impl Matcher for EuclideanMatcher {
    fn name(&self) -> &'static str {
        "euclidean"
    }

    fn score(&self, probe: &Template, reference: &Template) -> Option<f32> {
        let (len, length_ratio) = overlap(probe, reference)?;
        let sum: f64 = probe.features()[..len]
            .iter()
            .zip(reference.features()[..len].iter())
            .map(|(&a, &b)| {
                let diff = a as f64 - b as f64;
                diff * diff
            })
            .sum();
        let rms = (sum / len as f64).sqrt();

        Some((1.0 / (1.0 + rms)) as f32 * length_ratio)
    }
}

pub fn matcher_from_name(name: &str) -> Result<Arc<dyn Matcher>> {
    match name {
        "cosine" => Ok(Arc::new(CosineMatcher)),
        "euclidean" => Ok(Arc::new(EuclideanMatcher)),
        other => Err(AttendanceError::Config(format!("Unknown matcher '{}'", other))),
    }
}
