//! Confidence-weighted candidates and the fusion rule.
//!
//! Every heuristic contributes evidence as a [`Candidate`]; nothing ever
//! stores a "winner". The accepted value of an attribute is derived on read
//! by [`fuse`]: candidates are grouped by value, each group's confidences are
//! averaged, and the group with the highest average wins.
//!
//! Ties are broken by input order: the group whose value was encountered
//! first keeps its place unless a later group is strictly better.

use serde::{Deserialize, Serialize};

/// A proposed value with a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate<T> {
    pub value: T,
    pub confidence: f64,
}

impl<T> Candidate<T> {
    /// Create a candidate, clamping the confidence into `[0, 1]`.
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Clamp a confidence into `[0, 1]`. NaN becomes 0.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Fuse candidates into the single accepted value.
///
/// Returns the winning value together with its group's mean confidence, or
/// `None` for an empty slice.
pub fn fuse<T: PartialEq + Clone>(candidates: &[Candidate<T>]) -> Option<Candidate<T>> {
    fuse_by(candidates, |a, b| a == b)
}

/// Fuse candidates using a custom value equivalence.
///
/// Used where two values should count as the same evidence without being
/// structurally equal (e.g. key column sets compared as sets).
pub fn fuse_by<T, F>(candidates: &[Candidate<T>], same: F) -> Option<Candidate<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    // (representative index, sum, count) in first-encountered order
    let mut groups: Vec<(usize, f64, usize)> = Vec::new();

    for (idx, candidate) in candidates.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|(rep, _, _)| same(&candidates[*rep].value, &candidate.value))
        {
            Some(group) => {
                group.1 += candidate.confidence;
                group.2 += 1;
            }
            None => groups.push((idx, candidate.confidence, 1)),
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for (rep, sum, count) in groups {
        let mean = sum / count as f64;
        match best {
            Some((_, best_mean)) if mean <= best_mean => {}
            _ => best = Some((rep, mean)),
        }
    }

    best.map(|(rep, mean)| Candidate {
        value: candidates[rep].value.clone(),
        confidence: mean,
    })
}

/// Arithmetic mean of a set of confidences; `None` when empty.
pub fn mean_confidence<I: IntoIterator<Item = f64>>(confidences: I) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for c in confidences {
        sum += c;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}
