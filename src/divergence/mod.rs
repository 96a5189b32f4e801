//! Divergence metrics between a target constraint vector and an
//! observed aggregate.
//!
//! Every metric maps a pair of equal-length non-negative vectors to a
//! non-negative scalar where 0 means element-wise equality (up to the
//! stabiliser [`EPSILON`]). Lower is better; the annealer minimizes the
//! selected metric.
//!
//! # References
//!
//! - Kullback & Leibler (1951), "On Information and Sufficiency"
//! - Lin (1991), "Divergence Measures Based on the Shannon Entropy"

use serde::{Deserialize, Serialize};

/// Additive stabiliser preventing log-of-zero, divide-by-zero, and
/// vanishing denominators across all metrics.
pub const EPSILON: f64 = 1e-10;

/// Divergence metric, selected by kebab-case name from configuration.
///
/// # Examples
///
/// ```
/// use synthpop::divergence::DivergenceKind;
///
/// let kind = DivergenceKind::parse("chi-squared").unwrap();
/// assert_eq!(kind, DivergenceKind::ChiSquared);
/// assert!(kind.evaluate(&[1.0, 2.0], &[1.0, 2.0]) < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DivergenceKind {
    /// Generalized Kullback-Leibler divergence over unnormalised
    /// vectors. Asymmetric; zero iff the vectors agree element-wise.
    KlDivergence,

    /// Chi-squared statistic, relative penalty scaled by the target.
    ChiSquared,

    /// Euclidean (L2) distance.
    Euclidean,

    /// Euclidean distance over per-index relative errors. Violating a
    /// zero-target index costs a 1000x penalty, turning zero
    /// constraints effectively hard.
    NormalizedEuclidean,

    /// Manhattan (L1) distance.
    Manhattan,

    /// Cosine distance `1 - cos(target, observed)`; compares shape,
    /// not magnitude.
    Cosine,

    /// Jensen-Shannon divergence: symmetrised, smoothed KL against the
    /// mean distribution.
    JensenShannon,
}

impl DivergenceKind {
    /// All metrics, in configuration-name order.
    pub const ALL: [DivergenceKind; 7] = [
        DivergenceKind::KlDivergence,
        DivergenceKind::ChiSquared,
        DivergenceKind::Euclidean,
        DivergenceKind::NormalizedEuclidean,
        DivergenceKind::Manhattan,
        DivergenceKind::Cosine,
        DivergenceKind::JensenShannon,
    ];

    /// The configuration name of this metric.
    pub fn name(&self) -> &'static str {
        match self {
            DivergenceKind::KlDivergence => "kl-divergence",
            DivergenceKind::ChiSquared => "chi-squared",
            DivergenceKind::Euclidean => "euclidean",
            DivergenceKind::NormalizedEuclidean => "normalized-euclidean",
            DivergenceKind::Manhattan => "manhattan",
            DivergenceKind::Cosine => "cosine",
            DivergenceKind::JensenShannon => "jensen-shannon",
        }
    }

    /// Looks a metric up by its configuration name.
    ///
    /// Returns `None` for unrecognised names; callers surface that as
    /// a configuration error before any annealing starts.
    pub fn parse(name: &str) -> Option<DivergenceKind> {
        DivergenceKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Evaluates the divergence between the target constraints and an
    /// observed aggregate.
    ///
    /// Both slices must have the same length.
    pub fn evaluate(&self, target: &[f64], observed: &[f64]) -> f64 {
        debug_assert_eq!(target.len(), observed.len());
        match self {
            DivergenceKind::KlDivergence => kl_divergence(target, observed),
            DivergenceKind::ChiSquared => chi_squared(target, observed),
            DivergenceKind::Euclidean => euclidean(target, observed),
            DivergenceKind::NormalizedEuclidean => normalized_euclidean(target, observed),
            DivergenceKind::Manhattan => manhattan(target, observed),
            DivergenceKind::Cosine => cosine(target, observed),
            DivergenceKind::JensenShannon => jensen_shannon(target, observed),
        }
    }
}

impl std::fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn kl_divergence(target: &[f64], observed: &[f64]) -> f64 {
    let mut divergence = 0.0;
    for (&t, &o) in target.iter().zip(observed) {
        let p = t + EPSILON;
        let q = o + EPSILON;
        // Generalized KL: the q - p correction keeps every per-index
        // term non-negative for unnormalised vectors, where the plain
        // p ln(p/q) form dips negative as soon as q exceeds p.
        divergence += p * (p / q).ln() - p + q;
    }
    divergence
}

fn chi_squared(target: &[f64], observed: &[f64]) -> f64 {
    let mut distance = 0.0;
    for (&t, &o) in target.iter().zip(observed) {
        let expected = t + EPSILON;
        let diff = (o + EPSILON) - expected;
        distance += diff * diff / expected;
    }
    distance
}

fn euclidean(target: &[f64], observed: &[f64]) -> f64 {
    let mut distance = 0.0;
    for (&t, &o) in target.iter().zip(observed) {
        let diff = o - t;
        distance += diff * diff;
    }
    distance.sqrt()
}

fn normalized_euclidean(target: &[f64], observed: &[f64]) -> f64 {
    let mut distance = 0.0;
    for (&t, &o) in target.iter().zip(observed) {
        if t.abs() < EPSILON {
            // Hard zero-constraint: any observed mass costs 1000x.
            if o.abs() > EPSILON {
                distance += 1000.0 * o * o;
            }
            continue;
        }
        let diff = (o - t) / t;
        distance += diff * diff;
    }
    distance.sqrt()
}

fn manhattan(target: &[f64], observed: &[f64]) -> f64 {
    target
        .iter()
        .zip(observed)
        .map(|(&t, &o)| (o - t).abs())
        .sum()
}

fn cosine(target: &[f64], observed: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_t = 0.0;
    let mut norm_o = 0.0;
    for (&t, &o) in target.iter().zip(observed) {
        dot += t * o;
        norm_t += t * t;
        norm_o += o * o;
    }
    let norm_t = norm_t.sqrt();
    let norm_o = norm_o.sqrt();
    if norm_t * norm_o < EPSILON {
        // Two zero vectors agree perfectly; a lone zero vector has no
        // direction to compare and counts as maximally distant.
        return if norm_t < EPSILON && norm_o < EPSILON {
            0.0
        } else {
            1.0
        };
    }
    1.0 - dot / (norm_t * norm_o)
}

fn jensen_shannon(target: &[f64], observed: &[f64]) -> f64 {
    let mut divergence = 0.0;
    for (&t, &o) in target.iter().zip(observed) {
        let p = t + EPSILON;
        let q = o + EPSILON;
        let m = 0.5 * (p + q);
        divergence += 0.5 * p * (p / m).ln() + 0.5 * q * (q / m).ln();
    }
    divergence
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn parse_accepts_every_configuration_name() {
        for kind in DivergenceKind::ALL {
            assert_eq!(DivergenceKind::parse(kind.name()), Some(kind));
        }
    }

    #[test]
    fn parse_rejects_unknown_names() {
        assert_eq!(DivergenceKind::parse("euclidian"), None);
        assert_eq!(DivergenceKind::parse("KL_DIVERGENCE"), None);
        assert_eq!(DivergenceKind::parse(""), None);
    }

    #[test]
    fn serde_uses_configuration_names() {
        let json = serde_json::to_string(&DivergenceKind::NormalizedEuclidean).unwrap();
        assert_eq!(json, "\"normalized-euclidean\"");

        let kind: DivergenceKind = serde_json::from_str("\"jensen-shannon\"").unwrap();
        assert_eq!(kind, DivergenceKind::JensenShannon);

        assert!(serde_json::from_str::<DivergenceKind>("\"mahalanobis\"").is_err());
    }

    #[test]
    fn euclidean_matches_hand_computation() {
        let d = DivergenceKind::Euclidean.evaluate(&[1.0, 2.0], &[4.0, 6.0]);
        assert_relative_eq!(d, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn manhattan_matches_hand_computation() {
        let d = DivergenceKind::Manhattan.evaluate(&[1.0, 2.0, 3.0], &[2.0, 0.0, 3.5]);
        assert_relative_eq!(d, 3.5, epsilon = 1e-12);
    }

    #[test]
    fn chi_squared_scales_by_target() {
        // (10-12)^2/10 = 0.4, up to the stabiliser
        let d = DivergenceKind::ChiSquared.evaluate(&[10.0], &[12.0]);
        assert_relative_eq!(d, 0.4, epsilon = 1e-6);
    }

    #[test]
    fn normalized_euclidean_penalises_zero_violations() {
        let clean = DivergenceKind::NormalizedEuclidean.evaluate(&[0.0, 5.0], &[0.0, 5.0]);
        assert!(clean < 1e-6);

        // Mass on a zero-target index dominates any relative error.
        let violated = DivergenceKind::NormalizedEuclidean.evaluate(&[0.0, 5.0], &[2.0, 5.0]);
        assert!(violated > (1000.0f64 * 4.0).sqrt() - 1e-6);
    }

    #[test]
    fn kl_divergence_is_asymmetric() {
        // KL(a||b) = 3 ln 2 - 1 ~ 1.0794 while KL(b||a) = 1 exactly.
        let a = [4.0, 1.0];
        let b = [2.0, 2.0];
        let ab = DivergenceKind::KlDivergence.evaluate(&a, &b);
        let ba = DivergenceKind::KlDivergence.evaluate(&b, &a);
        assert_relative_eq!(ab, 3.0 * 2.0f64.ln() - 1.0, epsilon = 1e-6);
        assert_relative_eq!(ba, 1.0, epsilon = 1e-6);
        assert!((ab - ba).abs() > 1e-2);
    }

    #[test]
    fn kl_divergence_stays_non_negative_with_excess_observed_mass() {
        // The plain p ln(p/q) form would give ~-2.30 here.
        let d = DivergenceKind::KlDivergence.evaluate(&[1.0], &[10.0]);
        assert!(d > 0.0);
        assert_relative_eq!(d, 9.0 - 10.0f64.ln(), epsilon = 1e-6);
    }

    #[test]
    fn cosine_ignores_magnitude() {
        let d = DivergenceKind::Cosine.evaluate(&[1.0, 2.0], &[10.0, 20.0]);
        assert!(d < 1e-6);

        let orthogonal = DivergenceKind::Cosine.evaluate(&[1.0, 0.0], &[0.0, 1.0]);
        assert_relative_eq!(orthogonal, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        let both_zero = DivergenceKind::Cosine.evaluate(&[0.0, 0.0], &[0.0, 0.0]);
        assert_eq!(both_zero, 0.0);

        let one_zero = DivergenceKind::Cosine.evaluate(&[0.0, 0.0], &[1.0, 2.0]);
        assert_eq!(one_zero, 1.0);
    }

    #[test]
    fn jensen_shannon_is_symmetric() {
        let a = [4.0, 1.0, 0.5];
        let b = [1.0, 2.0, 3.0];
        let ab = DivergenceKind::JensenShannon.evaluate(&a, &b);
        let ba = DivergenceKind::JensenShannon.evaluate(&b, &a);
        assert_relative_eq!(ab, ba, epsilon = 1e-12);
    }

    fn vectors() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        (1usize..12).prop_flat_map(|len| {
            (
                prop::collection::vec(0.0f64..1000.0, len),
                prop::collection::vec(0.0f64..1000.0, len),
            )
        })
    }

    proptest! {
        #[test]
        fn identical_vectors_score_near_zero((v, _) in vectors()) {
            for kind in DivergenceKind::ALL {
                let d = kind.evaluate(&v, &v);
                prop_assert!(d.abs() < 1e-6, "{kind} on identical vectors gave {d}");
            }
        }

        #[test]
        fn symmetric_metrics_are_symmetric((a, b) in vectors()) {
            for kind in [DivergenceKind::Euclidean, DivergenceKind::Manhattan, DivergenceKind::JensenShannon] {
                let ab = kind.evaluate(&a, &b);
                let ba = kind.evaluate(&b, &a);
                prop_assert!((ab - ba).abs() < 1e-9, "{kind}: {ab} vs {ba}");
            }
        }

        #[test]
        fn metrics_are_non_negative((a, b) in vectors()) {
            for kind in DivergenceKind::ALL {
                let d = kind.evaluate(&a, &b);
                prop_assert!(d >= -1e-12, "{kind} gave {d}");
            }
        }

        #[test]
        fn metrics_are_finite((a, b) in vectors()) {
            for kind in DivergenceKind::ALL {
                prop_assert!(kind.evaluate(&a, &b).is_finite());
            }
        }
    }
}
