use crate::classifier::Candidate;
use crate::config::Config;

/// Fraction of a candidate's score that survives suppression at `rank`.
///
/// Ranks below `reject_amount` are zeroed, the boundary rank keeps the
/// fractional remainder, ranks at or past `reject_amount + 1` are untouched.
/// Kept as a pure function so the boundary arithmetic is testable on its own.
pub fn suppression_factor(rank: usize, reject_amount: f64) -> f64 {
    (rank as f64 - reject_amount).clamp(0.0, 1.0)
}

/// Reshape raw worker output for the current round, in place.
///
/// Banned labels are dropped first. Once the round has dragged past the
/// reject delay and the classifier is confident in something, the
/// highest-ranked non-target candidates are progressively suppressed, one
/// more label per `reject_time_per_label_ms` of overage; the target itself is
/// never suppressed, whatever its rank. The list is then re-sorted and
/// renormalized into a probability distribution.
pub fn shape(candidates: &mut Vec<Candidate>, elapsed_ms: u64, target: &str, cfg: &Config) {
    candidates.retain(|c| !cfg.banned_labels.iter().any(|b| b == &c.label));
    if candidates.is_empty() {
        return;
    }

    let overage = elapsed_ms as f64 - cfg.reject_delay_ms as f64;
    if overage > 0.0 && candidates[0].score > cfg.start_reject_score {
        let reject_amount = overage / cfg.reject_time_per_label_ms as f64;
        for (rank, candidate) in candidates.iter_mut().enumerate() {
            if candidate.label == target {
                continue;
            }
            candidate.score *= suppression_factor(rank, reject_amount);
        }
        candidates
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    }

    normalize(candidates);
}

/// Scale scores so they sum to 1. A non-positive sum (every candidate
/// suppressed, which the target exemption should make impossible) falls back
/// to the uniform distribution instead of dividing by zero.
pub fn normalize(candidates: &mut [Candidate]) {
    if candidates.is_empty() {
        return;
    }
    let sum: f64 = candidates.iter().map(|c| c.score).sum();
    if sum > f64::EPSILON {
        for c in candidates.iter_mut() {
            c.score /= sum;
        }
    } else {
        let uniform = 1.0 / candidates.len() as f64;
        for c in candidates.iter_mut() {
            c.score = uniform;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(label: &str, score: f64) -> Candidate {
        Candidate {
            label: label.to_string(),
            score,
        }
    }

    fn test_config() -> Config {
        Config {
            reject_delay_ms: 5_000,
            reject_time_per_label_ms: 1_500,
            start_reject_score: 0.5,
            banned_labels: vec!["zigzag".to_string()],
            ..Config::default()
        }
    }

    fn score_sum(candidates: &[Candidate]) -> f64 {
        candidates.iter().map(|c| c.score).sum()
    }

    #[test]
    fn test_suppression_factor_zeroes_ranks_below_amount() {
        assert_eq!(suppression_factor(0, 2.5), 0.0);
        assert_eq!(suppression_factor(1, 2.5), 0.0);
        assert_eq!(suppression_factor(2, 2.5), 0.0);
    }

    #[test]
    fn test_suppression_factor_is_fractional_at_the_boundary() {
        assert_eq!(suppression_factor(3, 2.5), 0.5);
        assert_eq!(suppression_factor(2, 1.25), 0.75);
    }

    #[test]
    fn test_suppression_factor_leaves_deep_ranks_alone() {
        assert_eq!(suppression_factor(4, 2.5), 1.0);
        assert_eq!(suppression_factor(100, 2.5), 1.0);
    }

    #[test]
    fn test_suppression_factor_integer_amount_zeroes_its_own_rank() {
        assert_eq!(suppression_factor(2, 2.0), 0.0);
        assert_eq!(suppression_factor(3, 2.0), 1.0);
    }

    #[test]
    fn test_banned_labels_are_filtered() {
        let cfg = test_config();
        let mut out = vec![candidate("zigzag", 0.6), candidate("cat", 0.4)];
        shape(&mut out, 0, "cat", &cfg);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "cat");
        assert!((out[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_banned_yields_empty_output() {
        let cfg = test_config();
        let mut out = vec![candidate("zigzag", 1.0)];
        shape(&mut out, 60_000, "cat", &cfg);
        assert!(out.is_empty());
    }

    #[test]
    fn test_no_suppression_before_the_delay() {
        let cfg = test_config();
        let mut out = vec![
            candidate("dog", 0.6),
            candidate("cat", 0.3),
            candidate("fish", 0.1),
        ];
        shape(&mut out, 0, "cat", &cfg);
        // order untouched, scores only renormalized (already sum to 1)
        let labels: Vec<&str> = out.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["dog", "cat", "fish"]);
        assert!((out[0].score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_no_suppression_when_top_score_is_weak() {
        let cfg = test_config();
        let mut out = vec![candidate("dog", 0.4), candidate("cat", 0.35)];
        shape(&mut out, 60_000, "cat", &cfg);
        let labels: Vec<&str> = out.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["dog", "cat"]);
        assert!(out[0].score > out[1].score);
    }

    #[test]
    fn test_target_is_exempt_and_rises_under_heavy_suppression() {
        let cfg = test_config();
        // overage 15000 -> reject_amount 10, everything non-target zeroed
        let mut out = vec![
            candidate("dog", 0.9),
            candidate("fish", 0.05),
            candidate("cat", 0.05),
        ];
        shape(&mut out, 20_000, "cat", &cfg);
        assert_eq!(out[0].label, "cat");
        assert!((out[0].score - 1.0).abs() < 1e-9);
        assert!((score_sum(&out) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_rank_is_partially_suppressed() {
        let cfg = test_config();
        // overage 2250 -> reject_amount 1.5: rank 0 zeroed, rank 1 zeroed,
        // rank 2 scaled by 0.5, rank 3 untouched
        let mut out = vec![
            candidate("dog", 0.55),
            candidate("fish", 0.25),
            candidate("bird", 0.15),
            candidate("cat", 0.05),
        ];
        shape(&mut out, 7_250, "cat", &cfg);
        assert_eq!(out[0].label, "bird");
        assert!((out[0].score - 0.6).abs() < 1e-9);
        assert_eq!(out[1].label, "cat");
        assert!((out[1].score - 0.4).abs() < 1e-9);
        assert!((score_sum(&out) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_score_never_drops_below_its_raw_value() {
        let cfg = test_config();
        let raw_target = 0.05;
        let mut out = vec![
            candidate("dog", 0.9),
            candidate("fish", 0.05),
            candidate("cat", raw_target),
        ];
        shape(&mut out, 12_000, "cat", &cfg);
        let shaped = out.iter().find(|c| c.label == "cat").unwrap();
        assert!(shaped.score >= raw_target);
    }

    #[test]
    fn test_shaped_output_always_sums_to_one() {
        let cfg = test_config();
        for elapsed in [0u64, 5_000, 7_250, 20_000, 120_000] {
            let mut out = vec![
                candidate("dog", 0.7),
                candidate("fish", 0.2),
                candidate("cat", 0.1),
            ];
            shape(&mut out, elapsed, "cat", &cfg);
            assert!(
                (score_sum(&out) - 1.0).abs() < 1e-9,
                "sum != 1 at elapsed {elapsed}"
            );
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut out = vec![candidate("dog", 0.25), candidate("cat", 0.75)];
        normalize(&mut out);
        let snapshot = out.clone();
        normalize(&mut out);
        assert_eq!(out, snapshot);
    }

    #[test]
    fn test_zero_sum_falls_back_to_uniform() {
        let mut out = vec![
            candidate("dog", 0.0),
            candidate("fish", 0.0),
            candidate("cat", 0.0),
        ];
        normalize(&mut out);
        for c in &out {
            assert!((c.score - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_empty_is_a_no_op() {
        let mut out: Vec<Candidate> = Vec::new();
        normalize(&mut out);
        assert!(out.is_empty());
    }
}
