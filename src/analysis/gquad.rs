//! G-quadruplex propensity check based on G4Hunter scoring.
//!
//! Every base gets a score: G runs score `+min(run, 4)` per base, C runs score
//! `-min(run, 4)`, anything else 0. Windows whose mean score reaches the threshold
//! in absolute value are hits; consecutive hits are merged and re-scored.

use itertools::Itertools;
use std::fmt;

const WINDOW: usize = 50;
const MIN_SCORE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GQuadResult {
    pub found: bool,
    pub scores: Vec<f64>,
}

impl fmt::Display for GQuadResult {
    /// Legacy encoding used by the candidate summary, e.g. `True[1.23, 2.5]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]",
            if self.found { "True" } else { "False" },
            self.scores.iter().map(|s| format!("{:?}", s)).join(", ")
        )
    }
}

pub fn base_scores(seq: &[u8]) -> Vec<i32> {
    let mut scores = Vec::with_capacity(seq.len());
    let mut i = 0;
    while i < seq.len() {
        let sign = match seq[i] {
            b'G' | b'g' => 1,
            b'C' | b'c' => -1,
            _ => {
                scores.push(0);
                i += 1;
                continue;
            }
        };
        let base = seq[i].to_ascii_uppercase();
        let run_len = seq[i..]
            .iter()
            .take_while(|b| b.to_ascii_uppercase() == base)
            .count();
        let score = sign * run_len.min(4) as i32;
        scores.extend(std::iter::repeat(score).take(run_len));
        i += run_len;
    }
    scores
}

fn window_means(scores: &[i32], window: usize) -> Vec<f64> {
    if scores.len() < window {
        return Vec::new();
    }
    scores
        .windows(window)
        .map(|w| w.iter().sum::<i32>() as f64 / window as f64)
        .collect()
}

fn mean_score(seq: &[u8]) -> f64 {
    let scores = base_scores(seq);
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<i32>() as f64 / scores.len() as f64
}

/// Rounds to two decimals from the exact binary value, ties to even.
///
/// Scaling by 100 first would move values such as 2.675 onto the tie.
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Scores merged runs of hit windows.
///
/// Adjacency is only tested up to the second to last hit; the final run always
/// extends one base past its last counted window.
fn merged_scores(seq: &[u8], means: &[f64], hits: &[usize], window: usize) -> Vec<f64> {
    let slice_score = |from: usize, to: usize| {
        let to = to.min(seq.len());
        round2(mean_score(&seq[from.min(to)..to])).abs()
    };

    if hits.len() == 1 {
        return vec![means[hits[0]].abs()];
    }

    let mut scores = Vec::new();
    let mut i = 0;
    let mut extra = 0;
    let mut run_start = hits[0];
    let mut prev = hits[0];
    let mut next = hits[1];
    while i + 2 < hits.len() {
        if next == prev + 1 {
            extra += 1;
            i += 1;
        } else {
            scores.push(slice_score(run_start, run_start + window + extra));
            extra = 0;
            i += 1;
            run_start = hits[i];
        }
        prev = hits[i];
        next = hits[i + 1];
    }
    scores.push(slice_score(run_start, run_start + window + extra + 1));
    scores
}

pub fn check(seq: &[u8]) -> GQuadResult {
    let means = window_means(&base_scores(seq), WINDOW);
    let hits: Vec<usize> = means
        .iter()
        .positions(|m| *m >= MIN_SCORE || *m <= -MIN_SCORE)
        .collect();
    if hits.is_empty() {
        return GQuadResult {
            found: false,
            scores: Vec::new(),
        };
    }
    let scores = merged_scores(seq, &means, &hits, WINDOW);
    GQuadResult {
        found: !scores.is_empty(),
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_scores_cap_runs_at_four() {
        assert_eq!(base_scores(b"GAGGTGGGACCCCCg"), vec![1, 0, 2, 2, 0, 3, 3, 3, 0, -4, -4, -4, -4, -4, 1]);
        assert_eq!(base_scores(b"NNcC"), vec![0, 0, -2, -2]);
    }

    #[test]
    fn sequence_without_g_runs_has_no_quadruplex() {
        let result = check(&b"ATATATATAT".repeat(20));
        assert_eq!(result, GQuadResult { found: false, scores: vec![] });
        assert_eq!(result.to_string(), "False[]");
    }

    #[test]
    fn short_sequence_has_no_windows() {
        assert!(!check(&b"GGGG".repeat(5)).found);
    }

    #[test]
    fn single_hit_reports_window_mean() {
        // exactly one window: all 50 bases score 4
        let result = check(&[b'G'; 50]);
        assert_eq!(result.scores, vec![4.0]);
        assert_eq!(result.to_string(), "True[4.0]");
    }

    #[test]
    fn consecutive_hits_merge_into_one_score() {
        let mut seq = b"AAAAA".to_vec();
        seq.extend([b'G'; 60]);
        seq.extend(b"TTTTTTTTTT");
        let result = check(&seq);
        assert!(result.found);
        assert_eq!(result.scores.len(), 1);
        assert!(result.scores[0] > 2.0);
    }

    #[test]
    fn scores_round_half_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(-0.125), -0.12);
        // 2.675 is stored just below the tie
        assert_eq!(round2(2.675), 2.67);
        assert_eq!(round2(2.3456), 2.35);
    }

    #[test]
    fn c_rich_windows_score_as_absolute_values() {
        let result = check(&[b'c'; 55]);
        assert!(result.found);
        assert!(result.scores.iter().all(|s| *s > 0.0));
    }
}
