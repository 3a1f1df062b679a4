// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line extraction: accumulator thresholding, greedy clustering, and the
// threshold relaxation schedule that drives retries.

use super::trig::ANGLE_BUCKETS;
use super::votes::Votes;

/// A Hough line: distance bin, angle bucket, and vote mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub bin: usize,
    pub angle: u8,
    pub strength: f32,
}

/// Circular distance between two angle buckets.
pub fn angle_distance(a: u8, b: u8) -> u8 {
    let d = a.abs_diff(b);
    d.min((ANGLE_BUCKETS - d as usize) as u8)
}

/// Clustering radii derived from the accumulator size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRadius {
    pub bins: usize,
    pub angles: u8,
}

impl MatchRadius {
    pub fn new(num_bins: usize, ratio: f32) -> Self {
        Self {
            bins: (num_bins as f32 * ratio).ceil() as usize,
            angles: (ANGLE_BUCKETS as f32 * ratio).ceil().min(128.0) as u8,
        }
    }

    fn matches(&self, a: &Line, b: &Line) -> bool {
        a.bin.abs_diff(b.bin) <= self.bins && angle_distance(a.angle, b.angle) <= self.angles
    }
}

/// Sort strongest first.
fn rank(lines: &mut [Line]) {
    lines.sort_by(|a, b| b.strength.total_cmp(&a.strength));
}

/// Every accumulator cell strictly above `threshold`, strongest first.
pub fn candidates(votes: &Votes<'_>, threshold: f32) -> Vec<Line> {
    let mut lines: Vec<Line> = votes
        .accumulator
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > threshold)
        .map(|(idx, &strength)| Line {
            bin: idx / ANGLE_BUCKETS,
            angle: (idx % ANGLE_BUCKETS) as u8,
            strength,
        })
        .collect();
    rank(&mut lines);
    lines
}

/// Greedy clustering of strength-ranked lines.
///
/// Each surviving line absorbs every weaker line within `radius`, adding the
/// absorbed strength to its own. The survivor keeps its own bin and angle.
/// Absorbed entries are flagged and compacted once at the end.
pub fn cluster(mut lines: Vec<Line>, radius: MatchRadius) -> Vec<Line> {
    let mut absorbed = vec![false; lines.len()];
    for i in 0..lines.len() {
        if absorbed[i] {
            continue;
        }
        let mut gained = 0.0f32;
        for j in i + 1..lines.len() {
            if !absorbed[j] && radius.matches(&lines[i], &lines[j]) {
                absorbed[j] = true;
                gained += lines[j].strength;
            }
        }
        lines[i].strength += gained;
    }
    let mut flags = absorbed.into_iter();
    lines.retain(|_| !flags.next().unwrap_or(true));
    rank(&mut lines);
    lines
}

/// Threshold, cluster, and rank the lines of one attempt.
pub fn extract(votes: &Votes<'_>, threshold: f32, match_ratio: f32) -> Vec<Line> {
    let radius = MatchRadius::new(votes.geometry.num_bins, match_ratio);
    cluster(candidates(votes, threshold), radius)
}

/// One step of the relaxation schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    /// Zero-based attempt number.
    pub index: usize,
    pub threshold: f32,
}

/// Threshold schedule: starts at a fraction of the strongest cell and halves
/// after every attempt, for at most `max_attempts` attempts.
#[derive(Debug, Clone)]
pub enum ThresholdSchedule {
    Pending { next: Attempt, remaining: usize },
    Exhausted,
}

impl ThresholdSchedule {
    pub fn new(max_vote: f32, ratio: f32, max_attempts: usize) -> Self {
        if max_attempts == 0 {
            return Self::Exhausted;
        }
        Self::Pending {
            next: Attempt {
                index: 0,
                threshold: max_vote * ratio,
            },
            remaining: max_attempts,
        }
    }

    /// Make the attempt just handed out the last one. Used when the line cap
    /// truncated the result, since lower thresholds only add more lines.
    pub fn finish(&mut self) {
        *self = Self::Exhausted;
    }
}

impl Iterator for ThresholdSchedule {
    type Item = Attempt;

    fn next(&mut self) -> Option<Attempt> {
        match *self {
            Self::Exhausted => None,
            Self::Pending { next, remaining } => {
                *self = if remaining > 1 {
                    Self::Pending {
                        next: Attempt {
                            index: next.index + 1,
                            threshold: next.threshold * 0.5,
                        },
                        remaining: remaining - 1,
                    }
                } else {
                    Self::Exhausted
                };
                Some(next)
            }
        }
    }
}
