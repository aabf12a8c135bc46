//! Pattern Analyzer
//!
//! Sampling scan that reports repeated byte sequences. The result is
//! statistics only; it never changes what the formula stage emits.

use std::collections::HashMap;

/// Shortest candidate length considered
pub const MIN_PATTERN_LEN: usize = 4;

/// Longest candidate length considered
pub const MAX_PATTERN_LEN: usize = 32;

/// Distinct candidates tracked during one scan
pub const MAX_TRACKED: usize = 256;

/// Patterns reported after filtering
pub const MAX_REPORTED: usize = 64;

/// Target number of sampled offsets per candidate length
const SAMPLE_TARGET: usize = 10_000;

/// A repeated byte sequence found by the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// The repeated bytes
    pub bytes: Vec<u8>,
    /// Number of sampled occurrences
    pub count: u32,
    /// Estimated savings: `length * 2 - 2`
    pub savings: usize,
}

impl Pattern {
    /// Length of the repeated sequence
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of one analyzer pass
#[derive(Debug, Clone, Default)]
pub struct PatternAnalysis {
    /// Reported patterns, savings descending, at most `MAX_REPORTED`
    pub patterns: Vec<Pattern>,
    /// Distinct candidates held in the table when the scan finished
    pub tracked: usize,
    /// Stride used between sampled offsets
    pub sample_step: usize,
}

impl PatternAnalysis {
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

/// Bounded, sampling pattern detector
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternAnalyzer;

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Scan `data` and report the most valuable repeated sequences.
    ///
    /// Offsets are sampled every `max(1, len / 10000)` bytes for each
    /// candidate length in `[4, 32]` stepping by 2. Once 256 distinct
    /// candidates are held, unseen sequences are dropped while known ones
    /// keep counting.
    pub fn analyze(&self, data: &[u8]) -> PatternAnalysis {
        let step = (data.len() / SAMPLE_TARGET).max(1);

        // Insertion-ordered table: index by key, stats in a Vec
        let mut index: HashMap<&[u8], usize> = HashMap::with_capacity(MAX_TRACKED);
        let mut table: Vec<(&[u8], u32)> = Vec::with_capacity(MAX_TRACKED);

        for pattern_len in (MIN_PATTERN_LEN..=MAX_PATTERN_LEN).step_by(2) {
            if data.len() <= pattern_len {
                break;
            }
            let last_start = data.len() - pattern_len;

            for start in (0..last_start).step_by(step) {
                let key = &data[start..start + pattern_len];
                if let Some(&slot) = index.get(key) {
                    table[slot].1 += 1;
                } else if table.len() < MAX_TRACKED {
                    index.insert(key, table.len());
                    table.push((key, 1));
                }
            }
        }

        let tracked = table.len();

        let mut patterns: Vec<Pattern> = table
            .into_iter()
            .map(|(key, count)| Pattern {
                bytes: key.to_vec(),
                count,
                savings: key.len() * 2 - 2,
            })
            .filter(|p| p.count > 1 && p.savings > 5)
            .collect();

        // Stable sort keeps first-seen order among equal savings
        patterns.sort_by(|a, b| b.savings.cmp(&a.savings));
        patterns.truncate(MAX_REPORTED);

        PatternAnalysis {
            patterns,
            tracked,
            sample_step: step,
        }
    }
}
