//! Monte Carlo distribution auditing of generation strategies.
//!
//! For every seed in a range, run the strategy under test, validate the
//! result, and count each realized (giver, receiver) pairing. A uniform
//! strategy gives every receiver to every giver with probability
//! 1/(n−1); the headline metric is the maximum absolute deviation of the
//! observed percentages from that expectation, which is what separates
//! the documented-biased strategies from the accepted one.
//!
//! Trials are fully independent: each one is seeded from scratch, and no
//! stream state carries over. That independence is also what makes the
//! parallel path valid — workers tally disjoint seed sub-ranges into
//! partial tables that are summed afterwards, and the sum is
//! order-independent.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::strategy::StrategyKind;

/// Per-giver, per-receiver trial counts. Ordered for stable rendering.
pub type PairingCounts = BTreeMap<String, BTreeMap<String, u64>>;

// =============================================================================
// Report types
// =============================================================================

/// Observed statistics for one ordered (giver, receiver) pairing.
#[derive(Debug, Clone, Serialize)]
pub struct PairingStat {
    /// Giver id.
    pub giver: String,
    /// Receiver id.
    pub receiver: String,
    /// Trials in which this pairing was realized.
    pub count: u64,
    /// Observed percentage, 100 × count / trials.
    pub percent: f64,
    /// Absolute deviation from the uniform expectation.
    pub deviation: f64,
}

/// Outcome of auditing one strategy over a seed range.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Strategy under test.
    pub strategy: StrategyKind,
    /// Participant count n.
    pub family_count: usize,
    /// Number of trials (seeds) run.
    pub trials: u64,
    /// Uniform expectation per pairing: 100 / (n − 1).
    pub expected_percent: f64,
    /// Headline fitness metric: max absolute deviation across all pairs.
    pub max_deviation: f64,
    /// Wall-clock time spent generating and tallying.
    pub elapsed_secs: f64,
    /// All ordered pairings with their observed statistics.
    pub pairings: Vec<PairingStat>,
}

impl AuditReport {
    /// Render the full per-pairing table as plain text.
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "strategy {} ({}): {} families, {} trials",
            self.strategy,
            self.strategy.bias_note(),
            self.family_count,
            self.trials
        );
        let _ = writeln!(out, "expected per pairing: {:.2}%", self.expected_percent);

        let mut current_giver = "";
        for stat in &self.pairings {
            if stat.giver != current_giver {
                current_giver = &stat.giver;
                let _ = writeln!(out, "\n{current_giver} gives to:");
            }
            let _ = writeln!(
                out,
                "  {}: {} ({:.2}%, deviation {:.2})",
                stat.receiver, stat.count, stat.percent, stat.deviation
            );
        }

        let _ = writeln!(
            out,
            "\nmax deviation: {:.2}% (elapsed {:.3}s)",
            self.max_deviation, self.elapsed_secs
        );
        out
    }
}

// =============================================================================
// Auditing
// =============================================================================

/// Audit `strategy` over every seed in `seeds`, single-threaded.
///
/// # Errors
///
/// [`Error::UnsatisfiableRoster`] for rosters below two participants;
/// [`Error::InvalidAssignment`] the moment any trial fails validation —
/// a validation failure is a defect in the strategy under test, never
/// swallowed.
pub fn audit<S: AsRef<str>>(
    ids: &[S],
    strategy: StrategyKind,
    seeds: Range<u64>,
) -> Result<AuditReport> {
    let ids = canonical_ids(ids)?;
    let started = Instant::now();
    let counts = tally(&ids, strategy, seeds.clone())?;
    let trials = seeds.end.saturating_sub(seeds.start);
    Ok(build_report(
        strategy,
        &ids,
        trials,
        counts,
        started.elapsed().as_secs_f64(),
    ))
}

/// Audit `strategy` with the seed range split across `workers` threads.
///
/// Each worker tallies a contiguous sub-range into its own partial table;
/// the partials are summed after all workers join. Identical results to
/// [`audit`] for the same seed range, since trials are independent and
/// the merge is commutative.
///
/// # Errors
///
/// Same conditions as [`audit`].
pub fn audit_parallel<S: AsRef<str>>(
    ids: &[S],
    strategy: StrategyKind,
    seeds: Range<u64>,
    workers: NonZeroUsize,
) -> Result<AuditReport> {
    let ids = canonical_ids(ids)?;
    let trials = seeds.end.saturating_sub(seeds.start);
    let workers = workers
        .get()
        .min(usize::try_from(trials).unwrap_or(usize::MAX))
        .max(1);
    debug!(strategy = %strategy, trials, workers, "parallel audit");

    let started = Instant::now();
    let ids_ref = &ids;
    let counts = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let chunk = chunk_range(&seeds, w, workers);
                scope.spawn(move || tally(ids_ref, strategy, chunk))
            })
            .collect();

        let mut merged = empty_counts(ids_ref);
        for handle in handles {
            let partial = handle.join().expect("audit worker panicked")?;
            merge_counts(&mut merged, partial);
        }
        Ok::<PairingCounts, Error>(merged)
    })?;

    Ok(build_report(
        strategy,
        &ids,
        trials,
        counts,
        started.elapsed().as_secs_f64(),
    ))
}

/// Sort and deduplicate ids, rejecting rosters below the pairing minimum.
fn canonical_ids<S: AsRef<str>>(ids: &[S]) -> Result<Vec<String>> {
    let mut ids: Vec<String> = ids.iter().map(|s| s.as_ref().to_string()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() < 2 {
        return Err(Error::UnsatisfiableRoster { count: ids.len() });
    }
    Ok(ids)
}

/// Zeroed table covering every ordered (giver, receiver) pairing.
fn empty_counts(ids: &[String]) -> PairingCounts {
    ids.iter()
        .map(|giver| {
            let row = ids
                .iter()
                .filter(|r| *r != giver)
                .map(|r| (r.clone(), 0))
                .collect();
            (giver.clone(), row)
        })
        .collect()
}

/// Run one trial per seed and tally realized pairings.
fn tally(ids: &[String], strategy: StrategyKind, seeds: Range<u64>) -> Result<PairingCounts> {
    let mut counts = empty_counts(ids);
    for seed in seeds {
        let assignment = strategy.generate(ids.iter().cloned(), Some(seed))?;
        if !assignment.is_valid_for(ids) {
            return Err(Error::InvalidAssignment { strategy, seed });
        }
        for (giver, receiver) in assignment.iter() {
            if let Some(slot) = counts.get_mut(giver).and_then(|row| row.get_mut(receiver)) {
                *slot += 1;
            }
        }
    }
    Ok(counts)
}

/// Sum a partial table into an accumulator. Commutative and associative,
/// so worker join order cannot change the result.
fn merge_counts(into: &mut PairingCounts, partial: PairingCounts) {
    for (giver, row) in partial {
        let target = into.entry(giver).or_default();
        for (receiver, count) in row {
            *target.entry(receiver).or_default() += count;
        }
    }
}

/// The `index`-th of `pieces` contiguous sub-ranges of `seeds`.
fn chunk_range(seeds: &Range<u64>, index: usize, pieces: usize) -> Range<u64> {
    let total = seeds.end - seeds.start;
    let pieces = pieces as u64;
    let index = index as u64;
    let start = seeds.start + total * index / pieces;
    let end = seeds.start + total * (index + 1) / pieces;
    start..end
}

fn build_report(
    strategy: StrategyKind,
    ids: &[String],
    trials: u64,
    counts: PairingCounts,
    elapsed_secs: f64,
) -> AuditReport {
    let expected_percent = 100.0 / (ids.len() - 1) as f64;
    let mut pairings = Vec::with_capacity(ids.len() * (ids.len() - 1));
    let mut max_deviation = 0.0f64;

    for (giver, row) in &counts {
        for (receiver, &count) in row {
            let percent = if trials == 0 {
                0.0
            } else {
                100.0 * count as f64 / trials as f64
            };
            let deviation = (percent - expected_percent).abs();
            max_deviation = max_deviation.max(deviation);
            pairings.push(PairingStat {
                giver: giver.clone(),
                receiver: receiver.clone(),
                count,
                percent,
                deviation,
            });
        }
    }

    AuditReport {
        strategy,
        family_count: ids.len(),
        trials,
        expected_percent,
        max_deviation,
        elapsed_secs,
        pairings,
    }
}

// =============================================================================
// Tests
// =============================================================================
