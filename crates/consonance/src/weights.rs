//! Weight tables and exclusion-conditioned table selection.
//!
//! A piecewise scheme is a list of tables over the same labels where some
//! entries are `None`. The positions of a table's `None` entries are its
//! *exclusion signature*: the table applies to chords in which none of those
//! labels occur. A valid scheme has exactly one table per subset of the
//! excluded positions.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::histogram::Histogram;
use crate::{Error, Result};

/// Most distinct labels a piecewise scheme may exclude (the size of the
/// interval space).
pub const MAX_EXCLUDED_LABELS: usize = 12;

/// One weight per label; `None` marks an unconstrained entry.
pub type WeightTable = Vec<Option<f64>>;

/// Weights supplied to the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightSpec {
    /// One weight per label.
    Flat(Vec<f64>),
    /// One table per combination of excluded labels.
    Piecewise(Vec<WeightTable>),
}

impl From<Vec<f64>> for WeightSpec {
    fn from(weights: Vec<f64>) -> Self {
        Self::Flat(weights)
    }
}

impl From<Vec<WeightTable>> for WeightSpec {
    fn from(tables: Vec<WeightTable>) -> Self {
        Self::Piecewise(tables)
    }
}

/// Sorted positions of a table's `None` entries.
pub fn exclusion_signature(table: &[Option<f64>]) -> Vec<usize> {
    table
        .iter()
        .enumerate()
        .filter(|(_, w)| w.is_none())
        .map(|(i, _)| i)
        .collect()
}

/// Every subset of `labels`, each sorted, in lexicographic order.
///
/// The empty subset comes first. Repeated labels are collapsed, so the
/// result always has `2^k` entries for `k` distinct labels. More than
/// [`MAX_EXCLUDED_LABELS`] distinct labels is an error.
pub fn exclusion_combinations<T: Ord + Copy>(labels: &[T]) -> Result<Vec<Vec<T>>> {
    let mut distinct = labels.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() > MAX_EXCLUDED_LABELS {
        return Err(Error::TooManyExclusions {
            count: distinct.len(),
            max: MAX_EXCLUDED_LABELS,
        });
    }

    let mut subsets: Vec<Vec<T>> = (0u32..1 << distinct.len())
        .map(|mask| {
            distinct
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, &label)| label)
                .collect()
        })
        .collect();

    subsets.sort();
    Ok(subsets)
}

/// Validate a piecewise scheme: equal lengths and complete exclusion coverage.
pub fn check_weight_exclusions(tables: &[WeightTable]) -> Result<()> {
    let Some(first) = tables.first() else {
        return Err(Error::InvalidExclusionCoverage {
            found: Vec::new(),
            expected: vec![Vec::new()],
        });
    };

    for table in &tables[1..] {
        if table.len() != first.len() {
            return Err(Error::InvalidWeightLength {
                expected: first.len(),
                found: table.len(),
            });
        }
    }

    let mut signatures: Vec<Vec<usize>> =
        tables.iter().map(|t| exclusion_signature(t)).collect();
    signatures.sort();

    let excluded: Vec<usize> = signatures.iter().flatten().copied().collect();
    let expected = exclusion_combinations(&excluded)?;

    if signatures != expected {
        return Err(Error::InvalidExclusionCoverage {
            found: signatures,
            expected,
        });
    }
    Ok(())
}

/// Pick the table that applies to a chord with this histogram.
///
/// The winner is the table with the most excluded positions such that none of
/// them occur in the chord. Equal-size candidates are tried in declaration
/// order. `None` entries of the winner become zero.
pub fn resolve_weights(histogram: &Histogram, tables: &[WeightTable]) -> Result<Vec<f64>> {
    let signatures: Vec<Vec<usize>> = tables.iter().map(|t| exclusion_signature(t)).collect();

    let mut order: Vec<usize> = (0..tables.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(signatures[i].len()));

    for i in order {
        if signatures[i].iter().all(|&pos| histogram.is_absent(pos)) {
            trace!(table = i, excluded = ?signatures[i], "resolved weight table");
            return Ok(tables[i].iter().map(|w| w.unwrap_or(0.0)).collect());
        }
    }

    let mut found = signatures;
    found.sort();
    let excluded: Vec<usize> = found.iter().flatten().copied().collect();
    Err(Error::InvalidExclusionCoverage {
        expected: exclusion_combinations(&excluded)?,
        found,
    })
}
