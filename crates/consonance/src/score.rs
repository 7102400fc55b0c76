use serde::{Deserialize, Serialize};

use crate::histogram::{count_labels, LabelIndex};
use crate::interval::IntervalSpace;
use crate::weights::{check_weight_exclusions, resolve_weights, WeightSpec};
use crate::{Error, Result};

/// How histogram entries are weighted before the dot product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggMethod {
    /// Raw counts: larger chords accumulate larger scores.
    Sum,
    /// Counts as proportions of all pairs: independent of chord size.
    #[default]
    Type,
}

impl AggMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Type => "type",
        }
    }

    /// Histogram row as fed to the dot product or the design matrix.
    pub(crate) fn row(&self, counts: &[u32], total: usize) -> Vec<f64> {
        match self {
            Self::Sum => counts.iter().map(|&c| c as f64).collect(),
            Self::Type => counts.iter().map(|&c| c as f64 / total as f64).collect(),
        }
    }
}

impl std::fmt::Display for AggMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AggMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "type" => Ok(Self::Type),
            other => Err(format!("unknown aggregation method: {other}")),
        }
    }
}

/// Consonance of a chord in the given label space.
pub fn score(
    pitches: &[i32],
    weights: &WeightSpec,
    agg: AggMethod,
    space: IntervalSpace,
) -> Result<f64> {
    let labels = space.reduce(pitches)?;
    let histogram = count_labels(&labels, &LabelIndex::new(space.labels()))?;

    let weights = match weights {
        WeightSpec::Flat(w) => {
            check_length(w.len(), space)?;
            w.clone()
        }
        WeightSpec::Piecewise(tables) => {
            for table in tables {
                check_length(table.len(), space)?;
            }
            check_weight_exclusions(tables)?;
            resolve_weights(&histogram, tables)?
        }
    };

    let row = agg.row(&histogram.counts, labels.len());
    Ok(row.iter().zip(&weights).map(|(x, w)| x * w).sum())
}

fn check_length(found: usize, space: IntervalSpace) -> Result<()> {
    if found != space.label_count() {
        return Err(Error::InvalidWeightLength {
            expected: space.label_count(),
            found,
        });
    }
    Ok(())
}

/// Consonance from pairwise intervals (weights indexed by intervals 1–12).
pub fn interval_consonance(pitches: &[i32], weights: &WeightSpec, agg: AggMethod) -> Result<f64> {
    score(pitches, weights, agg, IntervalSpace::Interval)
}

/// Consonance from pairwise interval classes (weights indexed by classes 0–6).
pub fn interval_class_consonance(
    pitches: &[i32],
    weights: &WeightSpec,
    agg: AggMethod,
) -> Result<f64> {
    score(pitches, weights, agg, IntervalSpace::IntervalClass)
}
