use crate::{Error, Result};

/// Largest label in either space (interval 12).
const MAX_LABEL: usize = 12;

/// Direct label → position lookup over an ordered label set.
///
/// Built once per call so counting is a table index instead of a search.
#[derive(Debug, Clone)]
pub struct LabelIndex {
    labels: Vec<u8>,
    positions: [Option<usize>; MAX_LABEL + 1],
}

impl LabelIndex {
    pub fn new(labels: &[u8]) -> Self {
        let mut positions = [None; MAX_LABEL + 1];
        for (i, &label) in labels.iter().enumerate() {
            if let Some(slot) = positions.get_mut(label as usize) {
                *slot = Some(i);
            }
        }
        Self {
            labels: labels.to_vec(),
            positions,
        }
    }

    pub fn position(&self, label: u8) -> Option<usize> {
        self.positions.get(label as usize).copied().flatten()
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Per-label occurrence counts, in label-set order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    pub counts: Vec<u32>,
}

impl Histogram {
    /// Number of values counted.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Counts divided by the total; all zeros for an empty histogram.
    pub fn proportions(&self) -> Vec<f64> {
        let total = self.total();
        if total == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect()
    }

    /// True when the label at `position` never occurred.
    pub fn is_absent(&self, position: usize) -> bool {
        self.counts.get(position).map_or(true, |&c| c == 0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Count how often each label of `index` appears in `values`.
///
/// A value outside the label set means the reducer produced something it
/// should not have, so it is reported as an invariant violation.
pub fn count_labels(values: &[u8], index: &LabelIndex) -> Result<Histogram> {
    let mut counts = vec![0u32; index.len()];
    for &value in values {
        let pos = index.position(value).ok_or_else(|| {
            Error::InternalInvariant(format!(
                "label {value} is not in label set {:?}",
                index.labels()
            ))
        })?;
        counts[pos] += 1;
    }
    Ok(Histogram { counts })
}
