use crate::weights::exclusion_combinations;
use crate::{Error, Result};

/// Exclusion groups for `labels`, most-excluded first.
///
/// Groups of equal size keep their lexicographic order. Fitted piecewise
/// tables are returned in this order.
pub fn exclusion_groups(labels: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut groups = exclusion_combinations(labels)?;
    groups.sort_by_key(|g| std::cmp::Reverse(g.len()));
    Ok(groups)
}

/// Assign each chord to the first group that excludes none of its labels.
///
/// `groups` must be ordered most-excluded first and contain the empty group,
/// which matches every chord.
pub fn partition<L: AsRef<[u8]>>(label_lists: &[L], groups: &[Vec<u8>]) -> Result<Vec<usize>> {
    label_lists
        .iter()
        .map(|labels| {
            let labels = labels.as_ref();
            groups
                .iter()
                .position(|excluded| labels.iter().all(|l| !excluded.contains(l)))
                .ok_or_else(|| {
                    Error::InternalInvariant(format!(
                        "chord labels {labels:?} match no exclusion group in {groups:?}"
                    ))
                })
        })
        .collect()
}
