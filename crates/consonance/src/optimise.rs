//! Least-squares fitting of interval weights from chord ratings.
//!
//! Each chord becomes one row of a design matrix (its label histogram, as
//! counts or proportions) and the weights solve the normal equations
//! `(AᵀA) w = Aᵀr`. With exclusion labels, chords are first split into
//! exclusion groups and every group gets its own regression and table.

use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::histogram::{count_labels, LabelIndex};
use crate::interval::IntervalSpace;
use crate::partition::{exclusion_groups, partition};
use crate::score::AggMethod;
use crate::weights::{WeightSpec, WeightTable};
use crate::{Error, Result};

/// Relative LU pivot size at or below which `AᵀA` counts as singular.
pub const DEFAULT_SINGULAR_TOLERANCE: f64 = 1e-10;

/// Options for a weight fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    pub space: IntervalSpace,
    pub agg_method: AggMethod,
    /// Labels that split the fit into one table per exclusion group.
    pub exclude: Vec<u8>,
    pub singular_tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            space: IntervalSpace::Interval,
            agg_method: AggMethod::Type,
            exclude: Vec::new(),
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
        }
    }
}

/// Weights fitted for one exclusion group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionFit {
    /// Labels this group's chords never contain.
    pub excluded: Vec<u8>,
    pub weights: WeightTable,
}

/// Result of a fit. Unobserved or excluded labels are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FittedWeights {
    Flat(WeightTable),
    /// One fit per exclusion group, most-excluded first.
    Piecewise(Vec<ExclusionFit>),
}

impl FittedWeights {
    /// Plain tables, in group order for piecewise fits.
    pub fn tables(&self) -> Vec<WeightTable> {
        match self {
            Self::Flat(table) => vec![table.clone()],
            Self::Piecewise(fits) => fits.iter().map(|f| f.weights.clone()).collect(),
        }
    }

    /// Weights in the shape the scorer takes.
    ///
    /// Labels left unconstrained because no chord contained them score zero.
    /// Piecewise tables keep `None` only on their group's excluded labels, so
    /// the result is a complete exclusion scheme.
    pub fn to_weight_spec(&self, space: IntervalSpace) -> WeightSpec {
        match self {
            Self::Flat(table) => WeightSpec::Flat(table.iter().map(|w| w.unwrap_or(0.0)).collect()),
            Self::Piecewise(fits) => WeightSpec::Piecewise(
                fits.iter()
                    .map(|fit| {
                        space
                            .labels()
                            .iter()
                            .zip(&fit.weights)
                            .map(|(label, w)| {
                                if fit.excluded.contains(label) {
                                    None
                                } else {
                                    Some(w.unwrap_or(0.0))
                                }
                            })
                            .collect()
                    })
                    .collect(),
            ),
        }
    }
}

/// Solve for one weight per entry of `label_set`.
///
/// `label_lists` holds each chord's reduced labels; every label must be in
/// `label_set`. Weights come back in `label_set` order.
pub fn optimise_weights<L: AsRef<[u8]>>(
    label_lists: &[L],
    ratings: &[f64],
    label_set: &[u8],
    agg: AggMethod,
    singular_tolerance: f64,
) -> Result<Vec<f64>> {
    if label_lists.len() != ratings.len() {
        return Err(Error::MismatchedBatchLength {
            chords: label_lists.len(),
            ratings: ratings.len(),
        });
    }
    if label_set.is_empty() {
        return Ok(Vec::new());
    }

    let index = LabelIndex::new(label_set);
    let mut design = DMatrix::<f64>::zeros(label_lists.len(), label_set.len());
    for (i, labels) in label_lists.iter().enumerate() {
        let labels = labels.as_ref();
        let histogram = count_labels(labels, &index)?;
        for (j, x) in agg.row(&histogram.counts, labels.len()).into_iter().enumerate() {
            design[(i, j)] = x;
        }
    }

    let singular = || Error::SingularRegression {
        chords: label_lists.len(),
        labels: label_set.len(),
    };

    let normal = design.tr_mul(&design);
    let rhs = design.tr_mul(&DVector::from_column_slice(ratings));

    let lu = normal.lu();
    let pivots = lu.u().diagonal();
    let largest = pivots.iter().fold(0.0_f64, |m, p| m.max(p.abs()));
    if largest == 0.0 || pivots.iter().any(|p| p.abs() <= singular_tolerance * largest) {
        return Err(singular());
    }

    let weights = lu.solve(&rhs).ok_or_else(singular)?;
    Ok(weights.iter().copied().collect())
}

/// Spread weights fitted over `label_set` across the full label range.
pub fn include_missing(weights: &[f64], label_set: &[u8], space: IntervalSpace) -> WeightTable {
    let index = LabelIndex::new(label_set);
    space
        .labels()
        .iter()
        .map(|&label| index.position(label).and_then(|p| weights.get(p).copied()))
        .collect()
}

/// Fit weights for a batch of chords against their ratings.
pub fn fit<P: AsRef<[i32]>>(
    pitches_list: &[P],
    ratings: &[f64],
    options: &FitOptions,
) -> Result<FittedWeights> {
    let space = options.space;
    if pitches_list.len() != ratings.len() {
        return Err(Error::MismatchedBatchLength {
            chords: pitches_list.len(),
            ratings: ratings.len(),
        });
    }
    if let Some(&label) = options.exclude.iter().find(|&&l| !space.contains(l)) {
        return Err(Error::InvalidExclusionLabel { label, space });
    }

    let label_lists = pitches_list
        .iter()
        .map(|p| space.reduce(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let observed: Vec<u8> = label_lists
        .iter()
        .flatten()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    debug!(
        %space,
        agg = %options.agg_method,
        chords = label_lists.len(),
        observed = ?observed,
        exclude = ?options.exclude,
        "fitting consonance weights"
    );

    if options.exclude.is_empty() {
        let weights = optimise_weights(
            &label_lists,
            ratings,
            &observed,
            options.agg_method,
            options.singular_tolerance,
        )
        .map_err(|e| {
            warn!(error = %e, "weight fit failed");
            e
        })?;
        return Ok(FittedWeights::Flat(include_missing(&weights, &observed, space)));
    }

    let groups = exclusion_groups(&options.exclude)?;
    let assignment = partition(&label_lists, &groups)?;

    let mut fits = Vec::with_capacity(groups.len());
    for (g, excluded) in groups.into_iter().enumerate() {
        let members: Vec<usize> = (0..label_lists.len())
            .filter(|&i| assignment[i] == g)
            .collect();
        let group_labels: Vec<&Vec<u8>> = members.iter().map(|&i| &label_lists[i]).collect();
        let group_ratings: Vec<f64> = members.iter().map(|&i| ratings[i]).collect();
        let label_set: Vec<u8> = observed
            .iter()
            .copied()
            .filter(|l| !excluded.contains(l))
            .collect();

        debug!(
            group = g,
            excluded = ?excluded,
            chords = members.len(),
            labels = label_set.len(),
            "fitting exclusion group"
        );

        let weights = optimise_weights(
            &group_labels,
            &group_ratings,
            &label_set,
            options.agg_method,
            options.singular_tolerance,
        )
        .map_err(|e| {
            warn!(group = g, excluded = ?excluded, error = %e, "exclusion group fit failed");
            e
        })?;

        fits.push(ExclusionFit {
            weights: include_missing(&weights, &label_set, space),
            excluded,
        });
    }

    Ok(FittedWeights::Piecewise(fits))
}

/// Fit interval (1–12) weights; `exclude_intervals` splits the fit into groups.
pub fn optimise_interval_weights<P: AsRef<[i32]>>(
    pitches_list: &[P],
    ratings: &[f64],
    exclude_intervals: &[u8],
    agg: AggMethod,
) -> Result<FittedWeights> {
    fit(
        pitches_list,
        ratings,
        &FitOptions {
            space: IntervalSpace::Interval,
            agg_method: agg,
            exclude: exclude_intervals.to_vec(),
            ..FitOptions::default()
        },
    )
}

/// Fit interval-class (0–6) weights; `exclude_classes` splits the fit into groups.
pub fn optimise_interval_class_weights<P: AsRef<[i32]>>(
    pitches_list: &[P],
    ratings: &[f64],
    exclude_classes: &[u8],
    agg: AggMethod,
) -> Result<FittedWeights> {
    fit(
        pitches_list,
        ratings,
        &FitOptions {
            space: IntervalSpace::IntervalClass,
            agg_method: agg,
            exclude: exclude_classes.to_vec(),
            ..FitOptions::default()
        },
    )
}
