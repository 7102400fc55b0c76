//! Interval-based chord consonance.
//!
//! Scores a chord (a set of MIDI pitches) by weighting the histogram of its
//! pairwise octave-reduced intervals, and fits those weights from behavioural
//! ratings with ordinary least squares.
//!
//! ```text
//! pitches ──▶ interval ──▶ histogram ──┬──▶ weights (resolve) ──▶ score
//!                 │                    │
//!                 └──▶ partition ──────┴──▶ optimise ──▶ FittedWeights
//! ```
//!
//! # Example
//!
//! ```
//! use consonance::{interval_consonance, AggMethod, WeightSpec};
//!
//! let mut weights = vec![0.0; 12];
//! weights[3] = 1.0; // major third
//!
//! let score = interval_consonance(&[60, 64, 67], &WeightSpec::Flat(weights), AggMethod::Type)?;
//! assert!((score - 1.0 / 3.0).abs() < 1e-12);
//! # Ok::<(), consonance::Error>(())
//! ```

pub mod histogram;
pub mod interval;
pub mod optimise;
pub mod partition;
pub mod score;
pub mod weights;

pub use histogram::{count_labels, Histogram, LabelIndex};
pub use interval::{interval_class, octave_intervals, IntervalSpace};
pub use optimise::{
    fit, include_missing, optimise_interval_class_weights, optimise_interval_weights,
    optimise_weights, ExclusionFit, FitOptions, FittedWeights, DEFAULT_SINGULAR_TOLERANCE,
};
pub use partition::{exclusion_groups, partition};
pub use score::{interval_class_consonance, interval_consonance, score, AggMethod};
pub use weights::{
    check_weight_exclusions, exclusion_combinations, exclusion_signature, resolve_weights,
    WeightSpec, WeightTable, MAX_EXCLUDED_LABELS,
};

/// Errors from consonance scoring and weight fitting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("weights must have {expected} entries, got {found}")]
    InvalidWeightLength { expected: usize, found: usize },

    #[error("exclusion combinations are not complete: tables exclude {found:?}, expected {expected:?}")]
    InvalidExclusionCoverage {
        found: Vec<Vec<usize>>,
        expected: Vec<Vec<usize>>,
    },

    #[error("{chords} chords but {ratings} ratings")]
    MismatchedBatchLength { chords: usize, ratings: usize },

    #[error("normal equations are singular ({chords} chords, {labels} labels)")]
    SingularRegression { chords: usize, labels: usize },

    #[error("need at least 2 pitches to form an interval, got {count}")]
    InsufficientPitches { count: usize },

    #[error("{count} distinct excluded labels, at most {max} are supported")]
    TooManyExclusions { count: usize, max: usize },

    #[error("exclusion label {label} is outside the {space} range")]
    InvalidExclusionLabel { label: u8, space: IntervalSpace },

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
