use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Semitones per octave.
pub const OCTAVE: i32 = 12;

const INTERVAL_LABELS: [u8; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
const INTERVAL_CLASS_LABELS: [u8; 7] = [0, 1, 2, 3, 4, 5, 6];

/// Label space a histogram or weight table is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalSpace {
    /// Octave-reduced intervals, labels 1–12 (12 is unison/octave).
    #[default]
    Interval,
    /// Interval classes under inversion, labels 0–6.
    IntervalClass,
}

impl IntervalSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::IntervalClass => "interval_class",
        }
    }

    /// Full ordered label range of this space.
    pub fn labels(&self) -> &'static [u8] {
        match self {
            Self::Interval => &INTERVAL_LABELS,
            Self::IntervalClass => &INTERVAL_CLASS_LABELS,
        }
    }

    pub fn label_count(&self) -> usize {
        self.labels().len()
    }

    pub fn contains(&self, label: u8) -> bool {
        match self {
            Self::Interval => (1..=12).contains(&label),
            Self::IntervalClass => label <= 6,
        }
    }

    /// Reduce a pitch set to its sorted pairwise labels in this space.
    pub fn reduce(&self, pitches: &[i32]) -> Result<Vec<u8>> {
        let intervals = octave_intervals(pitches)?;
        Ok(match self {
            Self::Interval => intervals,
            Self::IntervalClass => {
                let mut classes: Vec<u8> = intervals.into_iter().map(interval_class).collect();
                classes.sort_unstable();
                classes
            }
        })
    }
}

impl std::fmt::Display for IntervalSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IntervalSpace {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interval" => Ok(Self::Interval),
            "interval_class" | "class" => Ok(Self::IntervalClass),
            other => Err(format!("unknown interval space: {other}")),
        }
    }
}

/// All pairwise intervals of a chord, octave-reduced into 1–12 and sorted.
///
/// Pairs are taken in combination order (`pitches[j] - pitches[i]` for
/// `i < j`). A difference that is a multiple of the octave becomes 12, so
/// doubled notes and octaves count as a perfect interval rather than vanishing.
pub fn octave_intervals(pitches: &[i32]) -> Result<Vec<u8>> {
    if pitches.len() < 2 {
        return Err(Error::InsufficientPitches {
            count: pitches.len(),
        });
    }

    let mut intervals = Vec::with_capacity(pitches.len() * (pitches.len() - 1) / 2);
    for (i, &low) in pitches.iter().enumerate() {
        for &high in &pitches[i + 1..] {
            let reduced = (i64::from(high) - i64::from(low)).rem_euclid(i64::from(OCTAVE)) as u8;
            intervals.push(if reduced == 0 { 12 } else { reduced });
        }
    }

    intervals.sort_unstable();
    Ok(intervals)
}

/// Collapse an interval (1–12) onto its inversion class (0–6).
pub fn interval_class(interval: u8) -> u8 {
    interval.min(12u8.saturating_sub(interval))
}
