//! Fit weights to ratings produced by known weights, then check the fit
//! recovers them and scores the same chords identically.

use consonance::{
    interval_class_consonance, interval_consonance, optimise_interval_class_weights,
    optimise_interval_weights, AggMethod, FittedWeights, IntervalSpace, WeightSpec,
    WeightTable,
};
use pretty_assertions::assert_eq;

const TOLERANCE: f64 = 1e-9;

fn assert_table_close(actual: &WeightTable, expected: &WeightTable) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        match (a, e) {
            (Some(a), Some(e)) => assert!(
                (a - e).abs() < TOLERANCE,
                "weight {i}: {a} != {e}\n{actual:?}\n{expected:?}"
            ),
            (None, None) => {}
            _ => panic!("weight {i}: {a:?} != {e:?}\n{actual:?}\n{expected:?}"),
        }
    }
}

/// Dyads over every interval plus a handful of larger chords.
fn interval_batch() -> Vec<Vec<i32>> {
    let mut chords: Vec<Vec<i32>> = (1..=12).map(|k| vec![60, 60 + k]).collect();
    chords.extend([
        vec![60, 64, 67],
        vec![60, 63, 67],
        vec![60, 64, 67, 70],
        vec![57, 60, 64, 67, 71],
        vec![48, 60, 61, 66],
        vec![62, 62, 65],
    ]);
    chords
}

fn true_interval_weights() -> Vec<f64> {
    vec![-1.2, -0.4, 0.6, 0.8, 0.9, -0.7, 1.0, 0.5, 0.4, -0.1, -0.9, 1.3]
}

#[test]
fn flat_interval_weights_are_recovered() {
    let chords = interval_batch();
    let truth = WeightSpec::Flat(true_interval_weights());
    let ratings: Vec<f64> = chords
        .iter()
        .map(|c| interval_consonance(c, &truth, AggMethod::Type).unwrap())
        .collect();

    let fitted = optimise_interval_weights(&chords, &ratings, &[], AggMethod::Type).unwrap();
    let FittedWeights::Flat(table) = &fitted else {
        panic!("expected a flat fit, got {fitted:?}");
    };

    let expected: WeightTable = true_interval_weights().into_iter().map(Some).collect();
    assert_table_close(table, &expected);
}

#[test]
fn sum_aggregation_round_trips() {
    let chords = interval_batch();
    let truth = WeightSpec::Flat(true_interval_weights());
    let ratings: Vec<f64> = chords
        .iter()
        .map(|c| interval_consonance(c, &truth, AggMethod::Sum).unwrap())
        .collect();

    let fitted = optimise_interval_weights(&chords, &ratings, &[], AggMethod::Sum).unwrap();
    let expected: WeightTable = true_interval_weights().into_iter().map(Some).collect();
    assert_table_close(&fitted.tables()[0], &expected);
}

#[test]
fn fitted_weights_reproduce_ratings() {
    let chords = interval_batch();
    let truth = WeightSpec::Flat(true_interval_weights());
    let ratings: Vec<f64> = chords
        .iter()
        .map(|c| interval_consonance(c, &truth, AggMethod::Type).unwrap())
        .collect();

    let fitted = optimise_interval_weights(&chords, &ratings, &[], AggMethod::Type).unwrap();
    let spec = fitted.to_weight_spec(IntervalSpace::Interval);
    for (chord, rating) in chords.iter().zip(&ratings) {
        let score = interval_consonance(chord, &spec, AggMethod::Type).unwrap();
        assert!((score - rating).abs() < TOLERANCE, "{chord:?}: {score} != {rating}");
    }
}

#[test]
fn piecewise_weights_split_on_octave() {
    // Tables indexed by interval 1..=12; position 11 is the unison/octave.
    let mut without_octave: WeightTable = true_interval_weights().into_iter().map(Some).collect();
    without_octave[11] = None;
    let with_octave: WeightTable = true_interval_weights()
        .into_iter()
        .map(|w| Some(w * -0.5 + 0.25))
        .collect();
    let truth = WeightSpec::Piecewise(vec![with_octave.clone(), without_octave.clone()]);

    // Octave-free dyads identify the first group, octave + dyad triads the second.
    let mut chords: Vec<Vec<i32>> = (1..=11).map(|k| vec![60, 60 + k]).collect();
    chords.push(vec![60, 64, 67]);
    chords.push(vec![60, 72]);
    chords.extend((1..=11).map(|k| vec![60, 72, 72 + k]));

    let ratings: Vec<f64> = chords
        .iter()
        .map(|c| interval_consonance(c, &truth, AggMethod::Type).unwrap())
        .collect();

    let fitted = optimise_interval_weights(&chords, &ratings, &[12], AggMethod::Type).unwrap();
    let FittedWeights::Piecewise(fits) = &fitted else {
        panic!("expected a piecewise fit, got {fitted:?}");
    };

    assert_eq!(fits.len(), 2);
    assert_eq!(fits[0].excluded, vec![12]);
    assert_eq!(fits[1].excluded, Vec::<u8>::new());
    assert_table_close(&fits[0].weights, &without_octave);
    assert_table_close(&fits[1].weights, &with_octave);

    let spec = fitted.to_weight_spec(IntervalSpace::Interval);
    for (chord, rating) in chords.iter().zip(&ratings) {
        let score = interval_consonance(chord, &spec, AggMethod::Type).unwrap();
        assert!((score - rating).abs() < TOLERANCE, "{chord:?}: {score} != {rating}");
    }
}

#[test]
fn interval_class_weights_are_recovered() {
    let truth = vec![1.0, -1.0, -0.3, 0.4, 0.6, 0.8, -0.6];
    // Class k dyads for k in 0..=6, plus triads that mix classes
    let mut chords: Vec<Vec<i32>> = (0..=6).map(|k| vec![60, 60 + k]).collect();
    chords.extend([vec![60, 64, 67], vec![60, 61, 66, 72], vec![55, 59, 62, 65]]);

    let spec = WeightSpec::Flat(truth.clone());
    let ratings: Vec<f64> = chords
        .iter()
        .map(|c| interval_class_consonance(c, &spec, AggMethod::Type).unwrap())
        .collect();

    let fitted =
        optimise_interval_class_weights(&chords, &ratings, &[], AggMethod::Type).unwrap();
    let expected: WeightTable = truth.into_iter().map(Some).collect();
    assert_table_close(&fitted.tables()[0], &expected);
}

#[test]
fn fitted_output_serializes_with_nulls() {
    let chords: Vec<Vec<i32>> = vec![vec![60, 63], vec![60, 64]];
    let fitted = optimise_interval_weights(&chords, &[0.5, 1.0], &[], AggMethod::Sum).unwrap();
    let json = serde_json::to_value(&fitted).unwrap();
    let flat = json["flat"].as_array().unwrap();
    assert_eq!(flat.len(), 12);
    assert!(flat[0].is_null());
    assert_eq!(flat[2].as_f64(), Some(0.5));
}
