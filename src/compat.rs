//! Pairwise compatibility between person records.
//!
//! A judge's preference on an axis is the running sum of liked types on that
//! axis divided by the number of likes that carried a known type. A ratio
//! strictly beyond [`STRONG_PREFERENCE`] in either direction constrains the
//! subject's axis; anything in between leaves it free.

use crate::person::{PersonRecord, AXES};

/// Magnitude a preference ratio must exceed to constrain an axis.
pub const STRONG_PREFERENCE: f64 = 0.33;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AxisVerdict {
    Satisfied,
    Violated,
    Neutral,
}

impl AxisVerdict {
    #[inline]
    fn weight(self) -> f64 {
        match self {
            AxisVerdict::Satisfied => 1.0,
            AxisVerdict::Violated => 0.0,
            AxisVerdict::Neutral => 0.5,
        }
    }
}

/// Per-axis verdicts, or `None` when the judge has no typed history.
fn verdicts(judge: &PersonRecord, subject: &PersonRecord) -> Option<[AxisVerdict; AXES]> {
    let total = judge.valid_interactions();
    if total == 0 {
        return None;
    }
    let prefs = judge.preference();
    let traits = subject.self_vector();
    let mut out = [AxisVerdict::Neutral; AXES];
    for k in 0..AXES {
        let ratio = f64::from(prefs[k]) / f64::from(total);
        let wanted = if ratio > STRONG_PREFERENCE {
            1
        } else if ratio < -STRONG_PREFERENCE {
            -1
        } else {
            continue;
        };
        out[k] = if traits[k] == wanted {
            AxisVerdict::Satisfied
        } else {
            AxisVerdict::Violated
        };
    }
    Some(out)
}

/// Whether `subject` satisfies every strong preference of `judge`.
pub fn is_compatible(judge: &PersonRecord, subject: &PersonRecord) -> bool {
    match verdicts(judge, subject) {
        None => true,
        Some(v) => !v.contains(&AxisVerdict::Violated),
    }
}

#[inline]
pub fn is_mutually_compatible(a: &PersonRecord, b: &PersonRecord) -> bool {
    is_compatible(a, b) && is_compatible(b, a)
}

/// Normalized score in `[0, 1]`: satisfied axes count 1, violated 0,
/// neutral 0.5.
pub fn score(judge: &PersonRecord, subject: &PersonRecord) -> f64 {
    let v = verdicts(judge, subject).unwrap_or([AxisVerdict::Neutral; AXES]);
    v.iter().map(|a| a.weight()).sum::<f64>() / AXES as f64
}

/// Mutual gender gate.
///
/// Each party's declared gender must appear in the other's preference list.
/// A missing preference list accepts anyone, and a party without a declared
/// gender is not filtered.
pub fn gender_compatible(a: &PersonRecord, b: &PersonRecord) -> bool {
    accepts(a, b) && accepts(b, a)
}

fn accepts(chooser: &PersonRecord, other: &PersonRecord) -> bool {
    match (chooser.gender_preferences(), other.gender()) {
        (Some(prefs), Some(gender)) => prefs.iter().any(|p| p.eq_ignore_ascii_case(gender)),
        _ => true,
    }
}
