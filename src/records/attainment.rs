//! Average marks and attainment level bucketing.

use serde::Serialize;

/// Two-bucket attainment policy.
///
/// An average strictly above `threshold` maps to `upper_level`; anything
/// else (including an empty set) maps to `default_level`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttainmentPolicy {
    /// Strict lower bound on average marks for the upper level.
    pub threshold: f64,
    /// Level awarded above the threshold.
    pub upper_level: u8,
    /// Level awarded otherwise.
    pub default_level: u8,
}

impl Default for AttainmentPolicy {
    fn default() -> Self {
        Self {
            threshold: 50.0,
            upper_level: 3,
            default_level: 2,
        }
    }
}

/// Aggregate marks across a set of test entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttainmentReport {
    /// Arithmetic mean of marks, 0 when there are none.
    pub average_marks: f64,
    /// Bucketed level.
    pub attainment_level: u8,
}

impl AttainmentPolicy {
    /// Level for a given average.
    pub fn level_for(&self, average: f64) -> u8 {
        if average > self.threshold {
            self.upper_level
        } else {
            self.default_level
        }
    }

    /// Average the given marks and bucket the result.
    ///
    /// The mean is updated incrementally so large marks never overflow an
    /// intermediate sum.
    pub fn evaluate<I>(&self, marks: I) -> AttainmentReport
    where
        I: IntoIterator<Item = f64>,
    {
        let (average_marks, _) = marks
            .into_iter()
            .fold((0.0_f64, 0_u32), |(mean, count), m| {
                let count = count + 1;
                (mean + (m - mean) / f64::from(count), count)
            });

        AttainmentReport {
            average_marks,
            attainment_level: self.level_for(average_marks),
        }
    }
}
