use crate::store::Reading;
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::collections::BTreeMap;

/// Local hours treated as daytime for the peak midpoint, `[6, 20)`.
const DAY_HOURS: std::ops::Range<u32> = 6..20;

/// Hour-of-day buckets of one local day. Only hours with data appear.
#[derive(Debug, Clone, PartialEq)]
pub struct HourBucket {
    pub hour: u32,
    pub averages: Vec<f64>,
}

/// One calendar day of a week summary. Days without data average to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub averages: Vec<f64>,
}

/// One four-hour interval of a month summary, labelled by its start.
#[derive(Debug, Clone, PartialEq)]
pub struct PartBucket {
    pub start: NaiveDateTime,
    pub averages: Vec<f64>,
}

/// Day/night maxima and their midpoint, per field.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSummary {
    pub max_day: Vec<i64>,
    pub max_night: Vec<i64>,
    pub pic_average: Vec<f64>,
}

/// Rounds to 2 decimals, ties to even.
///
/// Decimal ties are rarely exact in binary (2.675 scales to 267.499…97), so
/// anything within 1e-9 of the .5 boundary counts as a tie.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    let floor = scaled.floor();
    let rounded = if (scaled - floor - 0.5).abs() < 1e-9 {
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        scaled.round()
    };
    rounded / 100.0
}

/// Mean of integer-truncated samples, 0 for an empty field.
fn truncated_mean(samples: &[i64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: i64 = samples.iter().sum();
    round2(sum as f64 / samples.len() as f64)
}

/// Per-field sample accumulator. Values are truncated toward zero on entry;
/// `None` values are skipped.
struct FieldSamples {
    fields: Vec<Vec<i64>>,
}

impl FieldSamples {
    fn new(field_count: usize) -> Self {
        Self {
            fields: vec![Vec::new(); field_count],
        }
    }

    fn push(&mut self, values: &[Option<f64>]) {
        for (field, value) in self.fields.iter_mut().zip(values) {
            if let Some(value) = value {
                field.push(value.trunc() as i64);
            }
        }
    }

    fn averages(&self) -> Vec<f64> {
        self.fields
            .iter()
            .map(|samples| truncated_mean(samples))
            .collect()
    }
}

/// Groups one local day's readings by hour. Hours without readings are
/// omitted; buckets come out in ascending hour order.
pub fn hourly_averages(readings: &[Reading], field_count: usize) -> Vec<HourBucket> {
    let mut by_hour: BTreeMap<u32, FieldSamples> = BTreeMap::new();
    for reading in readings {
        by_hour
            .entry(reading.timestamp.hour())
            .or_insert_with(|| FieldSamples::new(field_count))
            .push(&reading.values);
    }
    by_hour
        .into_iter()
        .map(|(hour, samples)| HourBucket {
            hour,
            averages: samples.averages(),
        })
        .collect()
}

/// Daily means for the Monday-to-Sunday week starting at `monday`. Always
/// exactly 7 buckets; a day without readings averages to 0.
pub fn weekly_averages(
    readings: &[Reading],
    monday: NaiveDate,
    field_count: usize,
) -> Vec<DayBucket> {
    let mut by_date: BTreeMap<NaiveDate, FieldSamples> = BTreeMap::new();
    for reading in readings {
        by_date
            .entry(reading.timestamp.date_naive())
            .or_insert_with(|| FieldSamples::new(field_count))
            .push(&reading.values);
    }
    (0..7)
        .map(|day| {
            let date = monday + Duration::days(day);
            let averages = by_date
                .get(&date)
                .map(|samples| samples.averages())
                .unwrap_or_else(|| vec![0.0; field_count]);
            DayBucket { date, averages }
        })
        .collect()
}

/// Six fixed four-hour intervals per local calendar day. Intervals without
/// readings are omitted, unlike the week's zero-filled days.
pub fn monthly_part_averages(readings: &[Reading], field_count: usize) -> Vec<PartBucket> {
    let mut by_part: BTreeMap<(NaiveDate, u32), FieldSamples> = BTreeMap::new();
    for reading in readings {
        let key = (reading.timestamp.date_naive(), reading.timestamp.hour() / 4);
        by_part
            .entry(key)
            .or_insert_with(|| FieldSamples::new(field_count))
            .push(&reading.values);
    }
    by_part
        .into_iter()
        .map(|((date, part), samples)| {
            let start = date
                .and_hms_opt(part * 4, 0, 0)
                .expect("interval start is in range");
            PartBucket {
                start,
                averages: samples.averages(),
            }
        })
        .collect()
}

/// Day/night peak midpoint over one local day. This estimates the midpoint
/// between the two peaks, not a mean of the samples.
pub fn peak_averages(readings: &[Reading], field_count: usize) -> PeakSummary {
    let mut max_day: Vec<Option<i64>> = vec![None; field_count];
    let mut max_night: Vec<Option<i64>> = vec![None; field_count];

    for reading in readings {
        let maxima = if DAY_HOURS.contains(&reading.timestamp.hour()) {
            &mut max_day
        } else {
            &mut max_night
        };
        for (slot, value) in maxima.iter_mut().zip(&reading.values) {
            if let Some(value) = value {
                let value = value.trunc() as i64;
                *slot = Some(slot.map_or(value, |current| current.max(value)));
            }
        }
    }

    let max_day: Vec<i64> = max_day.into_iter().map(|v| v.unwrap_or(0)).collect();
    let max_night: Vec<i64> = max_night.into_iter().map(|v| v.unwrap_or(0)).collect();
    let pic_average = max_day
        .iter()
        .zip(&max_night)
        .map(|(day, night)| round2((day + night) as f64 / 2.0))
        .collect();

    PeakSummary {
        max_day,
        max_night,
        pic_average,
    }
}
