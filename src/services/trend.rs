use crate::services::aggregate::round2;
use crate::store::Reading;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Environment channel field order: CO2, temperature, humidity.
const FIELD_CO2: usize = 0;
const FIELD_TEMP: usize = 1;
const FIELD_HUM: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

/// Per-field trend over the trailing daily means.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct FieldTrend {
    pub trend: TrendDirection,
    pub start: f64,
    pub end: f64,
    pub overall_average: f64,
    pub variability: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct DailyAverage {
    pub date: String,
    pub average_temp: f64,
    pub average_hum: f64,
    pub average_co2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TrendReport {
    pub temperature: FieldTrend,
    pub humidity: FieldTrend,
    pub co2: FieldTrend,
    pub daily_averages: Vec<DailyAverage>,
}

/// Analyzes the trailing 3 days of an environment channel.
///
/// Each local calendar day collapses to one truncate-then-average mean per
/// field; the per-field trend compares the first and last of the (at most 3)
/// daily means.
pub fn analyze(readings: &[Reading]) -> TrendReport {
    let mut daily: std::collections::BTreeMap<chrono::NaiveDate, [Vec<i64>; 3]> =
        std::collections::BTreeMap::new();
    for reading in readings {
        let samples = daily.entry(reading.timestamp.date_naive()).or_default();
        for (field, value) in samples.iter_mut().zip(&reading.values) {
            if let Some(value) = value {
                field.push(value.trunc() as i64);
            }
        }
    }

    let daily_means: Vec<(chrono::NaiveDate, [f64; 3])> = daily
        .iter()
        .map(|(date, samples)| {
            let mut means = [0.0; 3];
            for (mean, field) in means.iter_mut().zip(samples) {
                if !field.is_empty() {
                    let sum: i64 = field.iter().sum();
                    *mean = round2(sum as f64 / field.len() as f64);
                }
            }
            (*date, means)
        })
        .collect();

    let last_three = &daily_means[daily_means.len().saturating_sub(3)..];
    let field_series = |index: usize| -> Vec<f64> {
        last_three.iter().map(|(_, means)| means[index]).collect()
    };

    TrendReport {
        temperature: field_trend(&field_series(FIELD_TEMP)),
        humidity: field_trend(&field_series(FIELD_HUM)),
        co2: field_trend(&field_series(FIELD_CO2)),
        daily_averages: daily_means
            .iter()
            .map(|(date, means)| DailyAverage {
                date: date.format("%Y-%m-%d").to_string(),
                average_temp: means[FIELD_TEMP],
                average_hum: means[FIELD_HUM],
                average_co2: means[FIELD_CO2],
            })
            .collect(),
    }
}

fn field_trend(daily_means: &[f64]) -> FieldTrend {
    let Some((first, last)) = daily_means.first().zip(daily_means.last()) else {
        return FieldTrend {
            trend: TrendDirection::Stable,
            start: 0.0,
            end: 0.0,
            overall_average: 0.0,
            variability: "±0.00".to_string(),
        };
    };

    let trend = if last > first {
        TrendDirection::Rising
    } else if last < first {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };

    let overall_average = round2(daily_means.iter().sum::<f64>() / daily_means.len() as f64);
    let std_dev = if daily_means.len() > 1 {
        daily_means.iter().copied().population_std_dev()
    } else {
        0.0
    };

    FieldTrend {
        trend,
        start: *first,
        end: *last,
        overall_average,
        variability: format!("±{:.2}", round2(std_dev)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Dublin;

    fn reading(day: u32, co2: f64, temp: f64, hum: f64) -> Reading {
        Reading {
            id: None,
            timestamp: Dublin
                .with_ymd_and_hms(2024, 6, day, 12, 0, 0)
                .single()
                .expect("unambiguous local time"),
            values: vec![Some(co2), Some(temp), Some(hum)],
        }
    }

    #[test]
    fn detects_falling_temperature_over_three_days() {
        let readings = vec![
            reading(10, 600.0, 20.0, 55.0),
            reading(11, 610.0, 22.0, 56.0),
            reading(12, 620.0, 19.0, 57.0),
        ];
        let report = analyze(&readings);

        assert_eq!(report.temperature.trend, TrendDirection::Falling);
        assert_eq!(report.temperature.start, 20.0);
        assert_eq!(report.temperature.end, 19.0);
        assert_eq!(report.temperature.overall_average, 20.33);
        assert_eq!(report.temperature.variability, "±1.25");

        assert_eq!(report.co2.trend, TrendDirection::Rising);
        assert_eq!(report.daily_averages.len(), 3);
        assert_eq!(report.daily_averages[0].date, "2024-06-10");
    }

    #[test]
    fn equal_first_and_last_day_is_stable() {
        let readings = vec![
            reading(10, 600.0, 21.0, 55.0),
            reading(11, 600.0, 25.0, 55.0),
            reading(12, 600.0, 21.0, 55.0),
        ];
        let report = analyze(&readings);
        assert_eq!(report.temperature.trend, TrendDirection::Stable);
        assert_eq!(report.co2.trend, TrendDirection::Stable);
    }

    #[test]
    fn daily_means_truncate_before_averaging() {
        let readings = vec![
            reading(10, 600.9, 20.9, 55.9),
            reading(10, 600.9, 20.1, 55.1),
        ];
        let report = analyze(&readings);
        assert_eq!(report.daily_averages[0].average_temp, 20.0);
        assert_eq!(report.daily_averages[0].average_co2, 600.0);
    }

    #[test]
    fn no_data_yields_stable_zero_report() {
        let report = analyze(&[]);
        assert_eq!(report.temperature.trend, TrendDirection::Stable);
        assert_eq!(report.temperature.start, 0.0);
        assert_eq!(report.temperature.end, 0.0);
        assert_eq!(report.temperature.overall_average, 0.0);
        assert_eq!(report.temperature.variability, "±0.00");
        assert!(report.daily_averages.is_empty());
    }

    #[test]
    fn only_the_last_three_days_feed_the_trend() {
        let readings = vec![
            reading(8, 600.0, 30.0, 55.0),
            reading(10, 600.0, 20.0, 55.0),
            reading(11, 600.0, 21.0, 55.0),
            reading(12, 600.0, 22.0, 55.0),
        ];
        let report = analyze(&readings);
        assert_eq!(report.temperature.start, 20.0);
        assert_eq!(report.temperature.trend, TrendDirection::Rising);
        // All days still appear in the reference section.
        assert_eq!(report.daily_averages.len(), 4);
    }
}
