use crate::services::trend::TrendReport;

/// Renders a trend report into human-readable summary lines. Held behind a
/// trait so the renderer can be swapped without touching the analyzer.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, trends: &TrendReport) -> Vec<String>;
}

/// Default renderer: one line per field with the daily range, the overall
/// average, and a recommendation against the greenhouse operating bands
/// (20-30 degC, 50-70 %RH, 400-1000 ppm CO2).
#[derive(Debug, Default, Clone, Copy)]
pub struct ThresholdSummarizer;

impl Summarizer for ThresholdSummarizer {
    fn summarize(&self, trends: &TrendReport) -> Vec<String> {
        vec![
            format!(
                "Daily Temperature: {}°C to {}°C. Overall Avg: {}°C ({}). {}",
                trends.temperature.start,
                trends.temperature.end,
                trends.temperature.overall_average,
                trends.temperature.variability,
                temperature_recommendation(trends.temperature.overall_average),
            ),
            format!(
                "Daily Humidity: {}% to {}%. Overall Avg: {}% ({}). {}",
                trends.humidity.start,
                trends.humidity.end,
                trends.humidity.overall_average,
                trends.humidity.variability,
                humidity_recommendation(trends.humidity.overall_average),
            ),
            format!(
                "Daily CO2: {}ppm to {}ppm. Overall Avg: {}ppm ({}). {}",
                trends.co2.start,
                trends.co2.end,
                trends.co2.overall_average,
                trends.co2.variability,
                co2_recommendation(trends.co2.overall_average),
            ),
        ]
    }
}

fn temperature_recommendation(average: f64) -> &'static str {
    if average > 30.0 {
        "Too hot. Increase ventilation or shading."
    } else if average < 20.0 {
        "Too cold. Consider heating."
    } else {
        "Temperature is optimal."
    }
}

fn humidity_recommendation(average: f64) -> &'static str {
    if average > 70.0 {
        "High humidity. Increase ventilation."
    } else if average < 50.0 {
        "Low humidity. Add water."
    } else {
        "Humidity is optimal."
    }
}

fn co2_recommendation(average: f64) -> &'static str {
    if average > 1000.0 {
        "High CO2 levels. Ventilate the greenhouse."
    } else if average < 400.0 {
        "Low CO2 levels. Consider adding CO2."
    } else {
        "CO2 levels are optimal."
    }
}
