//! Descriptive statistics over an hourly series.

use crate::types::{Condition, WeatherPoint};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// |r| at or above which a correlation is called out as a relationship
const CORRELATION_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CorrelationKind {
    Inverse,
    Direct,
    Weak,
}

impl CorrelationKind {
    pub fn classify(r: f64) -> Self {
        if r <= -CORRELATION_THRESHOLD {
            Self::Inverse
        } else if r >= CORRELATION_THRESHOLD {
            Self::Direct
        } else {
            Self::Weak
        }
    }
}

impl fmt::Display for CorrelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inverse => "inverse",
            Self::Direct => "direct",
            Self::Weak => "weak",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    pub coefficient: f64,
    pub kind: CorrelationKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySummary {
    pub samples: usize,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub mean_temperature: f64,
    pub mean_humidity: f64,
    pub total_rainfall: f64,
    /// Hour with the strongest wind, and its speed
    pub peak_wind: (NaiveDateTime, f64),
    /// Hours per condition, in [`Condition::ALL`] order
    pub conditions: Vec<(Condition, usize)>,
    /// Temperature against humidity; absent for flat or single-sample series
    pub temperature_humidity: Option<Correlation>,
}

impl HourlySummary {
    /// Summarize `points`. Returns `None` for an empty series.
    pub fn from_points(points: &[WeatherPoint]) -> Option<Self> {
        let first = points.first()?;
        let n = points.len() as f64;

        let mut min_temperature = f64::INFINITY;
        let mut max_temperature = f64::NEG_INFINITY;
        let mut temp_sum = 0.0;
        let mut humidity_sum = 0.0;
        let mut total_rainfall = 0.0;
        let mut peak_wind = (first.timestamp, first.wind_speed);

        for p in points {
            min_temperature = min_temperature.min(p.temperature);
            max_temperature = max_temperature.max(p.temperature);
            temp_sum += p.temperature;
            humidity_sum += p.humidity;
            total_rainfall += p.rainfall;
            if p.wind_speed > peak_wind.1 {
                peak_wind = (p.timestamp, p.wind_speed);
            }
        }

        let conditions = Condition::ALL
            .iter()
            .map(|&c| (c, points.iter().filter(|p| p.condition == c).count()))
            .collect();

        let temperature_humidity =
            pearson(points.iter().map(|p| (p.temperature, p.humidity))).map(|r| Correlation {
                coefficient: r,
                kind: CorrelationKind::classify(r),
            });

        Some(Self {
            samples: points.len(),
            min_temperature,
            max_temperature,
            mean_temperature: temp_sum / n,
            mean_humidity: humidity_sum / n,
            total_rainfall,
            peak_wind,
            conditions,
            temperature_humidity,
        })
    }

    /// Most frequent condition; ties go to the calmer one
    pub fn dominant_condition(&self) -> Condition {
        self.conditions
            .iter()
            .fold((Condition::default(), 0), |best, &(c, count)| {
                if count > best.1 {
                    (c, count)
                } else {
                    best
                }
            })
            .0
    }
}

/// Pearson correlation coefficient. `None` for fewer than two pairs or zero variance.
pub fn pearson(pairs: impl Iterator<Item = (f64, f64)> + Clone) -> Option<f64> {
    let n = pairs.clone().count();
    if n < 2 {
        return None;
    }

    let n_f = n as f64;
    let (sum_x, sum_y) = pairs
        .clone()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (mean_x, mean_y) = (sum_x / n_f, sum_y / n_f);

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn point(hour: i64, temperature: f64, humidity: f64) -> WeatherPoint {
        let midnight = NaiveDate::from_ymd_opt(2026, 10, 18)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        WeatherPoint {
            timestamp: midnight + Duration::hours(hour),
            temperature,
            humidity,
            pressure: 1012.0,
            wind_speed: 5.0,
            rainfall: 0.0,
            condition: Condition::Sunny,
        }
    }

    #[test]
    fn test_empty_series_has_no_summary() {
        assert!(HourlySummary::from_points(&[]).is_none());
    }

    #[test]
    fn test_basic_statistics() {
        let mut points = vec![point(0, 10.0, 80.0), point(1, 14.0, 70.0), point(2, 18.0, 60.0)];
        points[1].rainfall = 1.5;
        points[2].rainfall = 0.5;
        points[1].wind_speed = 22.0;
        points[2].condition = Condition::Rainy;

        let s = HourlySummary::from_points(&points).unwrap();
        assert_eq!(s.samples, 3);
        assert_eq!(s.min_temperature, 10.0);
        assert_eq!(s.max_temperature, 18.0);
        assert_eq!(s.mean_temperature, 14.0);
        assert_eq!(s.mean_humidity, 70.0);
        assert_eq!(s.total_rainfall, 2.0);
        assert_eq!(s.peak_wind, (points[1].timestamp, 22.0));
        assert_eq!(
            s.conditions,
            vec![
                (Condition::Sunny, 2),
                (Condition::Cloudy, 0),
                (Condition::Rainy, 1),
                (Condition::Storm, 0)
            ]
        );
        assert_eq!(s.dominant_condition(), Condition::Sunny);
    }

    #[test]
    fn test_inverse_correlation() {
        let points: Vec<_> = (0..6)
            .map(|h| point(h, 15.0 + h as f64, 90.0 - 4.0 * h as f64))
            .collect();
        let c = HourlySummary::from_points(&points)
            .unwrap()
            .temperature_humidity
            .unwrap();
        assert!((c.coefficient + 1.0).abs() < 1e-9);
        assert_eq!(c.kind, CorrelationKind::Inverse);
    }

    #[test]
    fn test_flat_series_has_no_correlation() {
        let points: Vec<_> = (0..4).map(|h| point(h, 20.0, 50.0 + h as f64)).collect();
        assert!(HourlySummary::from_points(&points)
            .unwrap()
            .temperature_humidity
            .is_none());
    }

    #[test]
    fn test_single_point() {
        let s = HourlySummary::from_points(&[point(0, 20.0, 50.0)]).unwrap();
        assert!(s.temperature_humidity.is_none());
        assert_eq!(s.min_temperature, s.max_temperature);
    }

    #[test]
    fn test_correlation_classification() {
        assert_eq!(CorrelationKind::classify(-0.3), CorrelationKind::Inverse);
        assert_eq!(CorrelationKind::classify(0.29), CorrelationKind::Weak);
        assert_eq!(CorrelationKind::classify(0.0), CorrelationKind::Weak);
        assert_eq!(CorrelationKind::classify(0.8), CorrelationKind::Direct);
    }

    #[test]
    fn test_pearson_direct() {
        let r = pearson([(1.0, 2.0), (2.0, 4.1), (3.0, 5.9)].into_iter()).unwrap();
        assert!(r > 0.99);
    }
}
