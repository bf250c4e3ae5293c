use serde::{Deserialize, Serialize};
use skysync_weather::Condition;
use std::fmt;
use std::str::FromStr;

/// Seasonal context supplied with a prediction request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Season {
    #[default]
    Summer,
    Winter,
    Monsoon,
    SpringAutumn,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Summer,
        Season::Winter,
        Season::Monsoon,
        Season::SpringAutumn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summer => "Summer",
            Self::Winter => "Winter",
            Self::Monsoon => "Monsoon",
            Self::SpringAutumn => "Spring/Autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown season: {0} (expected Summer, Winter, Monsoon or Spring/Autumn)")]
pub struct ParseSeasonError(String);

impl FromStr for Season {
    type Err = ParseSeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" => Ok(Self::Summer),
            "winter" => Ok(Self::Winter),
            "monsoon" => Ok(Self::Monsoon),
            "spring/autumn" | "spring" | "autumn" | "fall" => Ok(Self::SpringAutumn),
            _ => Err(ParseSeasonError(s.to_string())),
        }
    }
}

/// Manually entered atmospheric parameters.
/// Values are taken as-is; implausible inputs flow through the arithmetic unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// °C
    pub temperature: f64,
    /// Percent
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// km/h
    pub wind_speed: f64,
    pub season: Season,
}

impl Default for PredictionInput {
    fn default() -> Self {
        Self {
            temperature: 24.5,
            humidity: 65.0,
            pressure: 1013.0,
            wind_speed: 12.0,
            season: Season::Summer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub temperature: f64,
    pub humidity: f64,
    /// mm
    pub rainfall: f64,
    pub wind_speed: f64,
    pub condition: Condition,
    /// 0..=1
    pub confidence: f64,
    pub reasoning: String,
}

/// Range the confidence jitter is drawn from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBand {
    min: f64,
    max: f64,
}

impl ConfidenceBand {
    /// Bounds are ordered and clamped into 0..=1
    pub fn new(a: f64, b: f64) -> Self {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        Self {
            min: min.clamp(0.0, 1.0),
            max: max.clamp(0.0, 1.0),
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Default for ConfidenceBand {
    fn default() -> Self {
        Self::new(0.92, 0.97)
    }
}
