// ABOUTME: Closed enumeration of supported vital-sign and activity metrics
// ABOUTME: Caller identifiers are normalized here once, unknown values are rejected early
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::VitalsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single vital-sign or activity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Daily resting heart rate (or zone average)
    HeartRate,
    /// Daily step count
    Steps,
    /// Daily calories burned
    Calories,
    /// Daily distance
    Distance,
    /// Daily floors climbed
    Floors,
    /// Nightly sleep duration
    SleepDuration,
    /// Body weight log
    Weight,
    /// Body fat percentage log
    BodyFat,
    /// Nightly average blood oxygen saturation
    OxygenSaturation,
    /// Nightly breathing rate
    RespiratoryRate,
    /// Daily heart rate variability (RMSSD)
    #[serde(rename = "hrv")]
    HeartRateVariability,
    /// Nightly relative skin temperature
    SkinTemperature,
}

impl Metric {
    /// Every supported metric, in registry order
    pub const ALL: [Self; 12] = [
        Self::HeartRate,
        Self::Steps,
        Self::Calories,
        Self::Distance,
        Self::Floors,
        Self::SleepDuration,
        Self::Weight,
        Self::BodyFat,
        Self::OxygenSaturation,
        Self::RespiratoryRate,
        Self::HeartRateVariability,
        Self::SkinTemperature,
    ];

    /// Canonical lowercase identifier (used in cache keys and logs)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeartRate => "heart_rate",
            Self::Steps => "steps",
            Self::Calories => "calories",
            Self::Distance => "distance",
            Self::Floors => "floors",
            Self::SleepDuration => "sleep_duration",
            Self::Weight => "weight",
            Self::BodyFat => "body_fat",
            Self::OxygenSaturation => "oxygen_saturation",
            Self::RespiratoryRate => "respiratory_rate",
            Self::HeartRateVariability => "hrv",
            Self::SkinTemperature => "skin_temperature",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        let metric = match normalized.as_str() {
            "heart_rate" | "heartrate" => Self::HeartRate,
            "steps" => Self::Steps,
            "calories" => Self::Calories,
            "distance" => Self::Distance,
            "floors" => Self::Floors,
            "sleep_duration" | "sleep" => Self::SleepDuration,
            "weight" => Self::Weight,
            "body_fat" | "fat" => Self::BodyFat,
            "oxygen_saturation" | "spo2" => Self::OxygenSaturation,
            "respiratory_rate" | "breathing_rate" => Self::RespiratoryRate,
            "hrv" | "heart_rate_variability" => Self::HeartRateVariability,
            "skin_temperature" | "temperature" => Self::SkinTemperature,
            _ => {
                return Err(VitalsError::UnsupportedMetric {
                    metric: s.to_owned(),
                })
            }
        };
        Ok(metric)
    }
}
