// ABOUTME: Static endpoint registry mapping each metric to its Fitbit request and response shape
// ABOUTME: Path templates, maximum range span, series location, value path, unit and transform
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Endpoint registry
//!
//! Every [`Metric`] resolves to exactly one [`EndpointDescriptor`]. The table is
//! compiled in and never mutated; lookups are infallible because the metric
//! enumeration is closed.

use serde::Serialize;
use vitals_core::errors::VitalsResult;
use vitals_core::models::Metric;

/// Where the series array lives in a provider response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesLocation {
    /// Under a top-level key (`{"activities-steps": [...]}`)
    Key(&'static str),
    /// The response body itself is the array
    Root,
}

/// Conversion applied once to every extracted value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ValueTransform {
    /// Value is used as delivered
    Identity,
    /// Value is divided by the factor (minutes to hours is `DivideBy(60.0)`)
    DivideBy(f64),
}

impl ValueTransform {
    /// Apply the transform
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Identity => value,
            Self::DivideBy(divisor) => value / divisor,
        }
    }
}

/// How to call and parse one metric's endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointDescriptor {
    /// Metric served by this endpoint
    pub metric: Metric,
    /// Path used when the caller gives no range
    pub default_path: &'static str,
    /// Single-day path, `{date}` placeholder
    pub daily_path: Option<&'static str>,
    /// Range path, `{start}` and `{end}` placeholders
    pub range_path: Option<&'static str>,
    /// Prefix for the generic `{base}/{start}/{end}.json` shape
    pub base_path: &'static str,
    /// Longest range the provider accepts, inclusive of both ends
    pub max_range_days: i64,
    /// Location of the series array
    pub series: SeriesLocation,
    /// Flat key or dotted path to the value inside one entry
    pub value_path: &'static str,
    /// Key holding the entry timestamp
    pub timestamp_key: &'static str,
    /// Display unit attached to every record
    pub unit: &'static str,
    /// Conversion applied to every value
    pub transform: ValueTransform,
}

impl EndpointDescriptor {
    /// Path for a single day
    #[must_use]
    pub fn daily(&self, date: &str) -> Option<String> {
        self.daily_path.map(|template| template.replace("{date}", date))
    }

    /// Path for an inclusive date range
    #[must_use]
    pub fn range(&self, start: &str, end: &str) -> String {
        self.range_path.map_or_else(
            || format!("{}/{start}/{end}.json", self.base_path),
            |template| template.replace("{start}", start).replace("{end}", end),
        )
    }
}

const HEART_RATE: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::HeartRate,
    default_path: "/1/user/-/activities/heart/date/today/7d.json",
    daily_path: Some("/1/user/-/activities/heart/date/{date}/1d.json"),
    range_path: Some("/1/user/-/activities/heart/date/{start}/{end}.json"),
    base_path: "/1/user/-/activities/heart/date",
    max_range_days: 365,
    series: SeriesLocation::Key("activities-heart"),
    value_path: "value.restingHeartRate",
    timestamp_key: "dateTime",
    unit: "bpm",
    transform: ValueTransform::Identity,
};

const STEPS: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::Steps,
    default_path: "/1/user/-/activities/steps/date/today/7d.json",
    daily_path: Some("/1/user/-/activities/steps/date/{date}/1d.json"),
    range_path: None,
    base_path: "/1/user/-/activities/steps/date",
    max_range_days: 1095,
    series: SeriesLocation::Key("activities-steps"),
    value_path: "value",
    timestamp_key: "dateTime",
    unit: "steps",
    transform: ValueTransform::Identity,
};

const CALORIES: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::Calories,
    default_path: "/1/user/-/activities/calories/date/today/7d.json",
    daily_path: Some("/1/user/-/activities/calories/date/{date}/1d.json"),
    range_path: None,
    base_path: "/1/user/-/activities/calories/date",
    max_range_days: 1095,
    series: SeriesLocation::Key("activities-calories"),
    value_path: "value",
    timestamp_key: "dateTime",
    unit: "kcal",
    transform: ValueTransform::Identity,
};

const DISTANCE: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::Distance,
    default_path: "/1/user/-/activities/distance/date/today/7d.json",
    daily_path: Some("/1/user/-/activities/distance/date/{date}/1d.json"),
    range_path: None,
    base_path: "/1/user/-/activities/distance/date",
    max_range_days: 1095,
    series: SeriesLocation::Key("activities-distance"),
    value_path: "value",
    timestamp_key: "dateTime",
    unit: "km",
    transform: ValueTransform::Identity,
};

const FLOORS: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::Floors,
    default_path: "/1/user/-/activities/floors/date/today/7d.json",
    daily_path: Some("/1/user/-/activities/floors/date/{date}/1d.json"),
    range_path: None,
    base_path: "/1/user/-/activities/floors/date",
    max_range_days: 1095,
    series: SeriesLocation::Key("activities-floors"),
    value_path: "value",
    timestamp_key: "dateTime",
    unit: "floors",
    transform: ValueTransform::Identity,
};

const SLEEP_DURATION: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::SleepDuration,
    default_path: "/1.2/user/-/sleep/list.json?sort=desc&offset=0&limit=7",
    daily_path: Some("/1.2/user/-/sleep/date/{date}.json"),
    range_path: Some("/1.2/user/-/sleep/date/{start}/{end}.json"),
    base_path: "/1.2/user/-/sleep/date",
    max_range_days: 100,
    series: SeriesLocation::Key("sleep"),
    value_path: "minutesAsleep",
    timestamp_key: "dateOfSleep",
    unit: "hours",
    transform: ValueTransform::DivideBy(60.0),
};

const WEIGHT: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::Weight,
    default_path: "/1/user/-/body/log/weight/date/today/7d.json",
    daily_path: Some("/1/user/-/body/log/weight/date/{date}.json"),
    range_path: Some("/1/user/-/body/log/weight/date/{start}/{end}.json"),
    base_path: "/1/user/-/body/log/weight/date",
    max_range_days: 31,
    series: SeriesLocation::Key("weight"),
    value_path: "weight",
    timestamp_key: "date",
    unit: "kg",
    transform: ValueTransform::Identity,
};

const BODY_FAT: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::BodyFat,
    default_path: "/1/user/-/body/log/fat/date/today/7d.json",
    daily_path: Some("/1/user/-/body/log/fat/date/{date}.json"),
    range_path: Some("/1/user/-/body/log/fat/date/{start}/{end}.json"),
    base_path: "/1/user/-/body/log/fat/date",
    max_range_days: 31,
    series: SeriesLocation::Key("fat"),
    value_path: "fat",
    timestamp_key: "date",
    unit: "%",
    transform: ValueTransform::Identity,
};

const OXYGEN_SATURATION: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::OxygenSaturation,
    default_path: "/1/user/-/spo2/date/today.json",
    daily_path: Some("/1/user/-/spo2/date/{date}.json"),
    range_path: Some("/1/user/-/spo2/date/{start}/{end}.json"),
    base_path: "/1/user/-/spo2/date",
    max_range_days: 30,
    series: SeriesLocation::Root,
    value_path: "value.avg",
    timestamp_key: "dateTime",
    unit: "%",
    transform: ValueTransform::Identity,
};

const RESPIRATORY_RATE: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::RespiratoryRate,
    default_path: "/1/user/-/br/date/today.json",
    daily_path: Some("/1/user/-/br/date/{date}.json"),
    range_path: Some("/1/user/-/br/date/{start}/{end}.json"),
    base_path: "/1/user/-/br/date",
    max_range_days: 30,
    series: SeriesLocation::Key("br"),
    value_path: "value.breathingRate",
    timestamp_key: "dateTime",
    unit: "breaths/min",
    transform: ValueTransform::Identity,
};

const HRV: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::HeartRateVariability,
    default_path: "/1/user/-/hrv/date/today.json",
    daily_path: Some("/1/user/-/hrv/date/{date}.json"),
    range_path: Some("/1/user/-/hrv/date/{start}/{end}.json"),
    base_path: "/1/user/-/hrv/date",
    max_range_days: 30,
    series: SeriesLocation::Key("hrv"),
    value_path: "value.dailyRmssd",
    timestamp_key: "dateTime",
    unit: "ms",
    transform: ValueTransform::Identity,
};

const SKIN_TEMPERATURE: EndpointDescriptor = EndpointDescriptor {
    metric: Metric::SkinTemperature,
    default_path: "/1/user/-/temp/skin/date/today.json",
    daily_path: Some("/1/user/-/temp/skin/date/{date}.json"),
    range_path: Some("/1/user/-/temp/skin/date/{start}/{end}.json"),
    base_path: "/1/user/-/temp/skin/date",
    max_range_days: 30,
    series: SeriesLocation::Key("tempSkin"),
    value_path: "value.nightlyRelative",
    timestamp_key: "dateTime",
    unit: "°C",
    transform: ValueTransform::Identity,
};

/// Descriptor for `metric`
#[must_use]
pub const fn descriptor(metric: Metric) -> &'static EndpointDescriptor {
    match metric {
        Metric::HeartRate => &HEART_RATE,
        Metric::Steps => &STEPS,
        Metric::Calories => &CALORIES,
        Metric::Distance => &DISTANCE,
        Metric::Floors => &FLOORS,
        Metric::SleepDuration => &SLEEP_DURATION,
        Metric::Weight => &WEIGHT,
        Metric::BodyFat => &BODY_FAT,
        Metric::OxygenSaturation => &OXYGEN_SATURATION,
        Metric::RespiratoryRate => &RESPIRATORY_RATE,
        Metric::HeartRateVariability => &HRV,
        Metric::SkinTemperature => &SKIN_TEMPERATURE,
    }
}

/// Resolve a caller-supplied identifier to its descriptor
///
/// # Errors
///
/// Returns `UnsupportedMetric` for identifiers outside the registry
pub fn lookup(identifier: &str) -> VitalsResult<&'static EndpointDescriptor> {
    identifier.parse::<Metric>().map(descriptor)
}

/// Every descriptor, in metric order
pub fn all() -> impl Iterator<Item = &'static EndpointDescriptor> {
    Metric::ALL.into_iter().map(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_metric_has_matching_descriptor() {
        for metric in Metric::ALL {
            assert_eq!(descriptor(metric).metric, metric);
        }
    }

    #[test]
    fn test_generic_range_fallback() {
        assert_eq!(
            STEPS.range("2024-01-01", "2024-01-07"),
            "/1/user/-/activities/steps/date/2024-01-01/2024-01-07.json"
        );
        assert_eq!(
            WEIGHT.range("2024-01-01", "2024-01-07"),
            "/1/user/-/body/log/weight/date/2024-01-01/2024-01-07.json"
        );
    }

    #[test]
    fn test_sleep_transform_divides_minutes() {
        assert!((SLEEP_DURATION.transform.apply(120.0) - 2.0).abs() < f64::EPSILON);
        assert!((ValueTransform::Identity.apply(61.0) - 61.0).abs() < f64::EPSILON);
    }
}
