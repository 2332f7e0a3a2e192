// ABOUTME: Health platform provider enumeration with case-insensitive parsing
// ABOUTME: Fitbit is the single implemented provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::oauth;
use crate::errors::VitalsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// External health platform supplying wearable data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Fitbit Web API
    Fitbit,
}

impl Provider {
    /// Stable lowercase identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fitbit => oauth::FITBIT,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            oauth::FITBIT => Ok(Self::Fitbit),
            _ => Err(VitalsError::UnsupportedProvider {
                provider: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse_is_case_insensitive() {
        assert_eq!("Fitbit".parse::<Provider>().unwrap(), Provider::Fitbit);
        assert_eq!(" FITBIT ".parse::<Provider>().unwrap(), Provider::Fitbit);
        assert!(matches!(
            "google_fit".parse::<Provider>(),
            Err(VitalsError::UnsupportedProvider { .. })
        ));
    }
}
