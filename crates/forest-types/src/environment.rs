//! Environment modes selectable from the operator dashboard.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum TimeMode {
    /// Bright daylight sky with the sun disc.
    #[default]
    Morning,
    /// Moon, stars, and fireflies.
    Night,
}

/// Weather overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum WeatherMode {
    /// No precipitation.
    #[default]
    Sunny,
    /// Falling rain streaks under an overcast sky.
    Rain,
    /// Drifting snow and a frosted ground.
    Snow,
}
