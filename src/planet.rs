use clap::ValueEnum;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// One of the three fixed destinations the voyage can aim for.
///
/// Serialized by its lowercase id (`"moon"`, `"mars"`, `"saturn"`), which is
/// also the wire form used inside the persisted snapshot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Planet {
    Moon,
    Mars,
    Saturn,
}

/// Static display/conversion data for a destination. All instances are
/// compile-time constants; there is no user-configurable destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetInfo {
    pub name: &'static str,
    pub glyph: &'static str,
    pub total_km: f64,
    pub km_per_minute: f64,
    /// Minutes required to cover `total_km` at `km_per_minute`. Informational.
    pub total_minutes: u64,
    pub accent: Color,
    pub description: &'static str,
}

const MOON: PlanetInfo = PlanetInfo {
    name: "Moon",
    glyph: "🌕",
    total_km: 384_400.0,
    km_per_minute: 10.0,
    total_minutes: 38_440,
    accent: Color::Blue,
    description: "A cozy short-term journey",
};

const MARS: PlanetInfo = PlanetInfo {
    name: "Mars",
    glyph: "🔴",
    total_km: 225_000_000.0,
    km_per_minute: 500.0,
    total_minutes: 450_000,
    accent: Color::Red,
    description: "An ambitious medium-term goal",
};

const SATURN: PlanetInfo = PlanetInfo {
    name: "Saturn",
    glyph: "🪐",
    total_km: 1_400_000_000.0,
    km_per_minute: 3_500.0,
    total_minutes: 400_000,
    accent: Color::Magenta,
    description: "The ultimate long-term odyssey",
};

impl Planet {
    pub const ALL: [Planet; 3] = [Planet::Moon, Planet::Mars, Planet::Saturn];

    pub fn info(&self) -> &'static PlanetInfo {
        match self {
            Planet::Moon => &MOON,
            Planet::Mars => &MARS,
            Planet::Saturn => &SATURN,
        }
    }

    /// Lowercase id as stored in the snapshot (`"moon"`, ...).
    pub fn id(&self) -> String {
        self.to_string().to_lowercase()
    }

    pub fn next(&self) -> Planet {
        match self {
            Planet::Moon => Planet::Mars,
            Planet::Mars => Planet::Saturn,
            Planet::Saturn => Planet::Moon,
        }
    }

    pub fn prev(&self) -> Planet {
        match self {
            Planet::Moon => Planet::Saturn,
            Planet::Mars => Planet::Moon,
            Planet::Saturn => Planet::Mars,
        }
    }
}
