use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::planet::Planet;

/// The single store key the tracker reads and writes.
pub const STORE_KEY: &str = "lunalog-data";

/// Retained session history is a display window, not the source of truth
/// for the total; older entries are evicted silently.
pub const MAX_RECENT_SESSIONS: usize = 10;

/// One committed block of study time. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Creation timestamp, milliseconds since the epoch.
    pub id: i64,
    pub minutes: u64,
    #[serde(default)]
    pub mood: String,
    /// ISO-8601 timestamp of the commit.
    pub date: String,
    /// Destination selected at the time of logging.
    pub planet: Planet,
    pub km_traveled: f64,
}

impl SessionRecord {
    /// Build a record for `minutes` committed toward `planet` right now.
    pub fn new(minutes: u64, mood: &str, planet: Planet) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            minutes,
            mood: mood.to_string(),
            date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            planet,
            km_traveled: minutes as f64 * planet.info().km_per_minute,
        }
    }
}

/// The full persisted state, written as one unit after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "Snapshot::default_planet")]
    pub selected_planet: Planet,
    #[serde(default)]
    pub total_minutes: u64,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            selected_planet: Planet::Moon,
            total_minutes: 0,
            sessions: Vec::new(),
        }
    }
}

impl Snapshot {
    fn default_planet() -> Planet {
        Planet::Moon
    }

    /// Parse a stored snapshot. A malformed value is treated the same as
    /// no prior data: every field defaults.
    pub fn decode(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_record_derives_km_from_rate() {
        let rec = SessionRecord::new(30, "focused", Planet::Moon);
        assert_eq!(rec.minutes, 30);
        assert_eq!(rec.km_traveled, 300.0);
        assert_eq!(rec.planet, Planet::Moon);

        let rec = SessionRecord::new(30, "", Planet::Saturn);
        assert_eq!(rec.km_traveled, 105_000.0);
    }

    #[test]
    fn session_record_date_is_iso8601() {
        let rec = SessionRecord::new(1, "", Planet::Moon);
        assert!(chrono::DateTime::parse_from_rfc3339(&rec.date).is_ok());
        assert!(rec.date.ends_with('Z'));
    }

    #[test]
    fn snapshot_wire_field_names() {
        let snap = Snapshot {
            selected_planet: Planet::Mars,
            total_minutes: 45,
            sessions: vec![SessionRecord {
                id: 1722945600000,
                minutes: 45,
                mood: "steady".into(),
                date: "2026-08-06T12:00:00.000Z".into(),
                planet: Planet::Mars,
                km_traveled: 22_500.0,
            }],
        };

        let value: serde_json::Value = serde_json::from_str(&snap.encode()).unwrap();
        assert_eq!(value["selectedPlanet"], "mars");
        assert_eq!(value["totalMinutes"], 45);
        let session = &value["sessions"][0];
        assert_eq!(session["id"], 1722945600000i64);
        assert_eq!(session["minutes"], 45);
        assert_eq!(session["mood"], "steady");
        assert_eq!(session["date"], "2026-08-06T12:00:00.000Z");
        assert_eq!(session["planet"], "mars");
        assert_eq!(session["kmTraveled"], 22_500.0);
    }

    #[test]
    fn snapshot_roundtrips() {
        let snap = Snapshot {
            selected_planet: Planet::Saturn,
            total_minutes: 120,
            sessions: vec![SessionRecord::new(120, "locked in", Planet::Saturn)],
        };
        assert_eq!(Snapshot::decode(&snap.encode()), snap);
    }

    #[test]
    fn malformed_snapshot_decodes_to_defaults() {
        for raw in ["", "not json", "[1,2,3]", "{\"selectedPlanet\":\"pluto\"}"] {
            let snap = Snapshot::decode(raw);
            assert_eq!(snap.selected_planet, Planet::Moon);
            assert_eq!(snap.total_minutes, 0);
            assert!(snap.sessions.is_empty());
        }
    }

    #[test]
    fn partial_snapshot_defaults_missing_fields() {
        let snap = Snapshot::decode("{\"totalMinutes\":7}");
        assert_eq!(snap.selected_planet, Planet::Moon);
        assert_eq!(snap.total_minutes, 7);
        assert!(snap.sessions.is_empty());
    }
}
