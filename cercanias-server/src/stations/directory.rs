//! Built-in station directory.

use serde::Serialize;

use crate::domain::StationCode;

use super::error::UnknownStation;

/// Stations served by the Murcia/Alicante network, in display order.
const BUILTIN_STATIONS: &[(&str, &str)] = &[
    ("Alacant Terminal", "60911"),
    ("Sant Vicent Centre", "60913"),
    ("Murcia del Carmen", "61200"),
    ("Elx Parc", "62103"),
    ("Torrellano", "62104"),
    ("Beniel", "62001"),
    ("Lorca-Sutullena", "06006"),
    ("Orihuela Miguel Hernández", "62002"),
];

/// A named station with its carrier code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    pub name: String,
    #[serde(serialize_with = "serialize_code")]
    pub code: StationCode,
}

fn serialize_code<S: serde::Serializer>(code: &StationCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(code.as_str())
}

/// Immutable station name → code mapping.
///
/// Lookups are exact and case-sensitive on the human-readable name.
#[derive(Debug, Clone)]
pub struct StationDirectory {
    stations: Vec<Station>,
}

impl StationDirectory {
    /// The directory compiled into the binary.
    pub fn builtin() -> Self {
        let stations = BUILTIN_STATIONS
            .iter()
            .filter_map(|(name, code)| {
                StationCode::parse(code).ok().map(|code| Station {
                    name: (*name).to_string(),
                    code,
                })
            })
            .collect();

        Self { stations }
    }

    /// Build a directory from explicit entries.
    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    /// Resolve a station name to its carrier code.
    pub fn resolve(&self, name: &str) -> Result<StationCode, UnknownStation> {
        self.stations
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.code)
            .ok_or_else(|| UnknownStation {
                name: name.to_string(),
            })
    }

    /// All stations, in directory order.
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Number of stations in the directory.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Check if the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

impl Default for StationDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}
