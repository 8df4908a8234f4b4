//! Origin/destination routes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when building a route with a missing station.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRoute {
    #[error("route origin is empty")]
    EmptyOrigin,

    #[error("route destination is empty")]
    EmptyDestination,
}

/// An ordered pair of station names.
///
/// Both names are always non-empty: a route is either fully set or absent
/// (`Option<Route>`), never half-configured. Names are not checked against
/// the station directory here; that happens when a fetch resolves them.
///
/// # Examples
///
/// ```
/// use cercanias_server::domain::Route;
///
/// let route = Route::new("Alacant Terminal", "Elx Parc").unwrap();
/// assert_eq!(route.to_string(), "Alacant Terminal → Elx Parc");
/// assert_eq!(route.swapped().origin(), "Elx Parc");
///
/// assert!(Route::new("", "Elx Parc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    origin: String,
    destination: String,
}

impl Route {
    /// Create a route, rejecting empty station names.
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<Self, InvalidRoute> {
        let origin = origin.into();
        let destination = destination.into();

        if origin.is_empty() {
            return Err(InvalidRoute::EmptyOrigin);
        }
        if destination.is_empty() {
            return Err(InvalidRoute::EmptyDestination);
        }

        Ok(Self {
            origin,
            destination,
        })
    }

    /// Build a route from persisted fields.
    ///
    /// Returns `None` unless both names are non-empty.
    pub fn from_parts(origin: &str, destination: &str) -> Option<Self> {
        Self::new(origin, destination).ok()
    }

    /// The departure station name.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The arrival station name.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The same route travelled in the opposite direction.
    pub fn swapped(&self) -> Self {
        Self {
            origin: self.destination.clone(),
            destination: self.origin.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.origin, self.destination)
    }
}

/// Label shown for an optional route.
///
/// An unconfigured route renders with both names blank.
pub fn route_label(route: Option<&Route>) -> String {
    match route {
        Some(route) => route.to_string(),
        None => " → ".to_string(),
    }
}
