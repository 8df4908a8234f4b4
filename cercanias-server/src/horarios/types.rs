//! Horarios servlet request and response DTOs.
//!
//! Field names map directly to the carrier's JSON and must not be renamed.
//! Response fields use `Option` liberally because the servlet omits fields
//! rather than sending nulls in many cases.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::StationCode;

/// Timetable query type for plain scheduled services.
const SERVICE_TYPE: &str = "VTI";

/// Query window start hour.
const WINDOW_START: &str = "00";

/// Query window end hour. Runs past 24 to include after-midnight services.
const WINDOW_END: &str = "26";

/// Request body for a timetable query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorariosRequest {
    /// Network identifier.
    pub nucleo: String,
    /// Origin station code.
    pub origen: String,
    /// Destination station code.
    pub destino: String,
    /// Travel date as `YYYYMMDD`.
    pub fcha_viaje: String,
    pub valida_regla_negocio: bool,
    pub tiempo_real: bool,
    pub servicio_horarios: String,
    pub hora_viaje_origen: String,
    pub hora_viaje_llegada: String,
    pub accesibilidad_trenes: bool,
}

impl HorariosRequest {
    /// Build a full-day scheduled timetable query.
    pub fn new(
        nucleo: impl Into<String>,
        origin: StationCode,
        destination: StationCode,
        date: NaiveDate,
    ) -> Self {
        Self {
            nucleo: nucleo.into(),
            origen: origin.as_str().to_string(),
            destino: destination.as_str().to_string(),
            fcha_viaje: date.format("%Y%m%d").to_string(),
            valida_regla_negocio: true,
            tiempo_real: false,
            servicio_horarios: SERVICE_TYPE.to_string(),
            hora_viaje_origen: WINDOW_START.to_string(),
            hora_viaje_llegada: WINDOW_END.to_string(),
            accesibilidad_trenes: false,
        }
    }
}

/// Response from the horarios servlet.
#[derive(Debug, Clone, Deserialize)]
pub struct HorariosResponse {
    /// Timetable rows. Absent or empty when no service runs.
    #[serde(default)]
    pub horario: Option<Vec<HorarioItem>>,
}

/// One timetable row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorarioItem {
    /// Train number.
    pub cdgo_tren: Option<String>,

    /// Scheduled departure from the origin, "HH:MM".
    pub hora_salida: Option<String>,

    /// Scheduled arrival at the destination, "HH:MM".
    pub hora_llegada: Option<String>,
}
