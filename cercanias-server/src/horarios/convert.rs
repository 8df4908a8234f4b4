//! Conversion from horarios DTOs to domain types.

use tracing::warn;

use crate::domain::{ClockTime, RawSchedule, ScheduleEntry};

use super::types::{HorarioItem, HorariosResponse};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// Failed to parse a time string
    #[error("invalid time in {field}: {value:?}")]
    InvalidTime { field: &'static str, value: String },

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Rows were present but none could be converted
    #[error("none of the {0} timetable rows could be converted")]
    NoValidRows(usize),
}

/// Convert a servlet response into a raw schedule, keeping source order.
///
/// A missing or empty `horario` array means no services and yields an
/// empty schedule. Individual malformed rows are skipped with a warning.
pub fn convert_response(response: &HorariosResponse) -> Result<RawSchedule, ConversionError> {
    let rows = response.horario.as_deref().unwrap_or(&[]);
    let mut entries = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        match convert_row(row) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(index, error = %e, "skipping timetable row"),
        }
    }

    if entries.is_empty() && !rows.is_empty() {
        return Err(ConversionError::NoValidRows(rows.len()));
    }

    Ok(entries)
}

/// Convert a single timetable row.
pub fn convert_row(row: &HorarioItem) -> Result<ScheduleEntry, ConversionError> {
    let departure = parse_field(row.hora_salida.as_deref(), "horaSalida")?;
    let arrival = parse_field(row.hora_llegada.as_deref(), "horaLlegada")?;

    let train_code = row
        .cdgo_tren
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ConversionError::MissingField("cdgoTren"))?;

    Ok(ScheduleEntry::new(departure, arrival, train_code))
}

fn parse_field(value: Option<&str>, field: &'static str) -> Result<ClockTime, ConversionError> {
    let value = value.ok_or(ConversionError::MissingField(field))?;
    ClockTime::parse_hhmm(value.trim()).map_err(|_| ConversionError::InvalidTime {
        field,
        value: value.to_string(),
    })
}
