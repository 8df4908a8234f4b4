//! Station code types.

use std::fmt;

/// Error returned when parsing an invalid carrier station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// A carrier station code: exactly 5 ASCII digits.
///
/// Leading zeros are significant ("06006" is not "6006").
///
/// # Examples
///
/// ```
/// use cercanias_server::domain::StationCode;
///
/// let code = StationCode::parse("60911").unwrap();
/// assert_eq!(code.as_str(), "60911");
///
/// assert!(StationCode::parse("6091").is_err());
/// assert!(StationCode::parse("6091A").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationCode([u8; 5]);

impl StationCode {
    /// Parse a station code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let bytes: [u8; 5] = s.as_bytes().try_into().map_err(|_| InvalidStationCode {
            reason: "must be exactly 5 characters",
        })?;

        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(InvalidStationCode {
                reason: "must be ASCII digits 0-9",
            });
        }

        Ok(Self(bytes))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII digits are ever stored.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.as_str())
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
