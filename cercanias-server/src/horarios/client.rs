//! Horarios servlet HTTP client.
//!
//! Performs exactly one request/response exchange per call. Retrying is
//! the caller's job.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::debug;

use crate::domain::{RawSchedule, Route};
use crate::stations::StationDirectory;

use super::convert::convert_response;
use super::error::FetchError;
use super::types::{HorariosRequest, HorariosResponse};

/// Default servlet URL for Cercanías timetables.
const DEFAULT_BASE_URL: &str = "https://horarios.renfe.com/cer/HorariosServlet";

/// Network identifier for the Murcia/Alicante núcleo.
const DEFAULT_NUCLEO: &str = "41";

/// How much of an undecodable body to keep for diagnostics.
const BODY_SNIPPET_CHARS: usize = 500;

/// Configuration for the horarios client.
#[derive(Debug, Clone)]
pub struct HorariosConfig {
    /// Full servlet URL
    pub base_url: String,
    /// Network identifier sent as `nucleo`
    pub nucleo: String,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds, counted after the connection is up
    pub read_timeout_secs: u64,
}

impl HorariosConfig {
    /// Set a custom servlet URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the network identifier.
    pub fn with_nucleo(mut self, nucleo: impl Into<String>) -> Self {
        self.nucleo = nucleo.into();
        self
    }

    /// Set connect and read timeouts.
    pub fn with_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.read_timeout_secs = read_secs;
        self
    }
}

impl Default for HorariosConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            nucleo: DEFAULT_NUCLEO.to_string(),
            connect_timeout_secs: 10,
            read_timeout_secs: 10,
        }
    }
}

/// Horarios timetable client.
#[derive(Debug, Clone)]
pub struct HorariosClient {
    http: reqwest::Client,
    base_url: String,
    nucleo: String,
    directory: StationDirectory,
}

impl HorariosClient {
    /// Create a new client resolving stations through `directory`.
    pub fn new(config: HorariosConfig, directory: StationDirectory) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // Outer bound on the whole exchange: connect plus read.
        let total = config.connect_timeout_secs + config.read_timeout_secs;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(total))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            nucleo: config.nucleo,
            directory,
        })
    }

    /// The directory used to resolve station names.
    pub fn directory(&self) -> &StationDirectory {
        &self.directory
    }

    /// Fetch the timetable for `route` on `date`.
    ///
    /// Both stations are resolved before anything is sent; an unknown
    /// station fails with [`FetchError::UnknownStation`] and no request.
    /// An empty or absent timetable is a successful, empty schedule.
    pub async fn fetch(&self, route: &Route, date: NaiveDate) -> Result<RawSchedule, FetchError> {
        let request = self.build_request(route, date)?;
        debug!(?request, "requesting timetable");

        let response = self.http.post(&self.base_url).json(&request).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "timetable response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_body(&body)
    }

    /// Resolve the route and build the request body.
    pub fn build_request(
        &self,
        route: &Route,
        date: NaiveDate,
    ) -> Result<HorariosRequest, FetchError> {
        let origin = self.directory.resolve(route.origin())?;
        let destination = self.directory.resolve(route.destination())?;

        Ok(HorariosRequest::new(
            self.nucleo.clone(),
            origin,
            destination,
            date,
        ))
    }
}

/// Decode a successful response body into a schedule.
fn parse_body(body: &str) -> Result<RawSchedule, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::Decode {
            message: "empty response body".to_string(),
            body: None,
        });
    }

    let response: HorariosResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode {
            message: e.to_string(),
            body: Some(body.chars().take(BODY_SNIPPET_CHARS).collect()),
        })?;

    convert_response(&response).map_err(|e| FetchError::Decode {
        message: e.to_string(),
        body: None,
    })
}
