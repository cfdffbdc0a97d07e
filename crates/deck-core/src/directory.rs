//! Station directory client (radio-browser JSON API).

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::DirectoryConfig;
use crate::station::{DirectoryEntry, Station};

const USER_AGENT: &str = concat!("tunedeck/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directory returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("directory payload could not be parsed: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Clone)]
pub struct StationDirectoryClient {
    http: reqwest::Client,
    base_url: String,
    country: String,
    limit: u32,
}

impl StationDirectoryClient {
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            limit: config.limit,
        })
    }

    /// Blank queries list the default country; anything else is a name search.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<Station>, DirectoryError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let limit = self.limit.to_string();
        let request = match query {
            None => self
                .http
                .get(format!(
                    "{}/json/stations/bycountry/{}",
                    self.base_url, self.country
                ))
                .query(&[("limit", limit.as_str())]),
            Some(name) => self
                .http
                .get(format!("{}/json/stations/search", self.base_url))
                .query(&[
                    ("country", self.country.as_str()),
                    ("name", name),
                    ("limit", limit.as_str()),
                ]),
        };

        debug!("directory: query={:?}", query);
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status()));
        }
        let body = response.bytes().await?;
        let entries: Vec<DirectoryEntry> =
            serde_json::from_slice(&body).map_err(DirectoryError::Decode)?;

        let total = entries.len();
        let stations: Vec<Station> = entries
            .into_iter()
            .filter_map(DirectoryEntry::into_station)
            .collect();
        info!(
            "directory: {} stations ({} without stream url dropped)",
            stations.len(),
            total - stations.len()
        );
        Ok(stations)
    }
}

/// What the station pane currently shows.
#[derive(Debug, Clone, Default)]
pub enum SearchOutcome {
    #[default]
    Loading,
    Loaded(Vec<Station>),
    Failed(String),
}

impl SearchOutcome {
    pub fn from_result(result: Result<Vec<Station>, DirectoryError>) -> Self {
        match result {
            Ok(stations) => Self::Loaded(stations),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    pub fn stations(&self) -> &[Station] {
        match self {
            Self::Loaded(stations) => stations,
            _ => &[],
        }
    }

    /// Placeholder text when there are no cards to draw.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Loading => Some("Loading stations..."),
            Self::Failed(_) => Some("Failed to load."),
            Self::Loaded(stations) if stations.is_empty() => Some("No stations found."),
            Self::Loaded(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_and_empty_have_distinct_placeholders() {
        let empty = SearchOutcome::Loaded(Vec::new());
        let failed = SearchOutcome::Failed("boom".into());
        assert_eq!(empty.placeholder(), Some("No stations found."));
        assert_eq!(failed.placeholder(), Some("Failed to load."));
        assert_ne!(empty.placeholder(), failed.placeholder());
        assert!(failed.stations().is_empty());
    }
}
