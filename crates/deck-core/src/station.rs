use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque station identifier issued by the directory (`stationuuid`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A playable stream entry.  Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    /// Resolved stream URL; never empty.
    pub stream_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Comma separated tag string as the directory returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Station {
    /// `country • tags` subtitle for the now-playing line.
    pub fn subtitle(&self) -> String {
        let country = self.country.as_deref().unwrap_or("");
        match self.tags.as_deref() {
            Some(tags) => format!("{country} • {tags}"),
            None => country.to_string(),
        }
    }
}

/// Raw directory entry.  Every field may be missing or empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryEntry {
    #[serde(default)]
    pub stationuuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url_resolved: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl DirectoryEntry {
    /// Convert into a `Station`, dropping entries without a playable URL.
    pub fn into_station(self) -> Option<Station> {
        let stream_url = non_empty(self.url_resolved)?;
        Some(Station {
            id: StationId::new(self.stationuuid),
            name: self.name.trim().to_string(),
            stream_url,
            icon_url: non_empty(self.favicon).filter(|u| u.starts_with("http")),
            tags: non_empty(self.tags),
            country: non_empty(self.country),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: Option<&str>) -> DirectoryEntry {
        DirectoryEntry {
            stationuuid: "s1".into(),
            name: "Radio One".into(),
            url_resolved: url.map(str::to_string),
            ..DirectoryEntry::default()
        }
    }

    #[test]
    fn entries_without_resolved_url_are_dropped() {
        assert!(entry(None).into_station().is_none());
        assert!(entry(Some("  ")).into_station().is_none());
        assert!(entry(Some("http://a/stream")).into_station().is_some());
    }

    #[test]
    fn non_http_icons_are_discarded() {
        let mut e = entry(Some("http://a/stream"));
        e.favicon = Some("data:image/png;base64,xx".into());
        assert_eq!(e.into_station().unwrap().icon_url, None);
    }

    #[test]
    fn subtitle_joins_country_and_tags() {
        let mut station = entry(Some("http://a")).into_station().unwrap();
        assert_eq!(station.subtitle(), "");
        station.country = Some("India".into());
        station.tags = Some("news,talk".into());
        assert_eq!(station.subtitle(), "India • news,talk");
    }
}
