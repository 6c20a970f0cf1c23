//! Segment lookup: map a video id and segment id to loop bounds and caption
//! text from an external JSON document.
use reqwest::header::CACHE_CONTROL;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SegmentsConfig;
use crate::error::Result;
use crate::params::StartupParams;

/// One captioned segment of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    #[serde(default, deserialize_with = "number_or_none")]
    pub start: Option<f64>,
    #[serde(default, deserialize_with = "number_or_none")]
    pub end: Option<f64>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub text: Option<String>,
}

/// All segments listed for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSegments {
    pub video_id: String,
    pub segments: Vec<Value>,
}

/// Where the lookup document lives
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentSource {
    File(PathBuf),
    Http(Url),
}

impl SegmentSource {
    /// `http://` and `https://` locations are fetched, anything else is a path
    pub fn parse(location: &str) -> Result<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Ok(Self::Http(Url::parse(location)?))
        } else {
            Ok(Self::File(PathBuf::from(location)))
        }
    }
}

/// Parsed lookup document.
///
/// The document is either an array of per-video entries or a single entry.
/// Entries or segments with an unexpected shape are skipped, not rejected.
#[derive(Debug, Clone, Default)]
pub struct SegmentLookup {
    entries: Vec<VideoSegments>,
}

impl SegmentLookup {
    pub fn from_json(content: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(content)?;
        let items = match document {
            Value::Array(items) => items,
            other => vec![other],
        };

        let entries = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<VideoSegments>(item).ok())
            .collect::<Vec<_>>();

        debug!("Segment lookup holds {} video entries", entries.len());
        Ok(Self { entries })
    }

    /// Fetch and parse a lookup document
    pub async fn load(source: &SegmentSource, timeout: Duration) -> Result<Self> {
        let content = match source {
            SegmentSource::File(path) => tokio::fs::read_to_string(path).await?,
            SegmentSource::Http(url) => {
                let client = Client::builder()
                    .timeout(timeout)
                    .build()
                    .unwrap_or_else(|_| Client::new());
                client
                    .get(url.clone())
                    .header(CACHE_CONTROL, "no-cache")
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?
            }
        };
        Self::from_json(&content)
    }

    /// First segment with `segment_id` in the first matching video entry
    pub fn find(&self, video_id: &str, segment_id: &str) -> Option<Segment> {
        self.entries
            .iter()
            .filter(|entry| entry.video_id == video_id)
            .find_map(|entry| {
                entry
                    .segments
                    .iter()
                    .filter_map(|value| serde_json::from_value::<Segment>(value.clone()).ok())
                    .find(|segment| segment.id == segment_id)
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve the startup segment, if one was requested.
///
/// Runs at most once per session. Every failure is logged and yields `None`
/// so startup continues with the URL-provided state.
pub async fn resolve_startup_segment(config: &SegmentsConfig, params: &StartupParams) -> Option<Segment> {
    let segment_id = params.segment_id.as_deref()?;
    let Some(location) = config.source.as_deref() else {
        warn!("Segment {} requested but no segment source is configured", segment_id);
        return None;
    };

    let source = match SegmentSource::parse(location) {
        Ok(source) => source,
        Err(e) => {
            warn!("Invalid segment source {}: {}", location, e);
            return None;
        }
    };

    let lookup = match SegmentLookup::load(&source, Duration::from_secs(config.timeout_seconds)).await {
        Ok(lookup) => lookup,
        Err(e) => {
            warn!("Segment lookup failed ({}): {}", location, e);
            return None;
        }
    };

    match lookup.find(&params.video_id, segment_id) {
        Some(segment) => {
            info!("📚 Using segment {} for video {}", segment.id, params.video_id);
            Some(segment)
        }
        None => {
            warn!("No segment {} for video {} in {}", segment_id, params.video_id, location);
            None
        }
    }
}

fn number_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()).filter(|v| v.is_finite()))
}

fn text_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        // numeric zero counts as no text
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}
