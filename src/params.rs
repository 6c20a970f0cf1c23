use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Values handed to a session at startup, read from the page URL query.
///
/// Keys: `v` video id, `s` start, `e` end, `t` caption text, `id` segment id,
/// `dev` developer mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartupParams {
    pub video_id: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub caption: Option<String>,
    pub segment_id: Option<String>,
    pub dev_mode: bool,
}

impl StartupParams {
    /// Read parameters from a full page URL
    pub fn from_url(page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url)?;
        Ok(Self::from_query(url.query().unwrap_or("")))
    }

    /// Read parameters from a query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "v" => params.video_id = value.to_string(),
                "s" => params.start = parse_seconds(value),
                "e" => params.end = parse_seconds(value),
                "t" => params.caption = non_empty(value),
                "id" => params.segment_id = non_empty(value),
                "dev" => params.dev_mode = !matches!(value, "0" | "false" | "off"),
                _ => {}
            }
        }

        params
    }

    pub fn has_video(&self) -> bool {
        !self.video_id.is_empty()
    }

    /// Build a page URL carrying these parameters.
    ///
    /// Only non-empty fields are written, in the order `v, s, e, t, id`.
    pub fn share_link(&self, base: &str) -> Result<String> {
        let mut url = Url::parse(base)?;
        url.set_query(None);

        let mut pairs: Vec<(&str, String)> = Vec::new();
        if self.has_video() {
            pairs.push(("v", self.video_id.clone()));
        }
        if let Some(start) = self.start {
            pairs.push(("s", start.to_string()));
        }
        if let Some(end) = self.end {
            pairs.push(("e", end.to_string()));
        }
        if let Some(caption) = &self.caption {
            pairs.push(("t", caption.clone()));
        }
        if let Some(segment_id) = &self.segment_id {
            pairs.push(("id", segment_id.clone()));
        }

        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url.to_string())
    }
}

fn parse_seconds(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
