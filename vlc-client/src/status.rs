//! Normalized views of the player's status responses.
//!
//! VLC's HTTP interface exposes playback state at `/requests/status.json`
//! (structured) and `/requests/status.xml` (legacy). This module maps the
//! structured payload into a small snapshot type and carries the legacy body
//! verbatim when only the XML endpoint answers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Now-playing metadata pulled from `information.category.meta` of the
/// status JSON. Streams usually fill `title`/`artist`; local files often only
/// carry `filename` (and sometimes `album`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

/// A point-in-time read of the player's state.
///
/// Either the parsed fields are populated (structured endpoint answered) or
/// `raw_text` carries the legacy endpoint's body verbatim with no parsed
/// fields. Snapshots are recomputed on every poll and never cached.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    /// Full decoded status JSON, kept for consumers that need fields the
    /// normalized view drops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    /// Playback state as reported by the player ("playing", "paused", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Volume level (VLC uses 0..=512)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    /// Elapsed time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Total length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<i64>,
    /// Now-playing metadata, when the status JSON carries any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now_playing: Option<NowPlaying>,
    /// Raw legacy-endpoint body, set only on the fallback path
    #[serde(rename = "rawText", skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl StatusSnapshot {
    /// Build a snapshot from a decoded status JSON document.
    ///
    /// Missing or mistyped fields simply stay `None`; the raw document is
    /// retained as-is.
    pub fn from_json(value: Value) -> Self {
        let now_playing = value
            .pointer("/information/category/meta")
            .cloned()
            .and_then(|meta| serde_json::from_value::<NowPlaying>(meta).ok());

        Self {
            state: value.get("state").and_then(Value::as_str).map(String::from),
            volume: value.get("volume").and_then(Value::as_i64),
            time: value.get("time").and_then(Value::as_i64),
            length: value.get("length").and_then(Value::as_i64),
            now_playing,
            raw: Some(value),
            raw_text: None,
        }
    }

    /// Build a fallback snapshot carrying the legacy endpoint's body
    /// verbatim, with no parsed fields.
    pub fn from_raw_text(text: String) -> Self {
        Self {
            raw_text: Some(text),
            ..Self::default()
        }
    }

    /// True when this snapshot came from the legacy fallback path.
    pub fn is_fallback(&self) -> bool {
        self.raw_text.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_maps_normalized_fields() {
        let value = json!({
            "state": "playing",
            "volume": 80,
            "time": 12,
            "length": 200,
            "information": { "category": { "meta": { "title": "X" } } }
        });

        let snapshot = StatusSnapshot::from_json(value);

        assert_eq!(snapshot.state.as_deref(), Some("playing"));
        assert_eq!(snapshot.volume, Some(80));
        assert_eq!(snapshot.time, Some(12));
        assert_eq!(snapshot.length, Some(200));
        assert_eq!(
            snapshot.now_playing.as_ref().unwrap().title.as_deref(),
            Some("X")
        );
        assert!(!snapshot.is_fallback());
    }

    #[test]
    fn from_json_without_metadata() {
        let snapshot = StatusSnapshot::from_json(json!({ "state": "stopped" }));

        assert_eq!(snapshot.state.as_deref(), Some("stopped"));
        assert_eq!(snapshot.volume, None);
        assert_eq!(snapshot.now_playing, None);
    }

    #[test]
    fn from_json_ignores_mistyped_fields() {
        let snapshot = StatusSnapshot::from_json(json!({ "state": 3, "volume": "loud" }));

        assert_eq!(snapshot.state, None);
        assert_eq!(snapshot.volume, None);
        assert!(snapshot.raw.is_some());
    }

    #[test]
    fn from_raw_text_has_no_parsed_fields() {
        let snapshot = StatusSnapshot::from_raw_text("<root/>".to_string());

        assert!(snapshot.is_fallback());
        assert_eq!(snapshot.raw_text.as_deref(), Some("<root/>"));
        assert_eq!(snapshot.state, None);
        assert_eq!(snapshot.volume, None);
    }

    #[test]
    fn serializes_fallback_with_raw_text_key() {
        let snapshot = StatusSnapshot::from_raw_text("<root/>".to_string());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json, json!({ "rawText": "<root/>" }));
    }
}
