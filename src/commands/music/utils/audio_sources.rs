use regex::Regex;
use serde::{Deserialize, Serialize};
use serenity::model::id::UserId;
use songbird::input::{AuxMetadata, Compose, HttpRequest, Input, YoutubeDl};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::music_manager::{MusicError, MusicResult};
use crate::HTTP_CLIENT;
use crate::utils::config::RadioStation;

/// Represents metadata for a track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub url: Option<String>,
    #[serde(with = "humantime_serde")]
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    pub requested_by: Option<String>,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            title: "Unknown Track".to_string(),
            url: None,
            duration: None,
            thumbnail: None,
            requested_by: None,
        }
    }
}

impl TrackMetadata {
    /// Builds metadata from what songbird reports about a source.
    /// `fallback_url` is used when the source does not report its own URL.
    pub fn from_aux(aux: AuxMetadata, fallback_url: Option<&str>, requested_by: String) -> Self {
        Self {
            title: aux
                .title
                .or(aux.track)
                .unwrap_or_else(|| Self::default().title),
            url: aux.source_url.or_else(|| fallback_url.map(str::to_string)),
            duration: aux.duration,
            thumbnail: aux.thumbnail,
            requested_by: Some(requested_by),
        }
    }
}

/// A track waiting in (or playing from) a guild queue, along with who asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedTrack {
    pub metadata: TrackMetadata,
    pub requester: UserId,
}

impl QueuedTrack {
    pub fn new(metadata: TrackMetadata, requester: UserId) -> Self {
        Self {
            metadata,
            requester,
        }
    }
}

static YOUTUBE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:https?:)?//)?((?:www|m|music)\.)?((?:youtube\.com|youtu\.be))(/(?:[\w\-]+\?v=|embed/|v/|shorts/)?)([\w\-]+)(\S+)?$")
        .expect("YouTube regex is valid")
});

/// Audio source utilities for turning user queries into playable inputs
pub struct AudioSource;

impl AudioSource {
    /// Check if a string is a valid http(s) URL
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
    }

    /// Check if a URL is a YouTube URL
    pub fn is_youtube_url(url: &str) -> bool {
        YOUTUBE_REGEX.is_match(url)
    }

    /// Resolve a URL or search query into track metadata.
    pub async fn resolve(query: &str, requested_by: String) -> MusicResult<TrackMetadata> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MusicError::AudioSourceError(
                "Empty query".to_string(),
            ));
        }

        match query {
            url if Self::is_youtube_url(url) => {
                info!("Resolving YouTube URL: {}", url);
                let mut source = YoutubeDl::new(HTTP_CLIENT.clone(), url.to_string());
                let aux = source
                    .aux_metadata()
                    .await
                    .map_err(|e| MusicError::AudioSourceError(e.to_string()))?;
                Ok(TrackMetadata::from_aux(aux, Some(url), requested_by))
            }
            url if Self::is_url(url) => {
                debug!("Treating {} as a direct audio URL", url);
                Ok(TrackMetadata {
                    title: url.to_string(),
                    url: Some(url.to_string()),
                    requested_by: Some(requested_by),
                    ..Default::default()
                })
            }
            search => {
                info!("Searching YouTube for: {}", search);
                let mut source = YoutubeDl::new_search(HTTP_CLIENT.clone(), search.to_string());
                let aux = source
                    .aux_metadata()
                    .await
                    .map_err(|e| MusicError::AudioSourceError(e.to_string()))?;
                if aux.source_url.is_none() {
                    return Err(MusicError::AudioSourceError(format!(
                        "No results for '{}'",
                        search
                    )));
                }
                Ok(TrackMetadata::from_aux(aux, None, requested_by))
            }
        }
    }

    /// Create the playable input for a queued track. Inputs are lazy, nothing is fetched yet.
    pub fn input_for(metadata: &TrackMetadata) -> MusicResult<Input> {
        let url = metadata.url.as_deref().ok_or_else(|| {
            MusicError::AudioSourceError(format!("Track '{}' has no URL", metadata.title))
        })?;

        if Self::is_youtube_url(url) {
            Ok(YoutubeDl::new(HTTP_CLIENT.clone(), url.to_string()).into())
        } else {
            Ok(HttpRequest::new(HTTP_CLIENT.clone(), url.to_string()).into())
        }
    }

    pub fn radio_input(station: &RadioStation) -> Input {
        HttpRequest::new(HTTP_CLIENT.clone(), station.stream_url.clone()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("https://www.youtube.com/watch?v=dQw4w9WgXcQ", true ; "watch url")]
    #[test_case("https://youtu.be/dQw4w9WgXcQ", true ; "short link")]
    #[test_case("https://music.youtube.com/watch?v=dQw4w9WgXcQ", true ; "music subdomain")]
    #[test_case("https://example.com/stream.mp3", false ; "other host")]
    #[test_case("never gonna give you up", false ; "search text")]
    fn detects_youtube_urls(input: &str, expected: bool) {
        assert_eq!(AudioSource::is_youtube_url(input), expected);
    }

    #[test_case("https://example.com/stream.mp3", true ; "https")]
    #[test_case("http://example.com/a", true ; "http")]
    #[test_case("ftp://example.com/a", false ; "other scheme")]
    #[test_case("lofi beats", false ; "plain words")]
    fn detects_urls(input: &str, expected: bool) {
        assert_eq!(AudioSource::is_url(input), expected);
    }

    #[test]
    fn from_aux_prefers_reported_fields() {
        let aux = AuxMetadata {
            title: Some("Song".to_string()),
            source_url: Some("https://youtu.be/abc".to_string()),
            duration: Some(Duration::from_secs(212)),
            ..Default::default()
        };

        let metadata = TrackMetadata::from_aux(aux, Some("https://fallback"), "alice".to_string());

        assert_eq!(metadata.title, "Song");
        assert_eq!(metadata.url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(metadata.duration, Some(Duration::from_secs(212)));
        assert_eq!(metadata.requested_by.as_deref(), Some("alice"));
    }

    #[test]
    fn from_aux_falls_back_when_fields_missing() {
        let metadata = TrackMetadata::from_aux(
            AuxMetadata::default(),
            Some("https://fallback"),
            "bob".to_string(),
        );

        assert_eq!(metadata.title, "Unknown Track");
        assert_eq!(metadata.url.as_deref(), Some("https://fallback"));
    }

    #[test]
    fn input_requires_url() {
        let result = AudioSource::input_for(&TrackMetadata::default());
        assert!(matches!(result, Err(MusicError::AudioSourceError(_))));
    }
}
