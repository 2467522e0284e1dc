//! Stream-resolution addon client
//!
//! Fetches stream links from a Stremio-style addon over its
//! `/stream/{type}/{id}.json` protocol. Links carrying a direct HTTP URL can
//! be handed straight to the download manager.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::StreamLink;

/// Addon stream response
#[derive(Debug, Deserialize)]
struct AddonResponse {
    streams: Vec<AddonStream>,
}

/// Individual stream entry from the addon
#[derive(Debug, Deserialize)]
struct AddonStream {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    url: Option<String>,
    #[serde(rename = "infoHash")]
    info_hash: Option<String>,
    #[serde(rename = "fileIdx")]
    file_idx: Option<u32>,
}

impl AddonStream {
    /// Convert the wire entry to our StreamLink model
    fn into_stream_link(self) -> StreamLink {
        StreamLink {
            name: self.name,
            title: self.title,
            url: self.url,
            info_hash: self.info_hash,
            file_idx: self.file_idx,
        }
    }
}

/// Stremio-style addon client
pub struct AddonClient {
    base_url: String,
    client: reqwest::Client,
}

impl AddonClient {
    /// Create a client against an addon's base URL (no trailing slash)
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Get stream links for a movie by IMDB ID
    pub async fn movie_streams(&self, imdb_id: &str) -> Result<Vec<StreamLink>> {
        let url = format!("{}/stream/movie/{}.json", self.base_url, imdb_id);
        self.fetch_streams(&url).await
    }

    /// Get stream links for a TV episode by IMDB ID and episode info
    pub async fn episode_streams(
        &self,
        imdb_id: &str,
        season: u16,
        episode: u16,
    ) -> Result<Vec<StreamLink>> {
        let url = format!(
            "{}/stream/series/{}:{}:{}.json",
            self.base_url, imdb_id, season, episode
        );
        self.fetch_streams(&url).await
    }

    /// Fetch and parse a stream listing from an addon URL
    async fn fetch_streams(&self, url: &str) -> Result<Vec<StreamLink>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch from addon")?;

        // Check for HTTP errors
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Addon returned HTTP {}", status);
        }

        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        let data: AddonResponse =
            serde_json::from_str(&text).context("Failed to parse JSON response")?;

        let mut streams: Vec<StreamLink> = data
            .streams
            .into_iter()
            .map(|s| s.into_stream_link())
            .collect();

        // Downloadable links first, addon order preserved within each group
        streams.sort_by_key(|s| !s.is_downloadable());

        Ok(streams)
    }
}
