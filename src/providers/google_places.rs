//! Google Places Text Search provider.
//!
//! Single GET against `/maps/api/place/textsearch/json`. The provider reports
//! failures both through HTTP status and through a `status` field in a 200 body.

use crate::error::Error;
use crate::providers::{error_from_response, PlacesProvider};
use crate::types::{LatLng, PlaceRecord};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

const PROVIDER: &str = "google_places";

/// Google Places API provider.
pub struct GooglePlacesProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GooglePlacesProvider {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/maps/api/place/textsearch/json", self.base_url)
    }

    /// Decode a 2xx response body into normalized records.
    pub(crate) fn parse_response(body: &str) -> Result<Vec<PlaceRecord>, Error> {
        let resp: TextSearchResponse =
            serde_json::from_str(body).map_err(|e| Error::malformed(e.to_string()))?;

        match resp.status.as_deref() {
            None | Some("OK" | "ZERO_RESULTS") => {}
            Some(status) => {
                let message = match resp.error_message {
                    Some(msg) => format!("{status}: {msg}"),
                    None => status.to_string(),
                };
                return Err(Error::upstream(PROVIDER, message));
            }
        }

        let results = resp
            .results
            .ok_or_else(|| Error::upstream(PROVIDER, "response has no results list"))?;

        Ok(results.into_iter().map(RawPlace::into_record).collect())
    }
}

#[async_trait]
impl PlacesProvider for GooglePlacesProvider {
    async fn search(
        &self,
        query: &str,
        location: &str,
        radius: u32,
    ) -> Result<Vec<PlaceRecord>, Error> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query is empty".into()));
        }
        let location: LatLng = location.parse()?;
        if radius == 0 {
            return Err(Error::InvalidInput("radius must be positive".into()));
        }

        debug!(query, %location, radius, "searching places");
        let resp = self
            .http
            .get(self.url())
            .query(&[
                ("query", query.to_string()),
                ("location", location.to_string()),
                ("radius", radius.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(Error::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(error_from_response(resp).await);
        }

        let text = resp.text().await.map_err(Error::from_transport)?;
        let places = Self::parse_response(&text)?;
        info!(count = places.len(), "places search returned");
        Ok(places)
    }
}

// --- Serde types for the Text Search API ---

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    results: Option<Vec<RawPlace>>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    name: String,
    formatted_address: String,
    geometry: RawGeometry,
    rating: Option<f64>,
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    location: LatLng,
}

impl RawPlace {
    fn into_record(self) -> PlaceRecord {
        PlaceRecord {
            name: self.name,
            address: self.formatted_address,
            coordinates: self.geometry.location,
            rating: self.rating,
            place_id: self.place_id,
        }
    }
}
