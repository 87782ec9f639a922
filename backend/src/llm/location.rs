//! Where the teacher is, as a place name for the culture agent.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::ModelError;

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<String, ModelError>;
}

/// A fixed, configured place name.
#[derive(Debug, Clone)]
pub struct StaticLocation(pub String);

impl StaticLocation {
    pub fn new(place: impl Into<String>) -> Self {
        Self(place.into())
    }
}

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn locate(&self) -> Result<String, ModelError> {
        Ok(self.0.clone())
    }
}

const GEOLOCATION_BASE_URL: &str = "https://www.googleapis.com";
const GEOCODE_BASE_URL: &str = "https://maps.googleapis.com";

/// IP geolocation followed by reverse geocoding.
///
/// The place name is the first address component of the second-to-last
/// geocoding result, which is the state/region level for most addresses.
#[derive(Debug, Clone)]
pub struct GoogleMapsLocator {
    api_key: String,
    geolocation_base: String,
    geocode_base: String,
    client: Client,
}

impl GoogleMapsLocator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            geolocation_base: GEOLOCATION_BASE_URL.to_string(),
            geocode_base: GEOCODE_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point both lookups at one host (used against a mock server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        self.geolocation_base = base.clone();
        self.geocode_base = base;
        self
    }

    async fn geolocate(&self) -> Result<LatLng, ModelError> {
        let url = format!(
            "{}/geolocation/v1/geolocate?key={}",
            self.geolocation_base, self.api_key
        );
        let body: GeolocateResponse =
            send(self.client.post(url).json(&serde_json::json!({ "considerIp": true }))).await?;
        Ok(body.location)
    }

    async fn reverse_geocode(&self, at: &LatLng) -> Result<String, ModelError> {
        let url = format!(
            "{}/maps/api/geocode/json?latlng={},{}&key={}",
            self.geocode_base, at.lat, at.lng, self.api_key
        );
        let body: GeocodeResponse = send(self.client.get(url)).await?;

        let count = body.results.len();
        count
            .checked_sub(2)
            .and_then(|i| body.results.into_iter().nth(i))
            .and_then(|r| r.address_components.into_iter().next())
            .map(|c| c.long_name)
            .ok_or_else(|| {
                ModelError::EmptyResponse(format!(
                    "geocoding returned {} results, need at least 2",
                    count
                ))
            })
    }
}

#[async_trait]
impl LocationProvider for GoogleMapsLocator {
    async fn locate(&self) -> Result<String, ModelError> {
        let at = self.geolocate().await?;
        debug!(lat = at.lat, lng = at.lng, "geolocated caller");
        self.reverse_geocode(&at).await
    }
}

async fn send<R: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<R, ModelError> {
    let response = request.send().await.map_err(|e| {
        error!(error = %e, "Failed to reach maps API");
        ModelError::RequestError(format!("Network error: {}", e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %body, "Maps API returned error status");
        return Err(ModelError::ApiError {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ModelError::SerializationError(format!("Failed to parse response: {}", e)))
}

#[derive(Debug, Deserialize)]
struct GeolocateResponse {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_static_location() {
        assert_eq!(StaticLocation::new("Kerala").locate().await.unwrap(), "Kerala");
    }

    #[tokio::test]
    async fn test_locate_takes_second_to_last_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/geolocation/v1/geolocate")
            .match_query(Matcher::UrlEncoded("key".into(), "maps-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"location":{"lat":12.97,"lng":77.59},"accuracy":1200}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/maps/api/geocode/json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("latlng".into(), "12.97,77.59".into()),
                Matcher::UrlEncoded("key".into(), "maps-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[
                    {"address_components":[{"long_name":"MG Road"}]},
                    {"address_components":[{"long_name":"Bengaluru"}]},
                    {"address_components":[{"long_name":"Karnataka"},{"long_name":"India"}]},
                    {"address_components":[{"long_name":"India"}]}
                ]}"#,
            )
            .create_async()
            .await;

        let place = GoogleMapsLocator::new("maps-key")
            .with_base_url(&server.url())
            .locate()
            .await
            .unwrap();

        assert_eq!(place, "Karnataka");
    }

    #[tokio::test]
    async fn test_single_geocode_result_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/geolocation/v1/geolocate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"location":{"lat":1.0,"lng":2.0}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/maps/api/geocode/json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[{"address_components":[{"long_name":"Sea"}]}]}"#)
            .create_async()
            .await;

        let err = GoogleMapsLocator::new("k")
            .with_base_url(&server.url())
            .locate()
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_geolocation_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/geolocation/v1/geolocate")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("denied")
            .create_async()
            .await;

        let err = GoogleMapsLocator::new("k")
            .with_base_url(&server.url())
            .locate()
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ApiError { status: 403, .. }));
    }
}
