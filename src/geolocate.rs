//! Client for Ichnaea-compatible geolocation services (BeaconDB, MLS clones).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::WifiLocateError;
use crate::model::PositionFix;
use crate::scan::AccessPoint;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocateRequest {
    pub consider_ip: bool,
    pub wifi_access_points: Vec<WifiAccessPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiAccessPoint {
    pub mac_address: String,
    pub signal_strength: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GeolocateResponse {
    pub location: Location,
    pub accuracy: f64,
}

#[derive(Debug, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl GeolocateRequest {
    pub fn from_access_points(aps: &[AccessPoint]) -> Self {
        GeolocateRequest {
            consider_ip: false,
            wifi_access_points: aps
                .iter()
                .map(|ap| WifiAccessPoint {
                    mac_address: ap.bssid.clone(),
                    signal_strength: ap.signal_dbm(),
                    frequency: ap.frequency,
                })
                .collect(),
        }
    }
}

impl GeolocateResponse {
    pub fn into_fix(self) -> Result<PositionFix, WifiLocateError> {
        let GeolocateResponse { location, accuracy } = self;
        let valid = location.lat.is_finite()
            && location.lng.is_finite()
            && (-90.0..=90.0).contains(&location.lat)
            && (-180.0..=180.0).contains(&location.lng)
            && accuracy.is_finite()
            && accuracy >= 0.0;
        if !valid {
            return Err(WifiLocateError::Geolocate(format!(
                "implausible fix lat={} lng={} accuracy={}",
                location.lat, location.lng, accuracy
            )));
        }

        Ok(PositionFix {
            latitude: location.lat,
            longitude: location.lng,
            altitude: None,
            horizontal_accuracy: accuracy,
            vertical_accuracy: None,
        })
    }
}

pub struct GeolocateClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
}

impl GeolocateClient {
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        GeolocateClient {
            agent,
            endpoint: endpoint.to_string(),
            api_key: api_key.filter(|k| !k.is_empty()).map(String::from),
        }
    }

    /// POST request to the endpoint, with the API key as an encoded query parameter.
    fn request(&self) -> ureq::Request {
        let request = self.agent.post(&self.endpoint);
        match &self.api_key {
            Some(key) => request.query("key", key),
            None => request,
        }
    }

    /// Resolves a position from the given access points.
    ///
    /// The service needs at least two access points to answer.
    pub fn locate(&self, aps: &[AccessPoint]) -> Result<PositionFix, WifiLocateError> {
        if aps.len() < 2 {
            return Err(WifiLocateError::NotEnoughAccessPoints(aps.len()));
        }

        let request = GeolocateRequest::from_access_points(aps);
        let response: GeolocateResponse = self
            .request()
            .send_json(&request)
            .map_err(|e| WifiLocateError::Geolocate(e.to_string()))?
            .into_json()
            .map_err(|e| WifiLocateError::Geolocate(e.to_string()))?;

        response.into_fix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ap(bssid: &str, signal: u8) -> AccessPoint {
        AccessPoint {
            bssid: bssid.to_string(),
            signal,
            frequency: Some(2437),
        }
    }

    #[test]
    fn test_request_shape() {
        let req = GeolocateRequest::from_access_points(&[ap("aa:bb:cc:dd:ee:01", 80)]);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["considerIp"], false);
        assert_eq!(json["wifiAccessPoints"][0]["macAddress"], "aa:bb:cc:dd:ee:01");
        assert_eq!(json["wifiAccessPoints"][0]["signalStrength"], -60);
        assert_eq!(json["wifiAccessPoints"][0]["frequency"], 2437);
    }

    #[test]
    fn test_response_to_fix() {
        let body = r#"{"location": {"lat": 37.7749, "lng": -122.4194}, "accuracy": 5.0}"#;
        let fix = serde_json::from_str::<GeolocateResponse>(body)
            .unwrap()
            .into_fix()
            .unwrap();

        assert_eq!(fix.latitude, 37.7749);
        assert_eq!(fix.longitude, -122.4194);
        assert_eq!(fix.horizontal_accuracy, 5.0);
        assert!(fix.altitude.is_none());
    }

    #[test]
    fn test_out_of_range_response_rejected() {
        let body = r#"{"location": {"lat": 137.0, "lng": 0.0}, "accuracy": 5.0}"#;
        let resp = serde_json::from_str::<GeolocateResponse>(body).unwrap();
        assert!(resp.into_fix().is_err());
    }

    #[test]
    fn test_single_access_point_is_not_enough() {
        let client = GeolocateClient::new("http://127.0.0.1:9/", None, Duration::from_millis(10));
        let err = client.locate(&[ap("aa:bb:cc:dd:ee:01", 80)]).unwrap_err();
        assert!(matches!(err, WifiLocateError::NotEnoughAccessPoints(1)));
    }

    fn query_of(client: &GeolocateClient) -> Vec<(String, String)> {
        client
            .request()
            .request_url()
            .unwrap()
            .query_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_api_key_is_encoded_query_parameter() {
        let client = GeolocateClient::new(
            "https://example.test/v1/geolocate",
            Some("a b&c=d"),
            Duration::from_secs(1),
        );
        assert_eq!(query_of(&client), vec![("key".to_string(), "a b&c=d".to_string())]);
    }

    #[test]
    fn test_api_key_joins_existing_query() {
        let client = GeolocateClient::new(
            "https://example.test/v1/geolocate?v=2",
            Some("k1"),
            Duration::from_secs(1),
        );
        assert_eq!(
            query_of(&client),
            vec![
                ("v".to_string(), "2".to_string()),
                ("key".to_string(), "k1".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_api_key_is_omitted() {
        let client = GeolocateClient::new("https://example.test/v1/geolocate", Some(""), Duration::from_secs(1));
        assert!(query_of(&client).is_empty());
    }
}
