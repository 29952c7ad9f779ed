use async_trait::async_trait;
use chrono::Locale;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, instrument, trace, warn};

use crate::{
    config::DEFAULT_BASE_URL,
    error::ForecastError,
    mapper,
    model::{ApiErrorResponse, ForecastDay, RawForecastResponse},
};

use super::ForecastClient;

const FORECAST_DAYS: &str = "5";

/// weatherapi.com error code for "No matching location found."
const CITY_NOT_FOUND_CODE: i64 = 1006;

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    locale: Locale,
    http: Client,
}

impl WeatherApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            locale: Locale::en_US,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// `{base}/forecast.json?key=..&q=<city>&days=5&aqi=no&alerts=no`, city percent-encoded.
    fn forecast_url(&self, city: &str) -> Result<Url, ForecastError> {
        let endpoint = format!("{}/forecast.json", self.base_url.trim_end_matches('/'));

        Url::parse_with_params(
            &endpoint,
            &[
                ("key", self.api_key.as_str()),
                ("q", city),
                ("days", FORECAST_DAYS),
                ("aqi", "no"),
                ("alerts", "no"),
            ],
        )
        .map_err(|e| ForecastError::NetworkFailure(format!("invalid forecast URL: {e}")))
    }
}

#[async_trait]
impl ForecastClient for WeatherApiClient {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, city: &str) -> Result<Vec<ForecastDay>, ForecastError> {
        let url = self.forecast_url(city)?;

        let res = self.http.get(url).send().await.map_err(|e| {
            warn!(error = %e, "forecast request failed");
            ForecastError::NetworkFailure(e.to_string())
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            warn!(error = %e, "failed to read forecast response body");
            ForecastError::NetworkFailure(e.to_string())
        })?;

        trace!(%status, body = %truncate_body(&body), "forecast response");

        if !status.is_success() {
            let err = classify_error_body(status, &body);
            debug!(%status, error = %err, "forecast request rejected");
            return Err(err);
        }

        let parsed: RawForecastResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "forecast body did not match schema");
            ForecastError::DecodeFailure(e.to_string())
        })?;

        debug!(
            location = %parsed.location.name,
            days = parsed.forecast.forecastday.len(),
            "forecast decoded"
        );

        Ok(mapper::map(&parsed, self.locale))
    }
}

fn classify_error_body(status: StatusCode, body: &str) -> ForecastError {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(ApiErrorResponse { error }) if error.code == CITY_NOT_FOUND_CODE => {
            ForecastError::CityNotFound(error.message)
        }
        Ok(ApiErrorResponse { error }) => ForecastError::DecodeFailure(format!(
            "API error {} (status {status}): {}",
            error.code, error.message
        )),
        Err(_) => ForecastError::DecodeFailure(format!(
            "unexpected status {status}: {}",
            truncate_body(body)
        )),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
    }

    #[test]
    fn forecast_url_carries_fixed_params() {
        let client = WeatherApiClient::new("KEY".into());
        let url = client.forecast_url("Paris").expect("valid url");

        assert_eq!(url.as_str().split('?').next(), Some("https://api.weatherapi.com/v1/forecast.json"));
        assert_eq!(
            query(&url),
            [
                ("key".to_string(), "KEY".to_string()),
                ("q".to_string(), "Paris".to_string()),
                ("days".to_string(), "5".to_string()),
                ("aqi".to_string(), "no".to_string()),
                ("alerts".to_string(), "no".to_string()),
            ]
        );
    }

    #[test]
    fn forecast_url_encodes_city() {
        let client = WeatherApiClient::new("KEY".into()).with_base_url("http://localhost:1/v1/");
        let url = client.forecast_url("São Paulo&days=99").expect("valid url");

        assert!(url.as_str().starts_with("http://localhost:1/v1/forecast.json?"));
        assert!(!url.as_str().contains("São"));
        assert!(!url.as_str().contains("days=99"));
        assert!(query(&url).contains(&("q".to_string(), "São Paulo&days=99".to_string())));
    }

    #[test]
    fn bad_base_url_is_a_network_failure() {
        let client = WeatherApiClient::new("KEY".into()).with_base_url("not a url");
        let err = client.forecast_url("Paris").unwrap_err();
        assert!(matches!(err, ForecastError::NetworkFailure(_)));
    }

    #[test]
    fn error_code_1006_means_city_not_found() {
        let body = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;
        let err = classify_error_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(err, ForecastError::CityNotFound("No matching location found.".into()));
    }

    #[test]
    fn other_api_errors_are_decode_failures() {
        let body = r#"{"error":{"code":2006,"message":"API key is invalid."}}"#;
        let err = classify_error_body(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, ForecastError::DecodeFailure(ref m) if m.contains("2006")));

        let err = classify_error_body(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, ForecastError::DecodeFailure(ref m) if m.contains("502")));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "ж".repeat(300);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
