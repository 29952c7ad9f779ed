use thiserror::Error;

/// Why a forecast fetch did not produce a forecast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    /// Malformed request URL, transport error or unreadable body.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The body did not match the expected schema.
    #[error("failed to decode forecast response: {0}")]
    DecodeFailure(String),

    /// The API reported that no location matches the query.
    #[error("city not found: {0}")]
    CityNotFound(String),
}

impl ForecastError {
    /// Message shown to the user when a request fails.
    pub fn user_message(&self) -> &'static str {
        match self {
            ForecastError::NetworkFailure(_) => {
                "Network connection problem. Check your internet connection."
            }
            ForecastError::DecodeFailure(_) => "Failed to process weather data.",
            ForecastError::CityNotFound(_) => "City not found.",
        }
    }
}
