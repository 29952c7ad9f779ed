use serde::{Deserialize, Serialize};

/// One forecast day, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastDay {
    /// e.g. "Wednesday, 5 June"; the raw API date if it could not be parsed.
    pub date: String,
    pub condition_text: String,
    pub icon_url: String,
    pub avg_temp: String,
    pub max_wind: String,
    pub humidity: String,
}

/// Body of a successful `forecast.json` response.
///
/// Only the fields the mapper reads are declared; everything else the API
/// sends is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawForecastResponse {
    pub location: RawLocation,
    pub forecast: RawForecast,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLocation {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecast {
    pub forecastday: Vec<RawForecastDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecastDay {
    /// `yyyy-MM-dd`
    pub date: String,
    pub day: RawDay,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDay {
    pub avgtemp_c: f64,
    pub maxwind_kph: f64,
    pub avghumidity: f64,
    pub condition: RawCondition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub text: String,
    /// Protocol-relative, e.g. `//cdn.weatherapi.com/weather/64x64/day/113.png`.
    pub icon: String,
}

/// Error body returned by weatherapi.com alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub message: String,
}
