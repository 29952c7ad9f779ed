//! Raw API schema → display-ready forecast days.

use chrono::{Locale, NaiveDate, TimeZone, Utc};

use crate::model::{ForecastDay, RawForecastDay, RawForecastResponse};

const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// Map every forecast day in `raw`, keeping the API's day order.
pub fn map(raw: &RawForecastResponse, locale: Locale) -> Vec<ForecastDay> {
    raw.forecast.forecastday.iter().map(|day| map_day(day, locale)).collect()
}

fn map_day(raw: &RawForecastDay, locale: Locale) -> ForecastDay {
    let day = &raw.day;

    ForecastDay {
        date: format_date(&raw.date, locale),
        condition_text: day.condition.text.clone(),
        icon_url: icon_url(&day.condition.icon),
        avg_temp: format!("{}°C", truncate(day.avgtemp_c)),
        max_wind: format!("{} km/h", truncate(day.maxwind_kph)),
        humidity: format!("{}%", truncate(day.avghumidity)),
    }
}

/// `2024-06-05` → `Wednesday, 5 June` (for `en_US`).
///
/// Anything that is not a `yyyy-MM-dd` date is returned unchanged.
pub fn format_date(raw: &str, locale: Locale) -> String {
    let Some(midnight) = NaiveDate::parse_from_str(raw, API_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    else {
        return raw.to_string();
    };
    let at = Utc.from_utc_datetime(&midnight);

    let weekday = at.format_localized("%A", locale).to_string();
    let day_month = at.format_localized("%-d %B", locale).to_string();

    format!("{}, {}", capitalize_first(&weekday), day_month)
}

/// Icons come protocol-relative at 64x64; serve them over https at 128x128.
pub fn icon_url(icon: &str) -> String {
    format!("https:{}", icon.replace("64x64", "128x128"))
}

// Toward zero, never rounded: 21.9 → 21, -3.7 → -3.
fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
