use serde::{Deserialize, Serialize};

/// One weather snapshot for the target location. Fetched once per run and
/// immutable afterwards; all downstream decisions derive from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_kmh: f64,
    /// Rain chance right now.
    pub rain_chance_percent: f64,
    pub conditions: String,
    pub high_c: f64,
    pub low_c: f64,
    /// Maximum rain chance over the forecast day; drives the boots rule.
    pub daily_rain_chance_percent: f64,
    pub uv_index: f64,
    /// e.g. "7:30 AM"
    pub local_time: String,
    /// e.g. "Friday 24 Jan"
    pub date_formatted: String,
}
