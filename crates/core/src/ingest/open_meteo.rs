use crate::config::{LocationConfig, RunConfig};
use crate::domain::weather::Weather;
use crate::time;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRIES: u32 = 3;
const BACKOFF_BASE_SECS: u64 = 2;

const CURRENT_VARS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation_probability,weather_code,wind_speed_10m";
const DAILY_VARS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_probability_max,uv_index_max";

#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_weather(&self) -> Result<Weather>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
    location: LocationConfig,
    retries: u32,
}

impl OpenMeteoClient {
    pub fn new(config: &RunConfig) -> Result<Self> {
        let base_url =
            std::env::var("OPEN_METEO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("WEATHER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("WEATHER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build weather http client")?;

        Ok(Self {
            http,
            base_url,
            location: config.location.clone(),
            retries,
        })
    }

    async fn fetch_once(&self) -> Result<ForecastResponse> {
        let url = format!("{}/v1/forecast", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .get(url)
            .query(&[
                ("latitude", self.location.latitude.to_string()),
                ("longitude", self.location.longitude.to_string()),
                ("current", CURRENT_VARS.to_string()),
                ("daily", DAILY_VARS.to_string()),
                ("timezone", self.location.timezone.clone()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await
            .context("weather request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read weather response body")?;
        if !status.is_success() {
            anyhow::bail!("weather API HTTP {status}: {text}");
        }

        serde_json::from_str::<ForecastResponse>(&text)
            .with_context(|| format!("weather response is not valid JSON forecast: {text}"))
    }

    fn into_weather(resp: ForecastResponse, now_local: DateTime<FixedOffset>) -> Result<Weather> {
        let current = resp.current;
        let daily = resp.daily;

        Ok(Weather {
            temperature_c: current.temperature_2m,
            feels_like_c: current.apparent_temperature,
            humidity_percent: current.relative_humidity_2m,
            wind_speed_kmh: current.wind_speed_10m,
            rain_chance_percent: current.precipitation_probability,
            conditions: conditions_label(current.weather_code).to_string(),
            high_c: first(&daily.temperature_2m_max, "temperature_2m_max")?,
            low_c: first(&daily.temperature_2m_min, "temperature_2m_min")?,
            daily_rain_chance_percent: first(
                &daily.precipitation_probability_max,
                "precipitation_probability_max",
            )?,
            uv_index: first(&daily.uv_index_max, "uv_index_max")?,
            local_time: time::format_time(&now_local),
            date_formatted: time::format_date(&now_local),
        })
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn fetch_weather(&self) -> Result<Weather> {
        let backoff_base = Duration::from_secs(BACKOFF_BASE_SECS);
        let resp = retry_with_backoff(self.retries, backoff_base, || self.fetch_once()).await?;
        let now_local = time::local_now(&self.location, Utc::now())?;
        Self::into_weather(resp, now_local)
    }
}

/// Runs `op` up to `retries` times, sleeping `backoff_delay` between
/// attempts. The final error names the attempt count.
async fn retry_with_backoff<T, F, Fut>(
    retries: u32,
    backoff_base: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= retries {
                    return Err(
                        err.context(format!("weather fetch failed after {attempt} attempts"))
                    );
                }
                let backoff = backoff_delay(backoff_base, attempt);
                tracing::warn!(attempt, ?backoff, error = %err, "weather fetch failed; retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// base, 2*base, 4*base, ... for attempts 1, 2, 3, ...
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1u32 << (attempt.saturating_sub(1)).min(6))
}

fn first(values: &[f64], field: &'static str) -> Result<f64> {
    values
        .first()
        .copied()
        .with_context(|| format!("daily {field} is empty"))
}

/// Compact WMO weather-code labels; anything unmapped reads "Unknown".
fn conditions_label(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: DailyBlock,
}

#[derive(Debug, Clone, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    #[serde(default)]
    precipitation_probability: f64,
    weather_code: u32,
    wind_speed_10m: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct DailyBlock {
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_probability_max: Vec<f64>,
    uv_index_max: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn parses_forecast_shape_into_weather() {
        let v = json!({
            "current": {
                "temperature_2m": 22.4,
                "relative_humidity_2m": 55.0,
                "apparent_temperature": 21.1,
                "precipitation_probability": 10.0,
                "weather_code": 2,
                "wind_speed_10m": 12.3
            },
            "daily": {
                "temperature_2m_max": [25.0],
                "temperature_2m_min": [18.0],
                "precipitation_probability_max": [15.0],
                "uv_index_max": [6.0]
            }
        });

        let resp: ForecastResponse = serde_json::from_value(v).unwrap();
        let offset = FixedOffset::east_opt(10 * 3600).unwrap();
        let now_local = offset.with_ymd_and_hms(2026, 1, 23, 7, 30, 0).unwrap();

        let weather = OpenMeteoClient::into_weather(resp, now_local).unwrap();
        assert_eq!(weather.temperature_c, 22.4);
        assert_eq!(weather.conditions, "Partly cloudy");
        assert_eq!(weather.high_c, 25.0);
        assert_eq!(weather.daily_rain_chance_percent, 15.0);
        assert_eq!(weather.local_time, "7:30 AM");
        assert_eq!(weather.date_formatted, "Friday 23 Jan");
    }

    #[test]
    fn missing_precipitation_probability_defaults_to_zero() {
        let v = json!({
            "current": {
                "temperature_2m": 22.4,
                "relative_humidity_2m": 55.0,
                "apparent_temperature": 21.1,
                "weather_code": 0,
                "wind_speed_10m": 12.3
            },
            "daily": {
                "temperature_2m_max": [25.0],
                "temperature_2m_min": [18.0],
                "precipitation_probability_max": [15.0],
                "uv_index_max": [6.0]
            }
        });

        let resp: ForecastResponse = serde_json::from_value(v).unwrap();
        assert_eq!(resp.current.precipitation_probability, 0.0);
    }

    #[test]
    fn empty_daily_arrays_are_an_error() {
        let v = json!({
            "current": {
                "temperature_2m": 22.4,
                "relative_humidity_2m": 55.0,
                "apparent_temperature": 21.1,
                "precipitation_probability": 10.0,
                "weather_code": 2,
                "wind_speed_10m": 12.3
            },
            "daily": {
                "temperature_2m_max": [],
                "temperature_2m_min": [],
                "precipitation_probability_max": [],
                "uv_index_max": []
            }
        });

        let resp: ForecastResponse = serde_json::from_value(v).unwrap();
        let offset = FixedOffset::east_opt(10 * 3600).unwrap();
        let now_local = offset.with_ymd_and_hms(2026, 1, 23, 7, 30, 0).unwrap();
        assert!(OpenMeteoClient::into_weather(resp, now_local).is_err());
    }

    #[test]
    fn unknown_weather_codes_read_unknown() {
        assert_eq!(conditions_label(0), "Clear sky");
        assert_eq!(conditions_label(95), "Thunderstorm");
        assert_eq!(conditions_label(42), "Unknown");
    }

    #[test]
    fn backoff_doubles_from_the_base() {
        let base = Duration::from_secs(2);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn exhausted_retries_name_the_attempt_count() {
        let calls = AtomicU32::new(0);
        let err = retry_with_backoff::<Weather, _, _>(3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("weather API HTTP 500")) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let message = format!("{err:#}");
        assert!(message.contains("failed after 3 attempts"), "{message}");
        assert!(message.contains("HTTP 500"), "{message}");
    }

    #[tokio::test]
    async fn retry_stops_on_first_success() {
        let calls = AtomicU32::new(0);
        let value = retry_with_backoff(3, Duration::ZERO, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(anyhow::anyhow!("weather API HTTP 503"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
