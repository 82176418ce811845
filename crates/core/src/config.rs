use anyhow::Context;

/// Credentials and endpoints, all optional at load time.
/// Callers require what they need via the `require_*` accessors.
#[derive(Debug, Clone)]
pub struct Settings {
    pub anthropic_api_key: Option<String>,
    pub closet_base_url: Option<String>,
    pub closet_api_key: Option<String>,
    pub sms_gateway_url: Option<String>,
    pub sms_gateway_token: Option<String>,
    pub sms_to_number: Option<String>,
    pub sms_from_number: Option<String>,
    pub sentry_dsn: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            closet_base_url: std::env::var("CLOSET_BASE_URL").ok(),
            closet_api_key: std::env::var("CLOSET_API_KEY").ok(),
            sms_gateway_url: std::env::var("SMS_GATEWAY_URL").ok(),
            sms_gateway_token: std::env::var("SMS_GATEWAY_TOKEN").ok(),
            sms_to_number: std::env::var("SMS_TO_NUMBER").ok(),
            sms_from_number: std::env::var("SMS_FROM_NUMBER").ok(),
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
        })
    }

    pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
        self.anthropic_api_key
            .as_deref()
            .context("ANTHROPIC_API_KEY is required")
    }

    pub fn require_closet_base_url(&self) -> anyhow::Result<&str> {
        self.closet_base_url
            .as_deref()
            .context("CLOSET_BASE_URL is required")
    }

    pub fn require_sms_gateway_url(&self) -> anyhow::Result<&str> {
        self.sms_gateway_url
            .as_deref()
            .context("SMS_GATEWAY_URL is required")
    }

    pub fn require_sms_to_number(&self) -> anyhow::Result<&str> {
        self.sms_to_number
            .as_deref()
            .context("SMS_TO_NUMBER is required")
    }
}

#[derive(Debug, Clone)]
pub struct LocationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA label passed through to the weather API.
    pub timezone: String,
    /// Offset used for local date/time math. Sydney is UTC+10 (AEST);
    /// override via LOCATION_UTC_OFFSET_HOURS during daylight saving.
    pub utc_offset_hours: i32,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: "Sydney".to_string(),
            latitude: -33.8688,
            longitude: 151.2093,
            timezone: "Australia/Sydney".to_string(),
            utc_offset_hours: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherRules {
    /// Outer layer recommended only below this forecast high.
    pub outer_layer_temp_c: f64,
    pub layering_temp_min_c: f64,
    pub layering_temp_max_c: f64,
    /// Boots preferred over canvas above this daily rain chance.
    pub rain_threshold_percent: f64,
    /// Cap/hat suggested at or above this UV index.
    pub uv_threshold: f64,
}

impl Default for WeatherRules {
    fn default() -> Self {
        Self {
            outer_layer_temp_c: 21.0,
            layering_temp_min_c: 20.0,
            layering_temp_max_c: 24.0,
            rain_threshold_percent: 40.0,
            uv_threshold: 8.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Hard cap; responses are truncated to this many characters.
    pub max_chars: usize,
    /// Soft target quoted to the model in the prompt.
    pub target_chars: usize,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            max_chars: 480,
            target_chars: 400,
        }
    }
}

/// Tunables for one pipeline run. Defaults mirror the production setup;
/// every field can be overridden from the environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub location: LocationConfig,
    pub recipient: String,
    pub rules: WeatherRules,
    pub sms: SmsConfig,
    pub lookback_days: i64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            location: LocationConfig::default(),
            recipient: "Peter".to_string(),
            rules: WeatherRules::default(),
            sms: SmsConfig::default(),
            lookback_days: 7,
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("LOCATION_NAME") {
            if !s.trim().is_empty() {
                out.location.name = s;
            }
        }
        env_parse("LOCATION_LAT", &mut out.location.latitude);
        env_parse("LOCATION_LON", &mut out.location.longitude);
        if let Ok(s) = std::env::var("LOCATION_TIMEZONE") {
            if !s.trim().is_empty() {
                out.location.timezone = s;
            }
        }
        env_parse("LOCATION_UTC_OFFSET_HOURS", &mut out.location.utc_offset_hours);

        if let Ok(s) = std::env::var("RECIPIENT_NAME") {
            if !s.trim().is_empty() {
                out.recipient = s;
            }
        }

        env_parse("RULE_OUTER_LAYER_TEMP_C", &mut out.rules.outer_layer_temp_c);
        env_parse("RULE_LAYERING_TEMP_MIN_C", &mut out.rules.layering_temp_min_c);
        env_parse("RULE_LAYERING_TEMP_MAX_C", &mut out.rules.layering_temp_max_c);
        env_parse(
            "RULE_RAIN_THRESHOLD_PERCENT",
            &mut out.rules.rain_threshold_percent,
        );
        env_parse("RULE_UV_THRESHOLD", &mut out.rules.uv_threshold);

        env_parse("SMS_MAX_CHARS", &mut out.sms.max_chars);
        env_parse("SMS_TARGET_CHARS", &mut out.sms.target_chars);

        env_parse("HISTORY_LOOKBACK_DAYS", &mut out.lookback_days);

        out
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(s) = std::env::var(key) {
        if let Ok(v) = s.parse::<T>() {
            *slot = v;
        }
    }
}
