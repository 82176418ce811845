use crate::config::{LocationConfig, RunConfig, Settings};
use crate::domain::outfit::{HistoryEntry, Outfit};
use crate::domain::wardrobe::{Category, WardrobeItem};
use crate::time;
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const WARDROBE_PATH: &str = "/v1/wardrobe";
const HISTORY_PATH: &str = "/v1/history";

/// External wardrobe/history row store. Rows follow a fixed column contract:
/// Item, Category, Pillar?, Quantity, Description? for the wardrobe and Date
/// plus the five category columns for history.
#[async_trait::async_trait]
pub trait WardrobeStore: Send + Sync {
    async fn fetch_wardrobe(&self) -> Result<Vec<WardrobeItem>>;

    /// Entries within the trailing lookback window, oldest first as stored.
    async fn fetch_history(&self, lookback_days: i64) -> Result<Vec<HistoryEntry>>;

    async fn append_history(&self, date: NaiveDate, outfit: &Outfit) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpClosetStore {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    location: LocationConfig,
}

impl HttpClosetStore {
    pub fn from_settings(settings: &Settings, config: &RunConfig) -> Result<Self> {
        let base_url = settings.require_closet_base_url()?.to_string();
        let api_key = settings.closet_api_key.clone();

        let timeout_secs = std::env::var("CLOSET_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build closet http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            location: config.location.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self
            .http
            .get(self.url(path))
            .headers(self.headers()?)
            .send()
            .await
            .with_context(|| format!("closet store request failed: GET {path}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read closet store response")?;
        if !status.is_success() {
            anyhow::bail!("closet store HTTP {status}: {text}");
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("closet store response is not valid JSON: {text}"))
    }
}

#[async_trait::async_trait]
impl WardrobeStore for HttpClosetStore {
    async fn fetch_wardrobe(&self) -> Result<Vec<WardrobeItem>> {
        let resp: WardrobeResponse = self.get_json(WARDROBE_PATH).await?;
        Ok(resp
            .items
            .into_iter()
            .filter_map(into_wardrobe_item)
            .collect())
    }

    async fn fetch_history(&self, lookback_days: i64) -> Result<Vec<HistoryEntry>> {
        let resp: HistoryResponse = self.get_json(HISTORY_PATH).await?;
        if resp.entries.is_empty() {
            return Ok(Vec::new());
        }

        let today = time::local_date(&self.location, Utc::now())?;
        let cutoff = today - ChronoDuration::days(lookback_days);
        Ok(resp
            .entries
            .into_iter()
            .filter_map(|row| into_history_entry(row, cutoff))
            .collect())
    }

    async fn append_history(&self, date: NaiveDate, outfit: &Outfit) -> Result<()> {
        let body = history_row_body(date, outfit);
        let res = self
            .http
            .post(self.url(HISTORY_PATH))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .context("closet store history append failed")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("closet store HTTP {status} on history append: {text}");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WardrobeResponse {
    items: Vec<WardrobeRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct WardrobeRow {
    #[serde(rename = "Item")]
    item: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Pillar", default)]
    pillar: Option<String>,
    #[serde(rename = "Quantity", default)]
    quantity: Option<Value>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct HistoryResponse {
    entries: Vec<HistoryRow>,
}

#[derive(Debug, Clone, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Top", default)]
    top: String,
    #[serde(rename = "Bottom", default)]
    bottom: String,
    #[serde(rename = "Shoes", default)]
    shoes: String,
    #[serde(rename = "Outer", default)]
    outer: String,
    #[serde(rename = "Accessory", default)]
    accessory: String,
}

fn into_wardrobe_item(row: WardrobeRow) -> Option<WardrobeItem> {
    let item = row.item.trim().to_string();
    if item.is_empty() {
        tracing::debug!("skipping wardrobe row with empty item name");
        return None;
    }

    let category = match Category::from_label(&row.category) {
        Some(c) => c,
        None => {
            tracing::debug!(item = %item, category = %row.category, "skipping wardrobe row with unknown category");
            return None;
        }
    };

    Some(WardrobeItem {
        item,
        category,
        pillar: row.pillar.filter(|s| !s.trim().is_empty()),
        quantity: parse_quantity(row.quantity.as_ref()),
        description: row.description.filter(|s| !s.trim().is_empty()),
    })
}

/// Quantities arrive as numbers or strings depending on the store; anything
/// missing or unparseable counts as owning one.
fn parse_quantity(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as u32),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.filter(|&q| q >= 1).unwrap_or(1)
}

fn into_history_entry(row: HistoryRow, cutoff: NaiveDate) -> Option<HistoryEntry> {
    let date = match NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            tracing::debug!(date = %row.date, "skipping history row with unparsable date");
            return None;
        }
    };
    if date < cutoff {
        return None;
    }

    Some(HistoryEntry {
        date,
        top: row.top,
        bottom: row.bottom,
        shoes: row.shoes,
        outer: row.outer,
        accessory: row.accessory,
    })
}

fn history_row_body(date: NaiveDate, outfit: &Outfit) -> Value {
    json!({
        "Date": date.to_string(),
        "Top": outfit.top.as_deref().unwrap_or(""),
        "Bottom": outfit.bottom.as_deref().unwrap_or(""),
        "Shoes": outfit.shoes.as_deref().unwrap_or(""),
        "Outer": outfit.outer.as_deref().unwrap_or(""),
        "Accessory": outfit.accessory.as_deref().unwrap_or(""),
    })
}
