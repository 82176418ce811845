use crate::config::WeatherRules;
use crate::domain::wardrobe::Category;
use crate::domain::weather::Weather;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The five outfit slots parsed out of a generation response. Absent means
/// the label was missing from the text; there is no empty-string state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outfit {
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub shoes: Option<String>,
    pub outer: Option<String>,
    pub accessory: Option<String>,
}

impl Outfit {
    pub fn get(&self, category: Category) -> Option<&str> {
        match category {
            Category::Top => self.top.as_deref(),
            Category::Bottom => self.bottom.as_deref(),
            Category::Shoes => self.shoes.as_deref(),
            Category::Outer => self.outer.as_deref(),
            Category::Accessory => self.accessory.as_deref(),
        }
    }

    pub fn set(&mut self, category: Category, value: String) {
        let slot = match category {
            Category::Top => &mut self.top,
            Category::Bottom => &mut self.bottom,
            Category::Shoes => &mut self.shoes,
            Category::Outer => &mut self.outer,
            Category::Accessory => &mut self.accessory,
        };
        *slot = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_none())
    }

    /// Renders present slots as "Label: value" lines, one per line, in
    /// canonical category order.
    pub fn to_labeled_lines(&self) -> String {
        Category::ALL
            .iter()
            .filter_map(|c| self.get(*c).map(|v| format!("{}: {v}", c.label())))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One appended history row: what was worn on a given local date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub top: String,
    pub bottom: String,
    pub shoes: String,
    pub outer: String,
    pub accessory: String,
}

/// Weather-driven expectations the rule scorer checks against. Derived, never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleExpectations {
    pub should_have_outer: bool,
    pub should_prefer_boots: bool,
    pub should_suggest_cap: bool,
}

impl RuleExpectations {
    /// The outer rule keys off the forecast high, not the current
    /// temperature; that matches the historical scoring fixtures.
    pub fn from_weather(weather: &Weather, rules: &WeatherRules) -> Self {
        Self {
            should_have_outer: weather.high_c < rules.outer_layer_temp_c,
            should_prefer_boots: weather.daily_rain_chance_percent > rules.rain_threshold_percent,
            should_suggest_cap: weather.uv_index >= rules.uv_threshold,
        }
    }
}
