use crate::config::RunConfig;
use crate::domain::outfit::{Outfit, RuleExpectations};
use crate::domain::wardrobe::WardrobeItem;
use crate::domain::weather::Weather;
use crate::outfit::parser::{parse_outfit, split_composite};
use serde::Serialize;
use serde_json::json;

/// One rule verdict. Scores are 0/1 except `uses_wardrobe_items`, which is
/// the fraction of present fields that resolve to known wardrobe items.
#[derive(Debug, Clone, Serialize)]
pub struct RuleScore {
    pub name: &'static str,
    pub score: f64,
    pub metadata: serde_json::Value,
}

impl RuleScore {
    pub fn passed(&self) -> bool {
        self.score >= 1.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub scores: Vec<RuleScore>,
    /// AND of every rule; advisory only, never gates delivery.
    pub pass: bool,
}

impl ScoreReport {
    pub fn failing(&self) -> impl Iterator<Item = &RuleScore> {
        self.scores.iter().filter(|s| !s.passed())
    }
}

/// Deterministic post-hoc check of the generated text against the
/// weather-derived expectations. Pure: no state, no network, no mutation.
/// Rules are independent and order does not matter.
pub fn score_response(
    response: &str,
    weather: &Weather,
    excluded_tops: &[String],
    wardrobe: &[WardrobeItem],
    config: &RunConfig,
) -> ScoreReport {
    let outfit = parse_outfit(response);
    let expectations = RuleExpectations::from_weather(weather, &config.rules);

    let scores = vec![
        has_required_fields(&outfit),
        under_char_limit(response, config.sms.max_chars),
        uses_correct_date(response, &weather.date_formatted),
        respects_outer_rule(&outfit, expectations, weather),
        respects_boots_rule(&outfit, expectations, weather),
        respects_cap_rule(&outfit, expectations, weather),
        respects_excluded_tops(&outfit, excluded_tops),
        uses_wardrobe_items(&outfit, wardrobe),
    ];
    let pass = scores.iter().all(|s| s.passed());

    ScoreReport { scores, pass }
}

fn has_required_fields(outfit: &Outfit) -> RuleScore {
    let has_top = outfit.top.is_some();
    let has_bottom = outfit.bottom.is_some();
    let has_shoes = outfit.shoes.is_some();
    RuleScore {
        name: "has_required_fields",
        score: bool_score(has_top && has_bottom && has_shoes),
        metadata: json!({
            "has_top": has_top,
            "has_bottom": has_bottom,
            "has_shoes": has_shoes,
        }),
    }
}

fn under_char_limit(response: &str, limit: usize) -> RuleScore {
    let length = response.chars().count();
    RuleScore {
        name: "under_char_limit",
        score: bool_score(length <= limit),
        metadata: json!({ "length": length, "limit": limit }),
    }
}

fn uses_correct_date(response: &str, expected_date: &str) -> RuleScore {
    let found = response.contains(expected_date);
    RuleScore {
        name: "uses_correct_date",
        score: bool_score(found),
        metadata: json!({ "expected_date": expected_date, "found": found }),
    }
}

fn respects_outer_rule(
    outfit: &Outfit,
    expectations: RuleExpectations,
    weather: &Weather,
) -> RuleScore {
    let has_outer = outfit.outer.is_some();
    // Strict equality: an unwanted outer layer fails just like a missing
    // required one.
    let correct = has_outer == expectations.should_have_outer;
    RuleScore {
        name: "respects_outer_rule",
        score: bool_score(correct),
        metadata: json!({
            "has_outer": has_outer,
            "should_have_outer": expectations.should_have_outer,
            "high_c": weather.high_c,
        }),
    }
}

fn respects_boots_rule(
    outfit: &Outfit,
    expectations: RuleExpectations,
    weather: &Weather,
) -> RuleScore {
    if !expectations.should_prefer_boots {
        return RuleScore {
            name: "respects_boots_rule",
            score: 1.0,
            metadata: json!({
                "skipped": true,
                "rain": weather.daily_rain_chance_percent,
            }),
        };
    }

    let shoes = outfit.shoes.as_deref().unwrap_or("").to_lowercase();
    let has_boots = shoes.contains("boot");
    RuleScore {
        name: "respects_boots_rule",
        score: bool_score(has_boots),
        metadata: json!({
            "shoes": outfit.shoes,
            "has_boots": has_boots,
            "rain": weather.daily_rain_chance_percent,
        }),
    }
}

fn respects_cap_rule(
    outfit: &Outfit,
    expectations: RuleExpectations,
    weather: &Weather,
) -> RuleScore {
    if !expectations.should_suggest_cap {
        return RuleScore {
            name: "respects_cap_rule",
            score: 1.0,
            metadata: json!({ "skipped": true, "uv": weather.uv_index }),
        };
    }

    let accessory = outfit.accessory.as_deref().unwrap_or("").to_lowercase();
    let has_cap = accessory.contains("cap") || accessory.contains("hat");
    RuleScore {
        name: "respects_cap_rule",
        score: bool_score(has_cap),
        metadata: json!({
            "accessory": outfit.accessory,
            "has_cap": has_cap,
            "uv": weather.uv_index,
        }),
    }
}

fn respects_excluded_tops(outfit: &Outfit, excluded_tops: &[String]) -> RuleScore {
    if excluded_tops.is_empty() {
        return RuleScore {
            name: "respects_excluded_tops",
            score: 1.0,
            metadata: json!({ "skipped": true }),
        };
    }

    let top_value = outfit.top.as_deref().unwrap_or("").to_lowercase();
    let used_excluded = excluded_tops
        .iter()
        .any(|excluded| top_value.contains(&excluded.to_lowercase()));
    RuleScore {
        name: "respects_excluded_tops",
        score: bool_score(!used_excluded),
        metadata: json!({
            "excluded_tops": excluded_tops,
            "actual_top": outfit.top,
            "used_excluded": used_excluded,
        }),
    }
}

/// Fractional: each present field counts as valid only if every composite
/// part substring-matches a known item name in either direction.
fn uses_wardrobe_items(outfit: &Outfit, wardrobe: &[WardrobeItem]) -> RuleScore {
    let known: Vec<String> = wardrobe.iter().map(|i| i.item.to_lowercase()).collect();

    let mut checked = 0u32;
    let mut valid = 0u32;
    let mut invalid_parts: Vec<String> = Vec::new();

    for category in crate::domain::wardrobe::Category::ALL {
        let Some(value) = outfit.get(category) else {
            continue;
        };
        checked += 1;

        let parts = split_composite(value);
        let all_known = !parts.is_empty()
            && parts.iter().all(|part| {
                let part = part.to_lowercase();
                known
                    .iter()
                    .any(|name| name.contains(&part) || part.contains(name.as_str()))
            });
        if all_known {
            valid += 1;
        } else {
            invalid_parts.push(value.to_string());
        }
    }

    if checked == 0 {
        return RuleScore {
            name: "uses_wardrobe_items",
            score: 1.0,
            metadata: json!({ "skipped": true }),
        };
    }

    RuleScore {
        name: "uses_wardrobe_items",
        score: f64::from(valid) / f64::from(checked),
        metadata: json!({
            "fields_checked": checked,
            "fields_valid": valid,
            "invalid": invalid_parts,
        }),
    }
}

fn bool_score(pass: bool) -> f64 {
    if pass {
        1.0
    } else {
        0.0
    }
}
