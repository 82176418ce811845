use crate::domain::outfit::Outfit;
use crate::domain::wardrobe::Category;
use regex::Regex;
use std::sync::OnceLock;

static FIELD_PATTERNS: OnceLock<Vec<(Category, Regex)>> = OnceLock::new();

fn field_patterns() -> &'static [(Category, Regex)] {
    FIELD_PATTERNS.get_or_init(|| {
        Category::ALL
            .iter()
            .map(|category| {
                let pattern = format!(r"(?i){}:[ \t]*(.+?)(?:\n|$)", category.label());
                (*category, Regex::new(&pattern).unwrap())
            })
            .collect()
    })
}

/// Best-effort extraction of labeled outfit fields from free text. A label
/// ("Top:", "Bottom:", ...) captures the rest of its line, trimmed; a missing
/// label leaves the slot absent. Never fails; absence is the only signal.
///
/// Composite values ("TeeA + ShirtB (unbuttoned)") stay whole; consumers
/// wanting the parts go through [`split_composite`].
pub fn parse_outfit(text: &str) -> Outfit {
    let mut outfit = Outfit::default();
    for (category, pattern) in field_patterns() {
        if let Some(caps) = pattern.captures(text) {
            let value = caps[1].trim();
            if !value.is_empty() {
                outfit.set(*category, value.to_string());
            }
        }
    }
    outfit
}

/// Splits a composite field on `+` and strips parenthetical annotations,
/// yielding the candidate item names for wardrobe matching.
pub fn split_composite(value: &str) -> Vec<String> {
    value
        .split('+')
        .map(strip_parenthetical)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn strip_parenthetical(part: &str) -> String {
    match (part.find('('), part.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            format!("{}{}", &part[..open], &part[close + 1..])
        }
        (Some(open), _) => part[..open].to_string(),
        _ => part.to_string(),
    }
}
