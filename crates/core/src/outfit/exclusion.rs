use crate::domain::outfit::HistoryEntry;
use crate::domain::wardrobe::{Category, WardrobeItem};
use std::collections::HashMap;

/// Wear-history rollup feeding the prompt and the scorer: which tops are
/// used up this week, which bottoms were recently worn, and the rendered
/// `<recent_outfits>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryDigest {
    /// Tops worn at least as many times as owned within the window, in
    /// first-worn order.
    pub excluded_tops: Vec<String>,
    /// Distinct non-empty bottoms, first-worn order. Advisory only.
    pub bottoms_worn: Vec<String>,
    /// Prompt-ready block; empty string when there is no history.
    pub history_block: String,
}

impl HistoryDigest {
    pub fn build(
        wardrobe: &[WardrobeItem],
        history: &[HistoryEntry],
        lookback_days: i64,
    ) -> Self {
        if history.is_empty() {
            return Self::default();
        }

        let mut top_order: Vec<&str> = Vec::new();
        let mut wear_counts: HashMap<&str, u32> = HashMap::new();
        for entry in history {
            if entry.top.is_empty() {
                continue;
            }
            let count = wear_counts.entry(entry.top.as_str()).or_insert(0);
            if *count == 0 {
                top_order.push(entry.top.as_str());
            }
            *count += 1;
        }

        let mut owned: HashMap<&str, u32> = HashMap::new();
        for item in wardrobe {
            if item.category == Category::Top {
                owned.insert(item.item.as_str(), item.quantity);
            }
        }

        // A top is used up only once its wear count reaches the owned
        // quantity; owning several identical pieces defers exclusion.
        let excluded_tops: Vec<String> = top_order
            .iter()
            .filter(|top| wear_counts[*top] >= owned.get(*top).copied().unwrap_or(1))
            .map(|top| top.to_string())
            .collect();

        let mut bottoms_worn: Vec<String> = Vec::new();
        for entry in history {
            if !entry.bottom.is_empty() && !bottoms_worn.iter().any(|b| b == &entry.bottom) {
                bottoms_worn.push(entry.bottom.clone());
            }
        }

        let history_block =
            render_history_block(&excluded_tops, &bottoms_worn, history, lookback_days);

        Self {
            excluded_tops,
            bottoms_worn,
            history_block,
        }
    }
}

fn render_history_block(
    excluded_tops: &[String],
    bottoms_worn: &[String],
    history: &[HistoryEntry],
    lookback_days: i64,
) -> String {
    let excluded_line = if excluded_tops.is_empty() {
        "None - all tops available".to_string()
    } else {
        excluded_tops.join(", ")
    };
    let bottoms_line = if bottoms_worn.is_empty() {
        "None".to_string()
    } else {
        bottoms_worn.join(", ")
    };

    let entries = history
        .iter()
        .map(|h| {
            format!(
                "- {}: Top={}, Bottom={}",
                h.date,
                or_na(&h.top),
                or_na(&h.bottom)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\n<recent_outfits>\nRULES:\n\
- DO NOT recommend these tops (already worn their max times this week): {excluded_line}\n\
- Try to vary bottoms (recently worn): {bottoms_line}\n\n\
Full history (last {lookback_days} days):\n{entries}\n</recent_outfits>"
    )
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

/// `- {item} ({category}, {pillar|N/A}): {description|N/A}` per line.
pub fn format_wardrobe(items: &[WardrobeItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- {} ({}, {}): {}",
                item.item,
                item.category,
                item.pillar.as_deref().unwrap_or("N/A"),
                item.description.as_deref().unwrap_or("N/A")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn top(name: &str, quantity: u32) -> WardrobeItem {
        WardrobeItem {
            item: name.to_string(),
            category: Category::Top,
            pillar: Some("Workwear".to_string()),
            quantity,
            description: None,
        }
    }

    fn worn(date: &str, top: &str, bottom: &str) -> HistoryEntry {
        HistoryEntry {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            top: top.to_string(),
            bottom: bottom.to_string(),
            shoes: String::new(),
            outer: String::new(),
            accessory: String::new(),
        }
    }

    #[test]
    fn empty_history_yields_empty_digest() {
        let digest = HistoryDigest::build(&[top("Chambray", 1)], &[], 7);
        assert_eq!(digest, HistoryDigest::default());
        assert_eq!(digest.history_block, "");
    }

    #[test]
    fn single_wear_excludes_quantity_one_top() {
        let wardrobe = [top("Chambray", 1), top("OCBD", 1)];
        let history = [worn("2026-01-26", "Chambray", "Fatigues")];
        let digest = HistoryDigest::build(&wardrobe, &history, 7);
        assert_eq!(digest.excluded_tops, vec!["Chambray".to_string()]);
    }

    #[test]
    fn quantity_bounds_exclusion() {
        // Owning 8 identical tees exempts the tee until worn 8 times.
        let wardrobe = [top("Whitesville Tee", 8)];
        let mut history: Vec<HistoryEntry> = (20..27)
            .map(|d| worn(&format!("2026-01-{d}"), "Whitesville Tee", "Jeans"))
            .collect();
        let digest = HistoryDigest::build(&wardrobe, &history, 7);
        assert!(digest.excluded_tops.is_empty());

        history.push(worn("2026-01-27", "Whitesville Tee", "Jeans"));
        let digest = HistoryDigest::build(&wardrobe, &history, 7);
        assert_eq!(digest.excluded_tops, vec!["Whitesville Tee".to_string()]);
    }

    #[test]
    fn tops_missing_from_wardrobe_default_to_quantity_one() {
        let history = [worn("2026-01-26", "Borrowed Shirt", "")];
        let digest = HistoryDigest::build(&[], &history, 7);
        assert_eq!(digest.excluded_tops, vec!["Borrowed Shirt".to_string()]);
    }

    #[test]
    fn bottoms_are_deduplicated_in_first_worn_order() {
        let history = [
            worn("2026-01-24", "A", "Fatigues"),
            worn("2026-01-25", "B", "Jeans"),
            worn("2026-01-26", "C", "Fatigues"),
        ];
        let digest = HistoryDigest::build(&[], &history, 7);
        assert_eq!(
            digest.bottoms_worn,
            vec!["Fatigues".to_string(), "Jeans".to_string()]
        );
    }

    #[test]
    fn history_block_names_exclusions_and_window() {
        let wardrobe = [top("Chambray", 1)];
        let history = [worn("2026-01-26", "Chambray", "Fatigues")];
        let digest = HistoryDigest::build(&wardrobe, &history, 7);
        assert!(digest.history_block.starts_with("\n<recent_outfits>"));
        assert!(digest.history_block.contains("DO NOT recommend these tops"));
        assert!(digest.history_block.contains("Chambray"));
        assert!(digest.history_block.contains("Full history (last 7 days):"));
        assert!(digest
            .history_block
            .contains("- 2026-01-26: Top=Chambray, Bottom=Fatigues"));
        assert!(digest.history_block.ends_with("</recent_outfits>"));
    }

    #[test]
    fn history_block_reports_none_when_nothing_excluded() {
        let wardrobe = [top("Chambray", 2)];
        let history = [worn("2026-01-26", "Chambray", "")];
        let digest = HistoryDigest::build(&wardrobe, &history, 7);
        assert!(digest
            .history_block
            .contains("None - all tops available"));
        assert!(digest.history_block.contains("Bottom=N/A"));
    }

    #[test]
    fn formats_wardrobe_lines_with_na_fallbacks() {
        let items = [
            WardrobeItem {
                item: "Alden Indy Boots".to_string(),
                category: Category::Shoes,
                pillar: Some("Workwear".to_string()),
                quantity: 1,
                description: Some("Brown leather work boots".to_string()),
            },
            WardrobeItem {
                item: "Tochigi Leather Belt".to_string(),
                category: Category::Accessory,
                pillar: None,
                quantity: 1,
                description: None,
            },
        ];
        assert_eq!(
            format_wardrobe(&items),
            "- Alden Indy Boots (Shoes, Workwear): Brown leather work boots\n\
- Tochigi Leather Belt (Accessory, N/A): N/A"
        );
    }
}
