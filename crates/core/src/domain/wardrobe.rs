use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Top,
    Bottom,
    Shoes,
    Outer,
    Accessory,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Top,
        Category::Bottom,
        Category::Shoes,
        Category::Outer,
        Category::Accessory,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Top => "Top",
            Category::Bottom => "Bottom",
            Category::Shoes => "Shoes",
            Category::Outer => "Outer",
            Category::Accessory => "Accessory",
        }
    }

    pub fn from_label(s: &str) -> Option<Category> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One wardrobe row. The store owns the lifecycle; a run only reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardrobeItem {
    pub item: String,
    pub category: Category,
    pub pillar: Option<String>,
    /// Owned count; bounds the exclusion rule. Always >= 1.
    pub quantity: u32,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trips() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
    }

    #[test]
    fn from_label_is_case_insensitive_and_trims() {
        assert_eq!(Category::from_label(" top "), Some(Category::Top));
        assert_eq!(Category::from_label("SHOES"), Some(Category::Shoes));
        assert_eq!(Category::from_label("Jacket"), None);
    }
}
