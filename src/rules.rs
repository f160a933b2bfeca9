// 🏷️ Category Styling Rules - Rules as Data
// Prioritized (pattern, tag) table; first matching rule wins

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::entry::EntryKind;

// ============================================================================
// TAGS
// ============================================================================

/// Icon family shown next to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTag {
    Food,
    Drink,
    Shopping,
    Transport,
    Home,
    Utilities,
    Health,
    Tech,
    Work,
    Salary,
    Invest,
    Education,
    Travel,
    Gift,
    Other,
}

impl CategoryTag {
    /// Single-glyph marker for terminal rendering
    pub fn glyph(&self) -> &'static str {
        match self {
            CategoryTag::Food => "🍜",
            CategoryTag::Drink => "☕",
            CategoryTag::Shopping => "🛒",
            CategoryTag::Transport => "🚗",
            CategoryTag::Home => "🏠",
            CategoryTag::Utilities => "⚡",
            CategoryTag::Health => "❤",
            CategoryTag::Tech => "📱",
            CategoryTag::Work => "💼",
            CategoryTag::Salary => "💵",
            CategoryTag::Invest => "📈",
            CategoryTag::Education => "🎓",
            CategoryTag::Travel => "✈",
            CategoryTag::Gift => "🎁",
            CategoryTag::Other => "?",
        }
    }
}

/// Card color family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Income,
    Food,
    Transport,
    Neutral,
}

// ============================================================================
// RULE DEFINITION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Rule ID for tracking
    pub id: String,

    /// Case-insensitive substrings; any one of them matches
    pub keywords: Vec<String>,

    pub tag: CategoryTag,

    /// Priority (higher = applied first)
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_priority() -> i32 {
    0
}

impl CategoryRule {
    pub fn new(id: &str, keywords: &[&str], tag: CategoryTag, priority: i32) -> Self {
        CategoryRule {
            id: id.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            tag,
            priority,
        }
    }

    /// Check if any keyword occurs in the category
    pub fn matches(&self, category: &str) -> bool {
        let lower = category.to_lowercase();
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
    }
}

// ============================================================================
// STYLE RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStyle {
    pub tag: CategoryTag,
    pub tone: Tone,
    pub rule_id: Option<String>,
}

// ============================================================================
// RULE TABLE
// ============================================================================

pub struct CategoryStyler {
    rules: Vec<CategoryRule>,
}

impl CategoryStyler {
    /// Create a styler with no rules (everything maps to Other)
    pub fn empty() -> Self {
        CategoryStyler { rules: Vec::new() }
    }

    /// Built-in table, evaluated top to bottom
    pub fn builtin() -> Self {
        let table: [(&str, &[&str], CategoryTag); 14] = [
            ("food", &["food", "eat", "dinner", "lunch", "breakfast", "restaurant", "snack"], CategoryTag::Food),
            ("drink", &["coffee", "tea", "drink"], CategoryTag::Drink),
            ("shopping", &["shop", "buy", "grocery", "market"], CategoryTag::Shopping),
            ("transport", &["car", "taxi", "uber", "bus", "train", "transport", "gas"], CategoryTag::Transport),
            ("home", &["home", "rent", "house", "utilities"], CategoryTag::Home),
            ("utilities", &["electric", "water", "bill", "internet"], CategoryTag::Utilities),
            ("health", &["health", "doctor", "gym", "med"], CategoryTag::Health),
            ("tech", &["tech", "phone", "app", "sub"], CategoryTag::Tech),
            ("work", &["work", "freelance", "project"], CategoryTag::Work),
            ("salary", &["salary", "wage", "pay"], CategoryTag::Salary),
            ("invest", &["invest", "stock", "crypto"], CategoryTag::Invest),
            ("education", &["education", "school", "book"], CategoryTag::Education),
            ("travel", &["travel", "hotel", "flight"], CategoryTag::Travel),
            ("gift", &["gift", "donation"], CategoryTag::Gift),
        ];

        let count = table.len() as i32;
        let rules = table
            .iter()
            .enumerate()
            .map(|(i, (id, keywords, tag))| CategoryRule::new(id, keywords, *tag, count - i as i32))
            .collect();

        CategoryStyler::from_rules(rules)
    }

    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        let rules: Vec<CategoryRule> =
            serde_json::from_str(&content).context("Failed to parse rules JSON")?;

        Ok(CategoryStyler::from_rules(rules))
    }

    /// Create styler from a list of rules
    pub fn from_rules(mut rules: Vec<CategoryRule>) -> Self {
        // Stable: equal priorities keep list order
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        CategoryStyler { rules }
    }

    /// Tag of the first matching rule
    pub fn tag_for(&self, category: &str) -> (CategoryTag, Option<String>) {
        self.rules
            .iter()
            .find(|rule| rule.matches(category))
            .map(|rule| (rule.tag, Some(rule.id.clone())))
            .unwrap_or((CategoryTag::Other, None))
    }

    pub fn style(&self, category: &str, kind: EntryKind) -> CategoryStyle {
        let (tag, rule_id) = self.tag_for(category);
        CategoryStyle {
            tag,
            tone: tone_for(category, kind),
            rule_id,
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for CategoryStyler {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Income is always the income tone; expenses get a tone by keyword
pub fn tone_for(category: &str, kind: EntryKind) -> Tone {
    if kind == EntryKind::Income {
        return Tone::Income;
    }

    let lower = category.to_lowercase();
    if lower.contains("food") || lower.contains("coffee") {
        Tone::Food
    } else if lower.contains("transport") {
        Tone::Transport
    } else {
        Tone::Neutral
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let styler = CategoryStyler::builtin();

        assert_eq!(styler.rule_count(), 14);
        assert_eq!(styler.tag_for("Lunch").0, CategoryTag::Food);
        assert_eq!(styler.tag_for("COFFEE").0, CategoryTag::Drink);
        assert_eq!(styler.tag_for("Salary").0, CategoryTag::Salary);
        assert_eq!(styler.tag_for("Misc").0, CategoryTag::Other);
    }

    #[test]
    fn test_first_match_wins() {
        let styler = CategoryStyler::builtin();

        // "Food delivery app" hits food before tech
        assert_eq!(styler.tag_for("Food delivery app").0, CategoryTag::Food);
        // "Subway" only contains "sub"
        assert_eq!(styler.tag_for("Subway").0, CategoryTag::Tech);
        // "Car payment": transport precedes salary ("pay")
        assert_eq!(styler.tag_for("Car payment").0, CategoryTag::Transport);
    }

    #[test]
    fn test_rule_priority() {
        let styler = CategoryStyler::from_rules(vec![
            CategoryRule::new("general", &["book"], CategoryTag::Education, 1),
            CategoryRule::new("specific", &["booking"], CategoryTag::Travel, 100),
        ]);

        let (tag, rule_id) = styler.tag_for("Hotel booking");
        assert_eq!(tag, CategoryTag::Travel);
        assert_eq!(rule_id, Some("specific".to_string()));
    }

    #[test]
    fn test_tone() {
        assert_eq!(tone_for("Food", EntryKind::Income), Tone::Income);
        assert_eq!(tone_for("coffee", EntryKind::Expense), Tone::Food);
        assert_eq!(tone_for("Transport", EntryKind::Expense), Tone::Transport);
        assert_eq!(tone_for("Rent", EntryKind::Expense), Tone::Neutral);
    }

    #[test]
    fn test_no_match() {
        let styler = CategoryStyler::empty();
        let style = styler.style("Anything", EntryKind::Expense);

        assert_eq!(style.tag, CategoryTag::Other);
        assert_eq!(style.rule_id, None);
    }

    #[test]
    fn test_rules_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(
            &path,
            r#"[{"id": "pets", "keywords": ["vet", "pet"], "tag": "health", "priority": 5}]"#,
        )
        .unwrap();

        let styler = CategoryStyler::from_file(&path).unwrap();
        assert_eq!(styler.tag_for("Pet food").0, CategoryTag::Health);
    }
}
