//! Device categorization
//!
//! Devices are placed on a diagram layer and given an icon from their name.
//! The operator table is YAML:
//!
//! ```yaml
//! device_categories:
//!   - { pattern: spine, layer: 3, icon: switch }
//!   - { pattern: leaf, layer: 4, icon: switch }
//! special_rules:
//!   - { pattern: border, type: even_odd_suffix, even_layer: 2, odd_layer: 1, icon: switch }
//! default: { layer: 9, icon: server }
//! ```
//!
//! The table is compiled into an ordered predicate list evaluated
//! first-match-wins: special rules in declaration order, then patterns from
//! longest to shortest, then the default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::input::read_optional;

/// Layer rank and icon of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub layer: u32,
    pub icon: String,
}

impl Category {
    pub fn new(layer: u32, icon: impl Into<String>) -> Self {
        Self {
            layer,
            icon: icon.into(),
        }
    }
}

/// Substring pattern mapped to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPattern {
    pub pattern: String,
    pub layer: u32,
    pub icon: String,
}

/// Name-dependent override evaluated before the regular patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecialRule {
    /// Alternate the layer by the parity of the numeric name suffix
    /// (`border-1` odd, `border-2` even).
    EvenOddSuffix {
        pattern: String,
        even_layer: u32,
        odd_layer: u32,
        icon: String,
    },
}

/// Declarative categorization table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default)]
    pub device_categories: Vec<CategoryPattern>,

    #[serde(default)]
    pub special_rules: Vec<SpecialRule>,

    #[serde(default = "default_category")]
    pub default: Category,
}

fn default_category() -> Category {
    Category::new(9, "server")
}

impl Default for CategoryConfig {
    fn default() -> Self {
        let patterns = [
            ("inband-fw", 1, "firewall"),
            ("border", 2, "switch"),
            ("spine", 3, "switch"),
            ("leaf", 4, "switch"),
            ("oob-fw", 5, "firewall"),
            ("core", 6, "switch"),
            ("switch", 7, "switch"),
        ];
        Self {
            device_categories: patterns
                .into_iter()
                .map(|(pattern, layer, icon)| CategoryPattern {
                    pattern: pattern.to_string(),
                    layer,
                    icon: icon.to_string(),
                })
                .collect(),
            special_rules: Vec::new(),
            default: default_category(),
        }
    }
}

impl CategoryConfig {
    /// Parses a YAML categorization table.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Loads the table, falling back to the built-in one when the file is
    /// absent or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        let Some(text) = read_optional(path) else {
            return Self::default();
        };
        match Self::from_yaml(&text) {
            Ok(config) => {
                info!(
                    patterns = config.device_categories.len(),
                    special_rules = config.special_rules.len(),
                    "Loaded device categories"
                );
                config
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Invalid category table, using built-in categories"
                );
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    /// Case-insensitive substring.
    Contains(String),
    /// Substring plus an even numeric `-N` suffix.
    EvenSuffix(String),
    /// Substring plus an odd numeric `-N` suffix.
    OddSuffix(String),
    Always,
}

impl Predicate {
    fn matches(&self, lower_name: &str) -> bool {
        match self {
            Self::Contains(p) => lower_name.contains(p.as_str()),
            Self::EvenSuffix(p) => {
                lower_name.contains(p.as_str())
                    && numeric_suffix(lower_name).is_some_and(|n| n % 2 == 0)
            }
            Self::OddSuffix(p) => {
                lower_name.contains(p.as_str())
                    && numeric_suffix(lower_name).is_some_and(|n| n % 2 == 1)
            }
            Self::Always => true,
        }
    }
}

fn numeric_suffix(name: &str) -> Option<u64> {
    name.rsplit('-').next()?.parse().ok()
}

/// Compiled first-match-wins categorization table.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<(Predicate, Category)>,
}

impl CategoryTable {
    pub fn new(config: &CategoryConfig) -> Self {
        let mut rules = Vec::new();

        for rule in &config.special_rules {
            match rule {
                SpecialRule::EvenOddSuffix {
                    pattern,
                    even_layer,
                    odd_layer,
                    icon,
                } => {
                    let pattern = pattern.to_lowercase();
                    rules.push((
                        Predicate::EvenSuffix(pattern.clone()),
                        Category::new(*even_layer, icon.as_str()),
                    ));
                    rules.push((
                        Predicate::OddSuffix(pattern),
                        Category::new(*odd_layer, icon.as_str()),
                    ));
                }
            }
        }

        let mut patterns: Vec<&CategoryPattern> = config.device_categories.iter().collect();
        // Stable: equal-length patterns keep declaration order.
        patterns.sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
        for p in patterns {
            rules.push((
                Predicate::Contains(p.pattern.to_lowercase()),
                Category::new(p.layer, p.icon.as_str()),
            ));
        }

        rules.push((Predicate::Always, config.default.clone()));
        Self { rules }
    }

    /// Category for a device name.
    pub fn categorize(&self, name: &str) -> &Category {
        let lower = name.to_lowercase();
        self.rules
            .iter()
            .find(|(predicate, _)| predicate.matches(&lower))
            .map(|(_, category)| category)
            .unwrap_or_else(|| &self.rules[self.rules.len() - 1].1)
    }

    /// Layer assigned by the default rule.
    pub fn default_layer(&self) -> u32 {
        self.rules[self.rules.len() - 1].1.layer
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(&CategoryConfig::default())
    }
}
