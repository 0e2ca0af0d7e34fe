//! Free-text food parsing.
//!
//! [`HeuristicParser`] is a placeholder: it matches catalog names by
//! substring and pulls a gram amount out with a regex. Anything that
//! implements [`FoodTextParser`] can replace it. Drafts are never stored
//! directly; they go through [`ParseDraft::review`] first.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{self, CatalogFood};
use crate::models::NewFoodEntry;

pub const DEFAULT_GRAMS: f64 = 150.0;
const SHORT_TEXT_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// What a parser proposes for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseDraft {
    pub confidence: Confidence,
    pub questions: Vec<String>,
    pub items: Vec<NewFoodEntry>,
}

/// Per-item overrides from the review step. `None` keeps the proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemEdit {
    pub grams: Option<f64>,
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl ParseDraft {
    /// Applies the reviewer's edits by position and returns the entries to
    /// store. Items without an edit are taken as proposed.
    pub fn review(&self, edits: &[ItemEdit]) -> Vec<NewFoodEntry> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let edit = edits.get(idx).cloned().unwrap_or_default();
                NewFoodEntry {
                    name: item.name.clone(),
                    grams: edit.grams.unwrap_or(item.grams),
                    kcal: edit.kcal.unwrap_or(item.kcal),
                    protein: edit.protein.unwrap_or(item.protein),
                    carbs: edit.carbs.unwrap_or(item.carbs),
                    fat: edit.fat.unwrap_or(item.fat),
                }
            })
            .collect()
    }
}

pub trait FoodTextParser {
    fn parse(&self, text: &str) -> ParseDraft;
}

pub struct HeuristicParser {
    foods: &'static [CatalogFood],
    grams_re: Regex,
}

impl HeuristicParser {
    pub fn new() -> Self {
        Self::with_catalog(catalog::FOODS)
    }

    /// `foods` must not be empty; the first food is the fallback guess.
    pub fn with_catalog(foods: &'static [CatalogFood]) -> Self {
        Self {
            foods,
            grams_re: Regex::new(r"([0-9]+)\s?g").expect("static regex"),
        }
    }

    fn guess(&self, lower: &str) -> Option<&'static CatalogFood> {
        self.foods
            .iter()
            .find(|f| {
                let name = f.name.to_lowercase();
                let first_word = name.split(' ').next().unwrap_or_default();
                lower.contains(first_word)
            })
            .or_else(|| self.foods.first())
    }

    fn grams(&self, lower: &str) -> Option<f64> {
        let caps = self.grams_re.captures(lower)?;
        let n: f64 = caps[1].parse().ok()?;
        Some(catalog::clamp_portion(n))
    }
}

impl Default for HeuristicParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FoodTextParser for HeuristicParser {
    fn parse(&self, text: &str) -> ParseDraft {
        let lower = text.to_lowercase();
        let found_grams = self.grams(&lower);

        let confidence = match found_grams {
            Some(_) => Confidence::High,
            None if lower.chars().count() > SHORT_TEXT_CHARS => Confidence::Medium,
            None => Confidence::Low,
        };
        let questions = if confidence == Confidence::Low {
            vec!["Roughly how many grams was it?".to_string()]
        } else {
            Vec::new()
        };

        let grams = found_grams.unwrap_or(DEFAULT_GRAMS);
        let items = self
            .guess(&lower)
            .map(|food| vec![food.portion(grams)])
            .unwrap_or_default();

        tracing::debug!(?confidence, grams, items = items.len(), "parsed food text");
        ParseDraft {
            confidence,
            questions,
            items,
        }
    }
}
