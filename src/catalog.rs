use serde::Serialize;

use crate::calculator::{round1, round_half_up};
use crate::models::NewFoodEntry;

pub const MIN_PORTION_G: f64 = 1.0;
pub const MAX_PORTION_G: f64 = 2000.0;
pub const MAX_SEARCH_RESULTS: usize = 20;

/// A reference food with values per 100 g.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogFood {
    pub name: &'static str,
    pub kcal_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
}

const fn food(name: &'static str, kcal: f64, protein: f64, carbs: f64, fat: f64) -> CatalogFood {
    CatalogFood {
        name,
        kcal_per_100g: kcal,
        protein_per_100g: protein,
        carbs_per_100g: carbs,
        fat_per_100g: fat,
    }
}

pub static FOODS: &[CatalogFood] = &[
    food("Rice cooked", 130.0, 2.7, 28.2, 0.3),
    food("Chicken breast", 165.0, 31.0, 0.0, 3.6),
    food("Ground beef 10%", 176.0, 20.0, 0.0, 10.0),
    food("Oats", 389.0, 16.9, 66.3, 6.9),
    food("Low-fat quark", 67.0, 12.5, 4.0, 0.2),
    food("Milk 1.5%", 47.0, 3.4, 4.9, 1.5),
    food("Olive oil", 884.0, 0.0, 0.0, 100.0),
    food("Banana", 89.0, 1.1, 22.8, 0.3),
    food("Egg", 143.0, 13.0, 1.1, 10.0),
    food("Salmon", 208.0, 20.0, 0.0, 13.0),
];

impl CatalogFood {
    /// Scales the per-100 g values to `grams`: kcal to whole numbers, macros
    /// to one decimal.
    pub fn portion(&self, grams: f64) -> NewFoodEntry {
        let scale = grams / 100.0;
        NewFoodEntry {
            name: self.name.to_string(),
            grams,
            kcal: round_half_up(self.kcal_per_100g * scale) as f64,
            protein: round1(self.protein_per_100g * scale),
            carbs: round1(self.carbs_per_100g * scale),
            fat: round1(self.fat_per_100g * scale),
        }
    }
}

/// Clamps a requested portion to [1, 2000] g.
pub fn clamp_portion(grams: f64) -> f64 {
    if grams.is_nan() {
        return MIN_PORTION_G;
    }
    grams.clamp(MIN_PORTION_G, MAX_PORTION_G)
}

/// Case-insensitive substring search, first 20 hits. An empty query lists
/// the start of the catalog.
pub fn search(query: &str) -> Vec<&'static CatalogFood> {
    let q = query.trim().to_lowercase();
    FOODS
        .iter()
        .filter(|f| f.name.to_lowercase().contains(&q))
        .take(MAX_SEARCH_RESULTS)
        .collect()
}

pub fn find(name: &str) -> Option<&'static CatalogFood> {
    FOODS.iter().find(|f| f.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portion_scales_and_rounds() {
        let rice = find("rice cooked").unwrap();
        let e = rice.portion(200.0);
        assert_eq!(e.name, "Rice cooked");
        assert_eq!(e.grams, 200.0);
        assert_eq!(e.kcal, 260.0);
        assert_eq!(e.protein, 5.4);
        assert_eq!(e.carbs, 56.4);
        assert_eq!(e.fat, 0.6);
    }

    #[test]
    fn search_is_case_insensitive() {
        let hits = search("BEEF");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ground beef 10%");
        assert_eq!(search("").len(), FOODS.len());
        assert!(search("tofu").is_empty());
    }

    #[test]
    fn portions_are_clamped() {
        assert_eq!(clamp_portion(0.0), 1.0);
        assert_eq!(clamp_portion(5000.0), 2000.0);
        assert_eq!(clamp_portion(f64::NAN), 1.0);
        assert_eq!(clamp_portion(120.0), 120.0);
    }
}
