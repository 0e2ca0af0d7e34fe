use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::calculator::finite_or_zero;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Self-reported activity level used to scale BMR into TDEE.
///
/// Stored labels that don't match a known level load as `Moderate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Very,
    Athlete,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 5] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Light,
        ActivityLevel::Moderate,
        ActivityLevel::Very,
        ActivityLevel::Athlete,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Very => 1.725,
            ActivityLevel::Athlete => 1.9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Very => "very",
            ActivityLevel::Athlete => "athlete",
        }
    }

    /// Lenient lookup: anything unrecognised is treated as `Moderate`.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_else(|_| {
            tracing::warn!(label, "unknown activity level, using moderate");
            ActivityLevel::Moderate
        })
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = s.trim().to_ascii_lowercase();
        ActivityLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == level)
            .ok_or_else(|| format!("unknown activity level '{}'", s))
    }
}

impl From<String> for ActivityLevel {
    fn from(label: String) -> Self {
        ActivityLevel::from_label(&label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Cut,
    Maintain,
    Bulk,
}

impl Goal {
    pub fn label(self) -> &'static str {
        match self {
            Goal::Cut => "CUT",
            Goal::Maintain => "MAINTAIN",
            Goal::Bulk => "BULK",
        }
    }
}

/// The inputs the energy calculation depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biometrics {
    pub sex: Sex,
    /// Age in years
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
}

/// The user profile. One per installation.
///
/// Targets are derived from the biometrics at onboarding and can later be
/// overridden one by one through the goal editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub biometrics: Biometrics,
    pub training_days_per_week: u8,
    pub goal: Goal,
    /// Only meaningful when `goal` is `Cut`
    pub deficit_pct: f64,
    /// Only meaningful when `goal` is `Bulk`
    pub surplus_pct: f64,
    /// Daily energy target (kcal)
    pub kcal_target: i64,
    /// Daily protein target (g)
    pub protein_target: i64,
    /// Daily carbs target (g)
    pub carbs_target: i64,
    /// Daily fat target (g)
    pub fat_target: i64,
}

impl Profile {
    pub fn targets(&self) -> Totals {
        Totals {
            kcal: self.kcal_target as f64,
            protein: self.protein_target as f64,
            carbs: self.carbs_target as f64,
            fat: self.fat_target as f64,
        }
    }
}

/// One of the six fixed eating occasions of a day, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    SnackAm,
    Lunch,
    SnackPm,
    Dinner,
    LateSnacks,
}

impl MealType {
    pub const ALL: [MealType; 6] = [
        MealType::Breakfast,
        MealType::SnackAm,
        MealType::Lunch,
        MealType::SnackPm,
        MealType::Dinner,
        MealType::LateSnacks,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::SnackAm => "snack_am",
            MealType::Lunch => "lunch",
            MealType::SnackPm => "snack_pm",
            MealType::Dinner => "dinner",
            MealType::LateSnacks => "late_snacks",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::SnackAm | MealType::SnackPm => "Snack",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::LateSnacks => "Late snacks",
        }
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        MealType::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| format!("unknown meal '{}'", s))
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Energy and macro sums. Also used for targets and catalog values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Calories (kcal)
    pub kcal: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbs (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
}

impl std::ops::AddAssign<&FoodEntry> for Totals {
    fn add_assign(&mut self, item: &FoodEntry) {
        self.kcal += item.kcal;
        self.protein += item.protein;
        self.carbs += item.carbs;
        self.fat += item.fat;
    }
}

/// An individual logged food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: Uuid,
    pub name: String,
    /// Portion weight in grams
    pub grams: f64,
    /// Calories (kcal)
    pub kcal: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbs (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
    pub created_at: DateTime<Utc>,
}

/// A food entry before it has been stored; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFoodEntry {
    pub name: String,
    pub grams: f64,
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl NewFoodEntry {
    /// Entry from the manual form. A blank name becomes "Food".
    pub fn manual(name: &str, grams: f64, kcal: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        let name = name.trim();
        Self {
            name: if name.is_empty() { "Food".to_string() } else { name.to_string() },
            grams,
            kcal,
            protein,
            carbs,
            fat,
        }
    }

    /// Assigns an id and timestamp. Non-finite numbers are stored as 0 so the
    /// record stays decodable.
    pub fn into_entry(self) -> FoodEntry {
        FoodEntry {
            id: Uuid::new_v4(),
            name: self.name,
            grams: finite_or_zero(self.grams),
            kcal: finite_or_zero(self.kcal),
            protein: finite_or_zero(self.protein),
            carbs: finite_or_zero(self.carbs),
            fat: finite_or_zero(self.fat),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    #[serde(rename = "type")]
    pub meal_type: MealType,
    /// Insertion order is display order
    pub items: Vec<FoodEntry>,
}

impl MealRecord {
    pub fn empty(meal_type: MealType) -> Self {
        Self {
            meal_type,
            items: Vec::new(),
        }
    }

    pub fn kcal(&self) -> f64 {
        self.items.iter().map(|it| it.kcal).sum()
    }
}

/// The six meal slots of a day, indexed by `MealType` order.
///
/// Persisted as a list of records tagged by `type`; on load every record is
/// put back into its slot and any missing slot comes back empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Meals([MealRecord; 6]);

impl Meals {
    pub fn new() -> Self {
        Meals(MealType::ALL.map(MealRecord::empty))
    }

    pub fn get(&self, meal: MealType) -> &MealRecord {
        &self.0[meal.index()]
    }

    pub fn get_mut(&mut self, meal: MealType) -> &mut MealRecord {
        &mut self.0[meal.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &MealRecord> {
        self.0.iter()
    }
}

impl Default for Meals {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Meals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Meals {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<MealRecord>::deserialize(deserializer)?;
        let mut meals = Meals::new();
        for record in records {
            let slot = meals.get_mut(record.meal_type);
            slot.items.extend(record.items);
        }
        Ok(meals)
    }
}

/// Everything logged for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLog {
    pub date_key: NaiveDate,
    pub meals: Meals,
    /// Weight in kg
    pub weight_kg: Option<f64>,
}

impl DayLog {
    pub fn empty(date_key: NaiveDate) -> Self {
        Self {
            date_key,
            meals: Meals::new(),
            weight_kg: None,
        }
    }

    pub fn meal(&self, meal: MealType) -> &MealRecord {
        self.meals.get(meal)
    }

    pub fn meal_mut(&mut self, meal: MealType) -> &mut MealRecord {
        self.meals.get_mut(meal)
    }

    /// Sum of every item in every slot. No rounding beyond what items carry.
    pub fn totals(&self) -> Totals {
        let mut totals = Totals::default();
        for meal in self.meals.iter() {
            for item in &meal.items {
                totals += item;
            }
        }
        totals
    }
}

/// Per-day row of the progress history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date_key: NaiveDate,
    pub totals: Totals,
    pub weight_kg: Option<f64>,
}

impl From<&DayLog> for DaySummary {
    fn from(day: &DayLog) -> Self {
        Self {
            date_key: day.date_key,
            totals: day.totals(),
            weight_kg: day.weight_kg,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistoryAverages {
    pub kcal: f64,
    pub protein: f64,
}

impl From<&[DaySummary]> for HistoryAverages {
    fn from(days: &[DaySummary]) -> Self {
        if days.is_empty() {
            return Self::default();
        }
        let n = days.len() as f64;
        Self {
            kcal: days.iter().map(|d| d.totals.kcal).sum::<f64>() / n,
            protein: days.iter().map(|d| d.totals.protein).sum::<f64>() / n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Dark,
    Light,
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            other => Err(format!("unknown theme mode '{}'", other)),
        }
    }
}

/// Display preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub mode: ThemeMode,
    /// Accent colour as `#RRGGBB`
    pub accent: String,
}

pub const DEFAULT_ACCENT: &str = "#7C5CFF";

/// Named accent colours offered in settings.
pub const ACCENT_PRESETS: [(&str, &str); 5] = [
    ("violet", DEFAULT_ACCENT),
    ("blue", "#3B82F6"),
    ("green", "#22C55E"),
    ("orange", "#F97316"),
    ("red", "#EF4444"),
];

/// Hex colour for a preset name, case-insensitive.
pub fn accent_preset(name: &str) -> Option<&'static str> {
    let name = name.trim();
    ACCENT_PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(_, hex)| *hex)
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            mode: ThemeMode::Dark,
            accent: DEFAULT_ACCENT.to_string(),
        }
    }
}

impl Theme {
    /// Blank accents fall back to the default colour. Preset names resolve to
    /// their hex value.
    pub fn new(mode: ThemeMode, accent: &str) -> Self {
        let accent = accent.trim();
        let accent = if accent.is_empty() {
            DEFAULT_ACCENT
        } else {
            accent_preset(accent).unwrap_or(accent)
        };
        Self {
            mode,
            accent: accent.to_string(),
        }
    }
}
