//! Energy and macro target calculations.
//!
//! The four formulas are pure and do no validation. Clamping and fallback
//! values for form input live in [`OnboardingDraft::plan`].

use serde::{Deserialize, Serialize};

use crate::models::{ActivityLevel, Biometrics, Goal, Profile, Sex};

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

pub const DEFAULT_PROTEIN_PER_KG: f64 = 1.8;
pub const DEFAULT_FAT_PER_KG: f64 = 0.9;
pub const DEFAULT_DEFICIT_PCT: f64 = 15.0;
pub const DEFAULT_SURPLUS_PCT: f64 = 10.0;

/// Integer grams / kcal, half rounded up.
pub fn round_half_up(n: f64) -> i64 {
    (n + 0.5).floor() as i64
}

/// Rounds to one decimal place, half up.
pub fn round1(n: f64) -> f64 {
    (n * 10.0 + 0.5).floor() / 10.0
}

/// Coerces a form field to a number; blank or non-numeric input becomes 0.
pub fn coerce_number(input: &str) -> f64 {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Like [`coerce_number`], but keeps a blank or unreadable field apart from
/// an explicit 0. `None` means the caller's default applies.
pub fn optional_number(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Non-finite values become 0.
pub fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Mifflin–St Jeor resting energy expenditure in kcal/day.
pub fn basal_metabolic_rate(sex: Sex, weight_kg: f64, height_cm: f64, age: f64) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age;
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

pub fn total_daily_energy_expenditure(bio: &Biometrics) -> f64 {
    basal_metabolic_rate(bio.sex, bio.weight_kg, bio.height_cm, bio.age as f64)
        * bio.activity_level.multiplier()
}

pub fn target_calories(tdee: f64, goal: Goal, deficit_pct: f64, surplus_pct: f64) -> f64 {
    match goal {
        Goal::Cut => tdee * (1.0 - deficit_pct / 100.0),
        Goal::Bulk => tdee * (1.0 + surplus_pct / 100.0),
        Goal::Maintain => tdee,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub protein: i64,
    pub fat: i64,
    pub carbs: i64,
}

/// Protein and fat scale with body weight; whatever energy is left goes to
/// carbs, floored at zero.
pub fn macro_targets(
    weight_kg: f64,
    kcal_target: f64,
    protein_per_kg: f64,
    fat_per_kg: f64,
) -> MacroTargets {
    let protein = protein_per_kg * weight_kg;
    let fat = fat_per_kg * weight_kg;
    let remaining =
        (kcal_target - protein * KCAL_PER_G_PROTEIN - fat * KCAL_PER_G_FAT).max(0.0);
    let carbs = remaining / KCAL_PER_G_CARBS;

    MacroTargets {
        protein: round_half_up(protein),
        fat: round_half_up(fat),
        carbs: round_half_up(carbs),
    }
}

fn or_default(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}

/// In-progress onboarding input. Numbers are already coerced from the form;
/// [`OnboardingDraft::plan`] applies the clamps. The tuning fields are `None`
/// when left blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingDraft {
    /// Wizard step, 1..=4
    pub step: u8,
    pub goal: Goal,
    pub sex: Sex,
    pub age: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub training_days: f64,
    pub deficit_pct: Option<f64>,
    pub surplus_pct: Option<f64>,
    pub protein_per_kg: Option<f64>,
    pub fat_per_kg: Option<f64>,
}

impl Default for OnboardingDraft {
    fn default() -> Self {
        Self {
            step: 1,
            goal: Goal::Cut,
            sex: Sex::Male,
            age: 25.0,
            height_cm: 180.0,
            weight_kg: 80.0,
            activity_level: ActivityLevel::Moderate,
            training_days: 4.0,
            deficit_pct: None,
            surplus_pct: None,
            protein_per_kg: None,
            fat_per_kg: None,
        }
    }
}

/// A computed profile plus the intermediates shown on the result step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilePlan {
    pub profile: Profile,
    pub bmr: f64,
    pub tdee: f64,
}

impl OnboardingDraft {
    pub const LAST_STEP: u8 = 4;

    pub fn next_step(&mut self) {
        self.step = (self.step.max(1) + 1).min(Self::LAST_STEP);
    }

    pub fn previous_step(&mut self) {
        self.step = self.step.saturating_sub(1).max(1);
    }

    pub fn plan(&self) -> ProfilePlan {
        let biometrics = Biometrics {
            sex: self.sex,
            age: finite_or_zero(self.age).max(0.0) as u32,
            height_cm: finite_or_zero(self.height_cm),
            weight_kg: finite_or_zero(self.weight_kg),
            activity_level: self.activity_level,
        };
        let training_days_per_week = finite_or_zero(self.training_days).clamp(0.0, 7.0) as u8;
        let deficit_pct = or_default(self.deficit_pct, DEFAULT_DEFICIT_PCT).clamp(10.0, 25.0);
        let surplus_pct = or_default(self.surplus_pct, DEFAULT_SURPLUS_PCT).clamp(5.0, 20.0);
        let protein_per_kg =
            or_default(self.protein_per_kg, DEFAULT_PROTEIN_PER_KG).clamp(1.6, 2.2);
        let fat_per_kg = or_default(self.fat_per_kg, DEFAULT_FAT_PER_KG).clamp(0.6, 1.2);

        let bmr = basal_metabolic_rate(
            biometrics.sex,
            biometrics.weight_kg,
            biometrics.height_cm,
            biometrics.age as f64,
        );
        let tdee = total_daily_energy_expenditure(&biometrics);
        let kcal = target_calories(tdee, self.goal, deficit_pct, surplus_pct);
        let macros = macro_targets(biometrics.weight_kg, kcal, protein_per_kg, fat_per_kg);

        ProfilePlan {
            profile: Profile {
                biometrics,
                training_days_per_week,
                goal: self.goal,
                deficit_pct,
                surplus_pct,
                kcal_target: round_half_up(kcal),
                protein_target: macros.protein,
                carbs_target: macros.carbs,
                fat_target: macros.fat,
            },
            bmr,
            tdee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn bio(level: ActivityLevel) -> Biometrics {
        Biometrics {
            sex: Sex::Male,
            age: 30,
            height_cm: 180.0,
            weight_kg: 80.0,
            activity_level: level,
        }
    }

    #[test]
    fn bmr_mifflin_st_jeor() {
        // 800 + 1125 - 150 = 1775 before the sex offset
        assert!(approx(basal_metabolic_rate(Sex::Male, 80.0, 180.0, 30.0), 1780.0));
        assert!(approx(basal_metabolic_rate(Sex::Female, 80.0, 180.0, 30.0), 1614.0));
    }

    #[test]
    fn bmr_is_unvalidated() {
        assert!(basal_metabolic_rate(Sex::Female, 0.0, 0.0, 90.0) < 0.0);
    }

    #[test]
    fn tdee_uses_activity_table() {
        let expected = [
            (ActivityLevel::Sedentary, 1.2),
            (ActivityLevel::Light, 1.375),
            (ActivityLevel::Moderate, 1.55),
            (ActivityLevel::Very, 1.725),
            (ActivityLevel::Athlete, 1.9),
        ];
        for (level, mult) in expected {
            assert!(approx(total_daily_energy_expenditure(&bio(level)), 1780.0 * mult));
        }
    }

    #[test]
    fn tdee_unknown_level_is_moderate() {
        let level = ActivityLevel::from_label("couch potato");
        assert!(approx(total_daily_energy_expenditure(&bio(level)), 1780.0 * 1.55));
    }

    #[test]
    fn target_calories_by_goal() {
        assert!(approx(target_calories(2500.0, Goal::Cut, 15.0, 10.0), 2125.0));
        assert!(approx(target_calories(2500.0, Goal::Bulk, 15.0, 10.0), 2750.0));
        assert_eq!(target_calories(2500.0, Goal::Maintain, 15.0, 10.0), 2500.0);
    }

    #[test]
    fn macro_split_fills_carbs() {
        let m = macro_targets(80.0, 2000.0, 1.8, 0.9);
        assert_eq!(
            m,
            MacroTargets {
                protein: 144,
                fat: 72,
                carbs: 194
            }
        );
    }

    #[test]
    fn carbs_never_negative() {
        // 576 + 648 = 1224 kcal from protein and fat alone
        let m = macro_targets(80.0, 1000.0, 1.8, 0.9);
        assert_eq!(m.carbs, 0);
        let m = macro_targets(80.0, 1224.0, 1.8, 0.9);
        assert_eq!(m.carbs, 0);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round1(3.45), 3.5);
        assert_eq!(round1(0.34), 0.3);
    }

    #[test]
    fn coerce_number_defaults_to_zero() {
        assert_eq!(coerce_number(" 82.5 "), 82.5);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("abc"), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
        assert_eq!(coerce_number("inf"), 0.0);
    }

    #[test]
    fn optional_number_keeps_zero_apart_from_blank() {
        assert_eq!(optional_number("0"), Some(0.0));
        assert_eq!(optional_number(" 12 "), Some(12.0));
        assert_eq!(optional_number(""), None);
        assert_eq!(optional_number("-inf"), None);
    }

    #[test]
    fn plan_clamps_inputs() {
        let draft = OnboardingDraft {
            training_days: 9.0,
            deficit_pct: Some(40.0),
            surplus_pct: Some(1.0),
            protein_per_kg: Some(3.0),
            fat_per_kg: Some(0.1),
            ..OnboardingDraft::default()
        };
        let plan = draft.plan();
        assert_eq!(plan.profile.training_days_per_week, 7);
        assert_eq!(plan.profile.deficit_pct, 25.0);
        assert_eq!(plan.profile.surplus_pct, 5.0);
        // 2.2 g/kg and 0.6 g/kg at 80 kg
        assert_eq!(plan.profile.protein_target, 176);
        assert_eq!(plan.profile.fat_target, 48);
    }

    #[test]
    fn plan_blank_inputs_fall_back_to_defaults() {
        let draft = OnboardingDraft {
            deficit_pct: optional_number(""),
            surplus_pct: optional_number("n/a"),
            protein_per_kg: None,
            fat_per_kg: Some(f64::NAN),
            ..OnboardingDraft::default()
        };
        let plan = draft.plan();
        assert_eq!(plan.profile.deficit_pct, 15.0);
        assert_eq!(plan.profile.surplus_pct, 10.0);
        assert_eq!(plan.profile.protein_target, 144);
        assert_eq!(plan.profile.fat_target, 72);
    }

    #[test]
    fn plan_explicit_zero_is_clamped_not_defaulted() {
        let draft = OnboardingDraft {
            deficit_pct: optional_number("0"),
            surplus_pct: Some(0.0),
            protein_per_kg: Some(0.0),
            fat_per_kg: Some(0.0),
            ..OnboardingDraft::default()
        };
        let plan = draft.plan();
        assert_eq!(plan.profile.deficit_pct, 10.0);
        assert_eq!(plan.profile.surplus_pct, 5.0);
        // 1.6 g/kg and 0.6 g/kg at 80 kg
        assert_eq!(plan.profile.protein_target, 128);
        assert_eq!(plan.profile.fat_target, 48);
    }

    #[test]
    fn plan_non_finite_biometrics_stay_serializable() {
        let draft = OnboardingDraft {
            weight_kg: f64::INFINITY,
            height_cm: f64::NAN,
            training_days: f64::NAN,
            ..OnboardingDraft::default()
        };
        let profile = draft.plan().profile;
        assert_eq!(profile.biometrics.weight_kg, 0.0);
        assert_eq!(profile.biometrics.height_cm, 0.0);
        assert_eq!(profile.training_days_per_week, 0);

        let json = serde_json::to_value(&profile).unwrap();
        let back: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn plan_default_draft() {
        // male, 25y, 180cm, 80kg: 800 + 1125 - 125 + 5 = 1805
        let plan = OnboardingDraft::default().plan();
        assert!(approx(plan.bmr, 1805.0));
        assert!(approx(plan.tdee, 1805.0 * 1.55));
        let kcal = target_calories(plan.tdee, Goal::Cut, 15.0, 10.0);
        assert_eq!(plan.profile.kcal_target, round_half_up(kcal));
        let expected = macro_targets(80.0, kcal, 1.8, 0.9);
        assert_eq!(plan.profile.carbs_target, expected.carbs);
        assert_eq!(plan.profile.goal, Goal::Cut);
    }

    #[test]
    fn steps_stay_in_range() {
        let mut draft = OnboardingDraft::default();
        draft.previous_step();
        assert_eq!(draft.step, 1);
        for _ in 0..10 {
            draft.next_step();
        }
        assert_eq!(draft.step, OnboardingDraft::LAST_STEP);
    }
}
