use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calculator::finite_or_zero;
use crate::models::*;
use crate::store::{self, get_typed, set_typed, KeyValueStore, StoreResult};

/// Longest window [`TrackerClient::history`] scans, about ten years.
pub const MAX_HISTORY_DAYS: u32 = 3660;

/// Manual target overrides from the goal editor. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalEdit {
    pub goal: Option<Goal>,
    pub weight_kg: Option<f64>,
    pub kcal_target: Option<i64>,
    pub protein_target: Option<i64>,
    pub carbs_target: Option<i64>,
    pub fat_target: Option<i64>,
}

/// Day logs, profile and preferences on top of a key/value store.
///
/// Every mutation is a full read-modify-write of one record.
pub struct TrackerClient<S> {
    store: S,
}

impl<S: KeyValueStore> TrackerClient<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Reads a day without creating it.
    pub fn day(&self, date: NaiveDate) -> StoreResult<Option<DayLog>> {
        get_typed(&self.store, &store::day_key(date))
    }

    fn save_day(&mut self, day: &DayLog) -> StoreResult<()> {
        set_typed(&mut self.store, &store::day_key(day.date_key), day)
    }

    /// Returns the stored day, or stores and returns an empty one.
    pub fn get_or_create_day(&mut self, date: NaiveDate) -> StoreResult<DayLog> {
        if let Some(day) = self.day(date)? {
            debug!(%date, "loaded day log");
            return Ok(day);
        }
        let day = DayLog::empty(date);
        self.save_day(&day)?;
        info!(%date, "created empty day log");
        Ok(day)
    }

    /// Appends `entry` to the end of the meal and returns it as stored.
    pub fn add_item(
        &mut self,
        date: NaiveDate,
        meal: MealType,
        entry: NewFoodEntry,
    ) -> StoreResult<FoodEntry> {
        let mut stored = self.add_items(date, meal, vec![entry])?;
        Ok(stored.remove(0))
    }

    /// Appends several entries in one write.
    pub fn add_items(
        &mut self,
        date: NaiveDate,
        meal: MealType,
        entries: Vec<NewFoodEntry>,
    ) -> StoreResult<Vec<FoodEntry>> {
        let mut day = self.get_or_create_day(date)?;
        let stored: Vec<FoodEntry> = entries.into_iter().map(NewFoodEntry::into_entry).collect();
        day.meal_mut(meal).items.extend(stored.iter().cloned());
        self.save_day(&day)?;
        info!(%date, %meal, count = stored.len(), "logged food");
        Ok(stored)
    }

    /// Removes the entry with `id`. Unknown ids are ignored.
    pub fn remove_item(&mut self, date: NaiveDate, meal: MealType, id: Uuid) -> StoreResult<()> {
        let mut day = self.get_or_create_day(date)?;
        let items = &mut day.meal_mut(meal).items;
        let before = items.len();
        items.retain(|it| it.id != id);
        let removed = before - items.len();
        self.save_day(&day)?;
        info!(%date, %meal, %id, removed, "removed food entry");
        Ok(())
    }

    /// Records the day's weight. Zero, negative or non-finite clears it.
    pub fn set_weight(&mut self, date: NaiveDate, weight_kg: f64) -> StoreResult<DayLog> {
        let mut day = self.get_or_create_day(date)?;
        day.weight_kg = Some(finite_or_zero(weight_kg)).filter(|w| *w > 0.0);
        self.save_day(&day)?;
        info!(%date, weight = ?day.weight_kg, "saved weight");
        Ok(day)
    }

    /// Summaries of the stored days among the `days` dates ending at `end`,
    /// oldest first. Missing dates are skipped, not created. The window is
    /// capped at [`MAX_HISTORY_DAYS`] and stops at the earliest representable
    /// date.
    pub fn history(&self, end: NaiveDate, days: u32) -> StoreResult<Vec<DaySummary>> {
        let mut summaries = Vec::new();
        for offset in 0..days.min(MAX_HISTORY_DAYS) {
            let Some(date) = end.checked_sub_signed(Duration::days(offset as i64)) else {
                break;
            };
            if let Some(day) = self.day(date)? {
                summaries.push(DaySummary::from(&day));
            }
        }
        summaries.sort_by_key(|s| s.date_key);
        Ok(summaries)
    }

    pub fn profile(&self) -> StoreResult<Option<Profile>> {
        get_typed(&self.store, &store::profile_key())
    }

    pub fn save_profile(&mut self, profile: &Profile) -> StoreResult<()> {
        set_typed(&mut self.store, &store::profile_key(), profile)?;
        info!(goal = ?profile.goal, kcal = profile.kcal_target, "saved profile");
        Ok(())
    }

    /// Applies manual overrides. Targets are not re-derived from biometrics.
    /// Returns `None` when no profile exists yet.
    pub fn update_goals(&mut self, edit: &GoalEdit) -> StoreResult<Option<Profile>> {
        let Some(mut profile) = self.profile()? else {
            return Ok(None);
        };
        if let Some(goal) = edit.goal {
            profile.goal = goal;
        }
        if let Some(weight) = edit.weight_kg {
            profile.biometrics.weight_kg = finite_or_zero(weight);
        }
        if let Some(kcal) = edit.kcal_target {
            profile.kcal_target = kcal;
        }
        if let Some(protein) = edit.protein_target {
            profile.protein_target = protein;
        }
        if let Some(carbs) = edit.carbs_target {
            profile.carbs_target = carbs;
        }
        if let Some(fat) = edit.fat_target {
            profile.fat_target = fat;
        }
        self.save_profile(&profile)?;
        Ok(Some(profile))
    }

    pub fn theme(&self) -> StoreResult<Theme> {
        Ok(get_typed(&self.store, &store::theme_key())?.unwrap_or_default())
    }

    pub fn save_theme(&mut self, theme: &Theme) -> StoreResult<()> {
        set_typed(&mut self.store, &store::theme_key(), theme)
    }

    /// Wipes profile, preferences and every day log.
    pub fn reset(&mut self) -> StoreResult<()> {
        self.store.clear()?;
        info!("cleared all stored data");
        Ok(())
    }
}
