//! Screen state and user actions.
//!
//! All UI state lives in [`AppState`], a plain serializable value. The
//! [`Controller`] applies [`Action`]s to it and to the stores; views are
//! derived on demand.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calculator::{OnboardingDraft, ProfilePlan};
use crate::catalog;
use crate::client::{GoalEdit, TrackerClient};
use crate::models::*;
use crate::parser::{FoodTextParser, ItemEdit, ParseDraft};
use crate::store::{KeyValueStore, StoreResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Today,
    Log,
    Progress,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modal {
    Manual,
    Search,
    TextEntry,
    Review { draft: ParseDraft },
    Goal,
}

/// The meal currently being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealFocus {
    pub date_key: NaiveDate,
    pub meal_type: MealType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub tab: Tab,
    pub modal: Option<Modal>,
    pub meal_open: Option<MealFocus>,
    pub onboarding: Option<OnboardingDraft>,
}

/// Values from the manual entry form, already coerced to numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualForm {
    pub name: String,
    pub grams: f64,
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SwitchTab(Tab),
    OnboardingGoal(Goal),
    /// Replaces the draft's form values; the step is kept.
    OnboardingInput(OnboardingDraft),
    OnboardingNext,
    OnboardingBack,
    OnboardingFinish,
    OpenMeal(MealType),
    OpenQuickLog,
    CloseMeal,
    OpenModal(Modal),
    CloseModal,
    DeleteItem(Uuid),
    SaveManual(ManualForm),
    PickCatalog { name: String, grams: f64 },
    ParseText(String),
    SaveReviewed(Vec<ItemEdit>),
    SaveTheme(Theme),
    SaveWeight(f64),
    SaveGoals(GoalEdit),
    ResetAll,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Onboarding { step: u8 },
    MealDetail(MealFocus),
    Tab(Tab),
}

/// Value against target for one bar. `ratio` is clamped to [0, 1] and is 0
/// when there is no positive target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub value: f64,
    pub target: f64,
    pub ratio: f64,
}

impl Progress {
    pub fn new(value: f64, target: f64) -> Self {
        let ratio = if target <= 0.0 {
            0.0
        } else {
            (value / target).clamp(0.0, 1.0)
        };
        Self {
            value,
            target,
            ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealLine {
    pub meal_type: MealType,
    pub label: &'static str,
    pub item_count: usize,
    pub kcal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayView {
    pub date_key: NaiveDate,
    pub kcal: Progress,
    pub protein: Progress,
    pub carbs: Progress,
    pub fat: Progress,
    pub meals: Vec<MealLine>,
}

impl TodayView {
    pub fn new(day: &DayLog, profile: &Profile) -> Self {
        let totals = day.totals();
        let targets = profile.targets();
        Self {
            date_key: day.date_key,
            kcal: Progress::new(totals.kcal, targets.kcal),
            protein: Progress::new(totals.protein, targets.protein),
            carbs: Progress::new(totals.carbs, targets.carbs),
            fat: Progress::new(totals.fat, targets.fat),
            meals: day
                .meals
                .iter()
                .map(|m| MealLine {
                    meal_type: m.meal_type,
                    label: m.meal_type.label(),
                    item_count: m.items.len(),
                    kcal: m.kcal(),
                })
                .collect(),
        }
    }
}

/// Drives the stores from user actions.
pub struct Controller<S, P> {
    client: TrackerClient<S>,
    parser: P,
    state: AppState,
    today: NaiveDate,
}

impl<S: KeyValueStore, P: FoodTextParser> Controller<S, P> {
    pub fn new(client: TrackerClient<S>, parser: P, today: NaiveDate) -> Self {
        Self {
            client,
            parser,
            state: AppState::default(),
            today,
        }
    }

    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn client(&self) -> &TrackerClient<S> {
        &self.client
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn screen(&self) -> StoreResult<Screen> {
        if self.client.profile()?.is_none() {
            let step = self.state.onboarding.as_ref().map_or(1, |d| d.step);
            return Ok(Screen::Onboarding { step });
        }
        Ok(match self.state.meal_open {
            Some(focus) => Screen::MealDetail(focus),
            None => Screen::Tab(self.state.tab),
        })
    }

    /// Result step of the onboarding wizard.
    pub fn onboarding_plan(&self) -> ProfilePlan {
        self.state.onboarding.clone().unwrap_or_default().plan()
    }

    /// `None` until onboarding has finished.
    pub fn today_view(&mut self) -> StoreResult<Option<TodayView>> {
        let Some(profile) = self.client.profile()? else {
            return Ok(None);
        };
        let day = self.client.get_or_create_day(self.today)?;
        Ok(Some(TodayView::new(&day, &profile)))
    }

    /// The open meal's day, created if needed.
    pub fn open_meal(&mut self) -> StoreResult<Option<MealRecord>> {
        let Some(focus) = self.state.meal_open else {
            return Ok(None);
        };
        let day = self.client.get_or_create_day(focus.date_key)?;
        Ok(Some(day.meal(focus.meal_type).clone()))
    }

    fn draft_mut(&mut self) -> &mut OnboardingDraft {
        self.state.onboarding.get_or_insert_with(OnboardingDraft::default)
    }


    pub fn dispatch(&mut self, action: Action) -> StoreResult<()> {
        debug!(?action, "dispatch");
        match action {
            Action::SwitchTab(tab) => self.state.tab = tab,
            Action::OnboardingGoal(goal) => self.draft_mut().goal = goal,
            Action::OnboardingInput(values) => {
                let draft = self.draft_mut();
                let step = draft.step;
                *draft = OnboardingDraft { step, ..values };
            }
            Action::OnboardingNext => self.draft_mut().next_step(),
            Action::OnboardingBack => self.draft_mut().previous_step(),
            Action::OnboardingFinish => {
                let plan = self.onboarding_plan();
                self.client.save_profile(&plan.profile)?;
                self.client.get_or_create_day(self.today)?;
                self.state.onboarding = None;
                self.state.tab = Tab::Today;
            }
            Action::OpenMeal(meal_type) => {
                self.state.meal_open = Some(MealFocus {
                    date_key: self.today,
                    meal_type,
                });
            }
            Action::OpenQuickLog => self.state.tab = Tab::Log,
            Action::CloseMeal => self.state.meal_open = None,
            Action::OpenModal(modal) => self.state.modal = Some(modal),
            Action::CloseModal => self.state.modal = None,
            // Entry edits need an open meal and are ignored without one.
            Action::DeleteItem(id) => {
                let Some(focus) = self.state.meal_open else {
                    return Ok(());
                };
                self.client.remove_item(focus.date_key, focus.meal_type, id)?;
            }
            Action::SaveManual(form) => {
                let Some(focus) = self.state.meal_open else {
                    return Ok(());
                };
                let entry = NewFoodEntry::manual(
                    &form.name, form.grams, form.kcal, form.protein, form.carbs, form.fat,
                );
                self.client.add_item(focus.date_key, focus.meal_type, entry)?;
                self.state.modal = None;
            }
            Action::PickCatalog { name, grams } => {
                // Unknown names leave the modal open.
                if let (Some(focus), Some(food)) = (self.state.meal_open, catalog::find(&name)) {
                    let entry = food.portion(catalog::clamp_portion(grams));
                    self.client.add_item(focus.date_key, focus.meal_type, entry)?;
                    self.state.modal = None;
                }
            }
            Action::ParseText(text) => {
                let draft = self.parser.parse(&text);
                self.state.modal = Some(Modal::Review { draft });
            }
            Action::SaveReviewed(edits) => {
                let Some(focus) = self.state.meal_open else {
                    return Ok(());
                };
                if let Some(Modal::Review { draft }) = &self.state.modal {
                    let entries = draft.review(&edits);
                    self.client.add_items(focus.date_key, focus.meal_type, entries)?;
                    self.state.modal = None;
                }
            }
            Action::SaveTheme(theme) => self.client.save_theme(&theme)?,
            Action::SaveWeight(kg) => {
                self.client.set_weight(self.today, kg)?;
            }
            Action::SaveGoals(edit) => {
                self.client.update_goals(&edit)?;
                self.state.modal = None;
            }
            Action::ResetAll => {
                self.client.reset()?;
                self.state = AppState::default();
            }
        }
        Ok(())
    }
}
