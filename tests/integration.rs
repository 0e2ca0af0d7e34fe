use std::path::Path;

use chrono::{Duration, NaiveDate};
use macro_tracker::app::{Action, Controller, ManualForm, Modal, Screen, Tab};
use macro_tracker::calculator::OnboardingDraft;
use macro_tracker::client::{GoalEdit, TrackerClient};
use macro_tracker::models::{Goal, HistoryAverages, MealType, Sex, Theme, ThemeMode};
use macro_tracker::parser::{HeuristicParser, ItemEdit};
use macro_tracker::store::{self, FileStore, KeyValueStore, StoreError};
use tempfile::TempDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn open(path: &Path, date: NaiveDate) -> Controller<FileStore, HeuristicParser> {
    let store = FileStore::open(path).unwrap();
    Controller::new(TrackerClient::new(store), HeuristicParser::new(), date)
}

fn onboard(app: &mut Controller<FileStore, HeuristicParser>) {
    app.dispatch(Action::OnboardingInput(OnboardingDraft {
        goal: Goal::Cut,
        sex: Sex::Female,
        age: 30.0,
        height_cm: 168.0,
        weight_kg: 64.0,
        ..OnboardingDraft::default()
    }))
    .unwrap();
    app.dispatch(Action::OnboardingFinish).unwrap();
}

#[test]
fn onboarding_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracker.json");

    let plan = {
        let mut app = open(&path, today());
        assert_eq!(app.screen().unwrap(), Screen::Onboarding { step: 1 });
        onboard(&mut app);
        app.client().profile().unwrap().unwrap()
    };

    let app = open(&path, today());
    assert_eq!(app.screen().unwrap(), Screen::Tab(Tab::Today));
    assert_eq!(app.client().profile().unwrap(), Some(plan.clone()));
    assert!(plan.kcal_target > 0);
    assert!(app.client().day(today()).unwrap().is_some());
}

#[test]
fn logged_food_persists_across_sessions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracker.json");

    {
        let mut app = open(&path, today());
        onboard(&mut app);

        app.dispatch(Action::OpenMeal(MealType::Lunch)).unwrap();
        app.dispatch(Action::OpenModal(Modal::Search)).unwrap();
        app.dispatch(Action::PickCatalog {
            name: "Rice cooked".to_string(),
            grams: 200.0,
        })
        .unwrap();
        app.dispatch(Action::SaveManual(ManualForm {
            name: "  ".to_string(),
            grams: 100.0,
            kcal: 120.0,
            protein: 10.0,
            carbs: 5.0,
            fat: 6.0,
        }))
        .unwrap();

        app.dispatch(Action::OpenModal(Modal::TextEntry)).unwrap();
        app.dispatch(Action::ParseText("120g salmon".to_string())).unwrap();
        app.dispatch(Action::SaveReviewed(vec![ItemEdit {
            grams: Some(130.0),
            ..ItemEdit::default()
        }]))
        .unwrap();
    }

    let mut app = open(&path, today());
    let day = app.client().day(today()).unwrap().unwrap();
    let lunch = day.meal(MealType::Lunch);
    let names: Vec<&str> = lunch.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Rice cooked", "Food", "Salmon"]);
    assert_eq!(lunch.items[0].kcal, 260.0);
    assert_eq!(lunch.items[2].grams, 130.0);

    let view = app.today_view().unwrap().unwrap();
    assert_eq!(view.kcal.value, day.totals().kcal);
    assert!(view.kcal.ratio > 0.0 && view.kcal.ratio <= 1.0);

    let id = lunch.items[1].id;
    app.dispatch(Action::OpenMeal(MealType::Lunch)).unwrap();
    app.dispatch(Action::DeleteItem(id)).unwrap();
    drop(app);

    let app = open(&path, today());
    let lunch_after = app.client().day(today()).unwrap().unwrap();
    assert_eq!(lunch_after.meal(MealType::Lunch).items.len(), 2);
}

#[test]
fn progress_over_several_days() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracker.json");

    let first = today() - Duration::days(2);
    let mut app = open(&path, first);
    onboard(&mut app);

    for (offset, kcal) in [(0, 1800.0), (2, 2200.0)] {
        app.set_today(first + Duration::days(offset));
        app.dispatch(Action::OpenMeal(MealType::Dinner)).unwrap();
        app.dispatch(Action::SaveManual(ManualForm {
            name: "dinner".to_string(),
            grams: 500.0,
            kcal,
            protein: 100.0,
            carbs: 200.0,
            fat: 60.0,
        }))
        .unwrap();
        app.dispatch(Action::SaveWeight(64.0 - offset as f64 * 0.2))
            .unwrap();
    }

    let history = app.client().history(today(), 30).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date_key, first);
    assert_eq!(history[1].date_key, today());
    assert_eq!(history[1].totals.kcal, 2200.0);

    let avg = HistoryAverages::from(history.as_slice());
    assert_eq!(avg.kcal, 2000.0);
    assert_eq!(avg.protein, 100.0);
}

#[test]
fn goal_edit_and_theme_then_reset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracker.json");

    let mut app = open(&path, today());
    onboard(&mut app);
    app.dispatch(Action::SaveGoals(GoalEdit {
        goal: Some(Goal::Maintain),
        kcal_target: Some(2100),
        ..GoalEdit::default()
    }))
    .unwrap();
    app.dispatch(Action::SaveTheme(Theme::new(ThemeMode::Light, "#22C55E")))
        .unwrap();
    drop(app);

    let mut app = open(&path, today());
    let profile = app.client().profile().unwrap().unwrap();
    assert_eq!(profile.goal, Goal::Maintain);
    assert_eq!(profile.kcal_target, 2100);
    assert_eq!(app.client().theme().unwrap().mode, ThemeMode::Light);

    app.dispatch(Action::ResetAll).unwrap();
    drop(app);

    let app = open(&path, today());
    assert_eq!(app.client().profile().unwrap(), None);
    assert_eq!(app.client().theme().unwrap(), Theme::default());
    assert_eq!(app.client().store().keys().count(), 0);
    assert_eq!(app.screen().unwrap(), Screen::Onboarding { step: 1 });
}

#[test]
fn corrupt_day_record_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracker.json");

    let mut store = FileStore::open(&path).unwrap();
    store
        .set(&store::day_key(today()), serde_json::json!({ "dateKey": 7 }))
        .unwrap();

    let client = TrackerClient::new(FileStore::open(&path).unwrap());
    let err = client.day(today()).unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_) | StoreError::Corrupt { .. }));
}

#[test]
fn non_object_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tracker.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let err = FileStore::open(&path).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
}
