use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use macro_tracker::app::{Action, Controller, ManualForm, Modal, Progress, Screen};
use macro_tracker::calculator::{coerce_number, optional_number, OnboardingDraft};
use macro_tracker::catalog;
use macro_tracker::client::{GoalEdit, TrackerClient, MAX_HISTORY_DAYS};
use macro_tracker::config::Config;
use macro_tracker::models::{
    ActivityLevel, DaySummary, Goal, HistoryAverages, MealType, Sex, Theme, ThemeMode,
};
use macro_tracker::parser::{HeuristicParser, ItemEdit};
use macro_tracker::store::FileStore;

#[derive(Parser, Debug)]
#[command(author, version, about = "Calorie and macro tracker", long_about = None)]
struct Cli {
    /// Data file (overrides TRACKER_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Day to work on, YYYY-MM-DD (defaults to today)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute targets from biometrics and create the profile
    Onboard(OnboardArgs),
    /// Show the day's totals against targets
    Today,
    /// Log a food manually
    Add(AddArgs),
    /// Search the food catalog
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    /// Log a catalog food by weight
    Pick {
        #[arg(short, long)]
        meal: MealType,
        #[arg(short, long)]
        food: String,
        #[arg(short, long, default_value = "150")]
        grams: String,
    },
    /// Guess a food from free text; nothing is stored without --save
    Parse(ParseArgs),
    /// Delete a logged entry
    Remove {
        #[arg(short, long)]
        meal: MealType,
        #[arg(long)]
        id: Uuid,
    },
    /// Record (or clear with 0) the day's weight in kg
    Weight { kg: String },
    /// Override the goal and targets by hand
    Goals(GoalArgs),
    /// Averages and history for recent days
    Progress {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Set display preferences
    Theme {
        #[arg(long)]
        mode: ThemeMode,
        /// `#RRGGBB` or a preset: violet, blue, green, orange, red
        #[arg(long, default_value = "")]
        accent: String,
    },
    /// Delete profile, preferences and all logs
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct OnboardArgs {
    #[arg(long, value_parser = parse_goal, default_value = "cut")]
    goal: Goal,
    #[arg(long, value_parser = parse_sex, default_value = "male")]
    sex: Sex,
    #[arg(long, default_value = "25")]
    age: String,
    #[arg(long, default_value = "180")]
    height_cm: String,
    #[arg(long, default_value = "80")]
    weight_kg: String,
    #[arg(long, default_value = "moderate")]
    activity: ActivityLevel,
    #[arg(long, default_value = "4")]
    training_days: String,
    #[arg(long, default_value = "15")]
    deficit_pct: String,
    #[arg(long, default_value = "10")]
    surplus_pct: String,
    #[arg(long, default_value = "1.8")]
    protein_per_kg: String,
    #[arg(long, default_value = "0.9")]
    fat_per_kg: String,
    /// Replace an existing profile
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(short, long)]
    meal: MealType,
    #[arg(short, long, default_value = "")]
    name: String,
    #[arg(long, default_value = "0")]
    grams: String,
    #[arg(long, default_value = "0")]
    kcal: String,
    #[arg(long, default_value = "0")]
    protein: String,
    #[arg(long, default_value = "0")]
    carbs: String,
    #[arg(long, default_value = "0")]
    fat: String,
}

#[derive(Args, Debug)]
struct ParseArgs {
    text: String,
    #[arg(short, long, default_value = "breakfast")]
    meal: MealType,
    /// Store the reviewed draft
    #[arg(long)]
    save: bool,
    #[arg(long)]
    grams: Option<String>,
    #[arg(long)]
    kcal: Option<String>,
    #[arg(long)]
    protein: Option<String>,
    #[arg(long)]
    carbs: Option<String>,
    #[arg(long)]
    fat: Option<String>,
}

#[derive(Args, Debug)]
struct GoalArgs {
    #[arg(long, value_parser = parse_goal)]
    goal: Option<Goal>,
    #[arg(long)]
    weight_kg: Option<String>,
    #[arg(long)]
    kcal: Option<i64>,
    #[arg(long)]
    protein: Option<i64>,
    #[arg(long)]
    carbs: Option<i64>,
    #[arg(long)]
    fat: Option<i64>,
}

fn parse_goal(s: &str) -> Result<Goal, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "cut" => Ok(Goal::Cut),
        "maintain" => Ok(Goal::Maintain),
        "bulk" => Ok(Goal::Bulk),
        other => Err(format!("unknown goal '{}' (cut, maintain, bulk)", other)),
    }
}

fn parse_sex(s: &str) -> Result<Sex, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "male" | "m" => Ok(Sex::Male),
        "female" | "f" => Ok(Sex::Female),
        other => Err(format!("unknown sex '{}' (male, female)", other)),
    }
}

fn item_edit(args: &ParseArgs) -> ItemEdit {
    ItemEdit {
        grams: args.grams.as_deref().map(coerce_number),
        kcal: args.kcal.as_deref().map(coerce_number),
        protein: args.protein.as_deref().map(coerce_number),
        carbs: args.carbs.as_deref().map(coerce_number),
        fat: args.fat.as_deref().map(coerce_number),
    }
}

fn goal_edit(args: &GoalArgs) -> GoalEdit {
    GoalEdit {
        goal: args.goal,
        weight_kg: args.weight_kg.as_deref().map(coerce_number),
        kcal_target: args.kcal,
        protein_target: args.protein,
        carbs_target: args.carbs,
        fat_target: args.fat,
    }
}

type App = Controller<FileStore, HeuristicParser>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(path) = cli.data.clone() {
        config.data_path = path;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let store = FileStore::open(&config.data_path)
        .with_context(|| format!("Failed to open data file '{}'", config.data_path.display()))?;
    let today = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let mut app = Controller::new(TrackerClient::new(store), HeuristicParser::new(), today);

    run(&mut app, cli.command)
}

fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Onboard(args) => onboard(app, args),
        Command::Today => print_today(app),
        Command::Add(args) => {
            require_profile(app)?;
            app.dispatch(Action::OpenMeal(args.meal))?;
            app.dispatch(Action::SaveManual(ManualForm {
                name: args.name,
                grams: coerce_number(&args.grams),
                kcal: coerce_number(&args.kcal),
                protein: coerce_number(&args.protein),
                carbs: coerce_number(&args.carbs),
                fat: coerce_number(&args.fat),
            }))?;
            print_meal(app)
        }
        Command::Search { query } => {
            for food in catalog::search(&query) {
                println!(
                    "{:<18} per 100g: {} kcal • P {} C {} F {}",
                    food.name,
                    food.kcal_per_100g,
                    food.protein_per_100g,
                    food.carbs_per_100g,
                    food.fat_per_100g
                );
            }
            Ok(())
        }
        Command::Pick { meal, food, grams } => {
            require_profile(app)?;
            if catalog::find(&food).is_none() {
                bail!("'{}' is not in the catalog; try `search`", food);
            }
            app.dispatch(Action::OpenMeal(meal))?;
            app.dispatch(Action::OpenModal(Modal::Search))?;
            app.dispatch(Action::PickCatalog {
                name: food,
                grams: coerce_number(&grams),
            })?;
            print_meal(app)
        }
        Command::Parse(args) => parse_text(app, args),
        Command::Remove { meal, id } => {
            require_profile(app)?;
            app.dispatch(Action::OpenMeal(meal))?;
            app.dispatch(Action::DeleteItem(id))?;
            print_meal(app)
        }
        Command::Weight { kg } => {
            let kg = coerce_number(&kg);
            app.dispatch(Action::SaveWeight(kg))?;
            let day = app.client().day(app.today())?;
            match day.and_then(|d| d.weight_kg) {
                Some(w) => println!("{}: {} kg", app.today(), w),
                None => println!("{}: weight cleared", app.today()),
            }
            Ok(())
        }
        Command::Goals(args) => {
            require_profile(app)?;
            app.dispatch(Action::OpenModal(Modal::Goal))?;
            app.dispatch(Action::SaveGoals(goal_edit(&args)))?;
            let profile = app
                .client()
                .profile()?
                .ok_or_else(|| anyhow!("profile disappeared while saving goals"))?;
            println!(
                "{} • {} kcal • P {} g • C {} g • F {} g",
                profile.goal.label(),
                profile.kcal_target,
                profile.protein_target,
                profile.carbs_target,
                profile.fat_target
            );
            Ok(())
        }
        Command::Progress { days } => print_progress(app, days),
        Command::Theme { mode, accent } => {
            let theme = Theme::new(mode, &accent);
            app.dispatch(Action::SaveTheme(theme.clone()))?;
            println!("theme: {:?} {}", theme.mode, theme.accent);
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to delete all data without --yes");
            }
            app.dispatch(Action::ResetAll)?;
            println!("All local data deleted.");
            Ok(())
        }
    }
}

fn require_profile(app: &App) -> Result<()> {
    if let Screen::Onboarding { .. } = app.screen()? {
        bail!("no profile yet; run `onboard` first");
    }
    Ok(())
}

fn onboard(app: &mut App, args: OnboardArgs) -> Result<()> {
    if app.client().profile()?.is_some() && !args.force {
        bail!("a profile already exists; use `goals` to edit it or pass --force");
    }

    app.dispatch(Action::OnboardingInput(OnboardingDraft {
        step: 1,
        goal: args.goal,
        sex: args.sex,
        age: coerce_number(&args.age),
        height_cm: coerce_number(&args.height_cm),
        weight_kg: coerce_number(&args.weight_kg),
        activity_level: args.activity,
        training_days: coerce_number(&args.training_days),
        deficit_pct: optional_number(&args.deficit_pct),
        surplus_pct: optional_number(&args.surplus_pct),
        protein_per_kg: optional_number(&args.protein_per_kg),
        fat_per_kg: optional_number(&args.fat_per_kg),
    }))?;

    let plan = app.onboarding_plan();
    println!("BMR:  {} kcal", plan.bmr.round());
    println!("TDEE: {} kcal", plan.tdee.round());
    println!(
        "Target: {} kcal ({})",
        plan.profile.kcal_target,
        plan.profile.goal.label()
    );
    println!(
        "Protein {} g • Carbs {} g • Fat {} g",
        plan.profile.protein_target, plan.profile.carbs_target, plan.profile.fat_target
    );

    app.dispatch(Action::OnboardingFinish)?;
    Ok(())
}

fn bar(label: &str, p: &Progress, unit: &str) -> String {
    const WIDTH: usize = 20;
    let filled = (p.ratio * WIDTH as f64).round() as usize;
    format!(
        "{:<8} [{}{}] {} / {} {}",
        label,
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        p.value.round(),
        p.target.round(),
        unit
    )
}

fn print_today(app: &mut App) -> Result<()> {
    let view = app
        .today_view()?
        .ok_or_else(|| anyhow!("no profile yet; run `onboard` first"))?;

    println!("{}", view.date_key);
    println!("{}", bar("kcal", &view.kcal, "kcal"));
    println!("{}  {}% reached", " ".repeat(8), (view.kcal.ratio * 100.0).round());
    println!("{}", bar("Protein", &view.protein, "g"));
    println!("{}", bar("Carbs", &view.carbs, "g"));
    println!("{}", bar("Fat", &view.fat, "g"));
    println!();
    for line in &view.meals {
        println!(
            "{:<12} {:<12} {} items • {} kcal",
            line.label,
            line.meal_type.as_str(),
            line.item_count,
            line.kcal.round()
        );
    }
    Ok(())
}

fn print_meal(app: &mut App) -> Result<()> {
    let Some(meal) = app.open_meal()? else {
        return Ok(());
    };
    println!("{} - {} kcal", meal.meal_type.label(), meal.kcal().round());
    for item in &meal.items {
        println!(
            "  {}  {} ({} g) • {} kcal • P {} C {} F {}",
            item.id, item.name, item.grams, item.kcal, item.protein, item.carbs, item.fat
        );
    }
    Ok(())
}

fn parse_text(app: &mut App, args: ParseArgs) -> Result<()> {
    require_profile(app)?;
    app.dispatch(Action::OpenMeal(args.meal))?;
    app.dispatch(Action::OpenModal(Modal::TextEntry))?;
    app.dispatch(Action::ParseText(args.text.clone()))?;

    let Some(Modal::Review { draft }) = app.state().modal.clone() else {
        bail!("parser produced no draft");
    };
    println!("Confidence: {:?}", draft.confidence);
    for q in &draft.questions {
        println!("? {}", q);
    }
    for item in &draft.items {
        println!(
            "  {} ({} g) • {} kcal • P {} C {} F {}",
            item.name, item.grams, item.kcal, item.protein, item.carbs, item.fat
        );
    }

    if !args.save {
        println!("Review the values above; re-run with --save (and any overrides) to store them.");
        app.dispatch(Action::CloseModal)?;
        return Ok(());
    }

    app.dispatch(Action::SaveReviewed(vec![item_edit(&args)]))?;
    print_meal(app)
}

const RECENT_DAYS_SHOWN: usize = 10;

/// Newest days first, at most [`RECENT_DAYS_SHOWN`].
fn recent_first(history: &[DaySummary]) -> Vec<&DaySummary> {
    history.iter().rev().take(RECENT_DAYS_SHOWN).collect()
}

fn print_progress(app: &App, days: u32) -> Result<()> {
    let days = days.min(MAX_HISTORY_DAYS);
    let history = app.client().history(app.today(), days)?;
    let avg = HistoryAverages::from(history.as_slice());

    println!("Last {} days (local)", days);
    println!("Avg kcal: {}  Avg protein: {} g", avg.kcal.round(), avg.protein.round());
    for day in recent_first(&history) {
        let weight = day
            .weight_kg
            .map(|w| format!("{} kg", w))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {} kcal  P {} g  {}",
            day.date_key,
            day.totals.kcal.round(),
            day.totals.protein.round(),
            weight
        );
    }
    Ok(())
}
