mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::debug;

use crate::commands::{
    cmd_export, cmd_food_add, cmd_food_import, cmd_food_list, cmd_food_search, cmd_goals_clear,
    cmd_goals_set, cmd_goals_show, cmd_meal_add, cmd_meal_clear, cmd_meal_count, cmd_meal_remove,
    cmd_meal_rename, cmd_session_reset, cmd_summary, cmd_view_delete, cmd_view_list, cmd_view_save,
    cmd_view_show, json_error,
};
use crate::config::Config;
use dietlog_core::DietService;

#[derive(Parser)]
#[command(
    name = "dietlog",
    version,
    about = "Build a day of meals from your food catalog and track it against daily goals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the food catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Build the current day's meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Show meals, daily totals and progress towards goals
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage daily nutrition goals
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Save and review snapshots of the current day
    View {
        #[command(subcommand)]
        command: ViewCommands,
    },
    /// Write the catalog and all saved views to an .xlsx workbook
    Export {
        /// Destination file (e.g. diet.xlsx)
        path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the current session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Search the catalog by name (case-insensitive)
    Search {
        /// Part of the food name
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every food in the catalog
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a food with values per 100g
    Add {
        /// Food name
        name: String,
        /// Calories per 100g
        #[arg(long)]
        calories: f64,
        /// Protein per 100g
        #[arg(long)]
        protein: f64,
        /// Carbs per 100g
        #[arg(long)]
        carbs: f64,
        /// Fat per 100g
        #[arg(long)]
        fat: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import foods from a CSV file (Name,Calories,Protein,Carbs,Fat)
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Show what would be imported without writing
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Add a food to a meal
    Add {
        /// Food id or name to search for
        food: String,
        /// Quantity in grams (e.g. "150" or "150g", at most 1000)
        quantity: String,
        /// Meal number or name
        #[arg(short, long, default_value = "1")]
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an entry from a meal by its position (as shown in `summary`)
    Remove {
        /// Meal number or name
        meal: String,
        /// Entry position, starting at 1
        position: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every entry from a meal
    Clear {
        /// Meal number or name
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a meal
    Rename {
        /// Meal number or current name
        meal: String,
        /// New name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the number of meals (3-10)
    Count {
        /// New number of meals
        count: u32,
        /// Drop meals that still have entries
        #[arg(long)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalsCommands {
    /// Set daily goals; omitted values become unset
    Set {
        /// Calories (kcal)
        #[arg(long)]
        calories: Option<f64>,
        /// Protein (g)
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs (g)
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat (g)
        #[arg(long)]
        fat: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove all goals
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ViewCommands {
    /// Save the current meals and goals under a name, replacing any view with that name
    Save {
        /// View name (at most 31 characters)
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved views
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a saved view
    Show {
        /// View name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved view
    Delete {
        /// View name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Empty all meals, go back to 3 meals and clear goals
    Reset {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Whether the invoked subcommand asked for JSON output.
    fn json(&self) -> bool {
        match self {
            Commands::Food { command } => match command {
                FoodCommands::Search { json, .. }
                | FoodCommands::List { json }
                | FoodCommands::Add { json, .. }
                | FoodCommands::Import { json, .. } => *json,
            },
            Commands::Meal { command } => match command {
                MealCommands::Add { json, .. }
                | MealCommands::Remove { json, .. }
                | MealCommands::Clear { json, .. }
                | MealCommands::Rename { json, .. }
                | MealCommands::Count { json, .. } => *json,
            },
            Commands::Goals { command } => match command {
                GoalsCommands::Set { json, .. }
                | GoalsCommands::Show { json }
                | GoalsCommands::Clear { json } => *json,
            },
            Commands::View { command } => match command {
                ViewCommands::Save { json, .. }
                | ViewCommands::List { json }
                | ViewCommands::Show { json, .. }
                | ViewCommands::Delete { json, .. } => *json,
            },
            Commands::Session { command } => match command {
                SessionCommands::Reset { json } => *json,
            },
            Commands::Summary { json } | Commands::Export { json, .. } => *json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init();

    let json = cli.command.json();
    if let Err(e) = run(cli) {
        if json {
            println!("{}", json_error(&format!("{e:#}")));
        } else {
            eprintln!("Error: {e:#}");
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    debug!(db = %config.db_path.display(), "using database");
    let svc = DietService::open(&config.db_path)?;

    match cli.command {
        Commands::Food { command } => match command {
            FoodCommands::Search { query, json } => cmd_food_search(&svc, &query, json),
            FoodCommands::List { json } => cmd_food_list(&svc, json),
            FoodCommands::Add {
                name,
                calories,
                protein,
                carbs,
                fat,
                json,
            } => cmd_food_add(&svc, &name, calories, protein, carbs, fat, json),
            FoodCommands::Import {
                file,
                dry_run,
                json,
            } => cmd_food_import(&svc, &file, dry_run, json),
        },
        Commands::Meal { command } => match command {
            MealCommands::Add {
                food,
                quantity,
                meal,
                json,
            } => cmd_meal_add(&svc, &food, &quantity, &meal, json),
            MealCommands::Remove {
                meal,
                position,
                json,
            } => cmd_meal_remove(&svc, &meal, position, json),
            MealCommands::Clear { meal, json } => cmd_meal_clear(&svc, &meal, json),
            MealCommands::Rename { meal, name, json } => cmd_meal_rename(&svc, &meal, &name, json),
            MealCommands::Count { count, force, json } => cmd_meal_count(&svc, count, force, json),
        },
        Commands::Summary { json } => cmd_summary(&svc, json),
        Commands::Goals { command } => match command {
            GoalsCommands::Set {
                calories,
                protein,
                carbs,
                fat,
                json,
            } => cmd_goals_set(&svc, calories, protein, carbs, fat, json),
            GoalsCommands::Show { json } => cmd_goals_show(&svc, json),
            GoalsCommands::Clear { json } => cmd_goals_clear(&svc, json),
        },
        Commands::View { command } => match command {
            ViewCommands::Save { name, json } => cmd_view_save(&svc, &name, json),
            ViewCommands::List { json } => cmd_view_list(&svc, json),
            ViewCommands::Show { name, json } => cmd_view_show(&svc, &name, json),
            ViewCommands::Delete { name, json } => cmd_view_delete(&svc, &name, json),
        },
        Commands::Export { path, json } => cmd_export(&svc, &path, json),
        Commands::Session { command } => match command {
            SessionCommands::Reset { json } => cmd_session_reset(&svc, json),
        },
    }
}
