use anyhow::Result;

use dietlog_core::DietService;
use dietlog_core::models::{DailyGoals, Nutrient};
use dietlog_core::session::Action;
use dietlog_core::views::GOAL_NOT_SET;

use super::meal::apply_and_print;

pub(crate) fn cmd_goals_set(
    svc: &DietService,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    json: bool,
) -> Result<()> {
    let goals = DailyGoals {
        calories,
        protein,
        carbs,
        fat,
    };
    apply_and_print(svc, Action::SetGoals(goals), json)?;
    if !json {
        print_goals(&goals);
    }
    Ok(())
}

pub(crate) fn cmd_goals_show(svc: &DietService, json: bool) -> Result<()> {
    let session = svc.session()?;
    let goals = session.goals().copied().unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        print_goals(&goals);
    }
    Ok(())
}

pub(crate) fn cmd_goals_clear(svc: &DietService, json: bool) -> Result<()> {
    apply_and_print(svc, Action::ClearGoals, json)
}

fn print_goals(goals: &DailyGoals) {
    for nutrient in Nutrient::ALL {
        let label = nutrient.label();
        match goals.get(nutrient) {
            Some(v) => println!("  {label:<9} {v:.0} {}", nutrient.unit()),
            None => println!("  {label:<9} {GOAL_NOT_SET}"),
        }
    }
}
