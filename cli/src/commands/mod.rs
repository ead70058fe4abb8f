mod export;
mod food;
mod goals;
mod helpers;
mod meal;
mod summary;
mod view;

use anyhow::Result;

use dietlog_core::DietService;
use dietlog_core::catalog::exact_matches;
use dietlog_core::models::FoodRecord;

use helpers::{food_table, or_not_found, prompt_choice};
pub(crate) use helpers::json_error;

pub(crate) use export::{cmd_export, cmd_session_reset};
pub(crate) use food::{cmd_food_add, cmd_food_import, cmd_food_list, cmd_food_search};
pub(crate) use goals::{cmd_goals_clear, cmd_goals_set, cmd_goals_show};
pub(crate) use meal::{cmd_meal_add, cmd_meal_clear, cmd_meal_count, cmd_meal_remove, cmd_meal_rename};
pub(crate) use summary::cmd_summary;
pub(crate) use view::{cmd_view_delete, cmd_view_list, cmd_view_save, cmd_view_show};

/// Pick a catalog food by id or name, asking the user when several match.
pub(super) fn pick_food(svc: &DietService, reference: &str, json: bool) -> Result<FoodRecord> {
    if let Ok(id) = reference.trim().parse::<i64>() {
        return or_not_found(svc.get_food(id), json);
    }

    let mut hits = svc.search(reference)?;
    if hits.is_empty() {
        return or_not_found(svc.resolve_food(reference), json);
    }
    if hits.len() == 1 {
        return Ok(hits.remove(0));
    }
    if let [food] = exact_matches(&hits, reference).as_slice() {
        return Ok((*food).clone());
    }

    let refs: Vec<&FoodRecord> = hits.iter().collect();
    let table = food_table(&refs);
    // stdout carries only the JSON result under --json
    if json {
        eprintln!("{table}");
    } else {
        println!("{table}");
    }
    let idx = prompt_choice(hits.len())?;
    Ok(hits.swap_remove(idx))
}
