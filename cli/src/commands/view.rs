use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use dietlog_core::DietService;
use dietlog_core::models::Nutrient;
use dietlog_core::views::{GOAL_NOT_SET, SavedView, ViewRow};

use super::helpers::{no_neg_zero, or_not_found, truncate};

pub(crate) fn cmd_view_save(svc: &DietService, name: &str, json: bool) -> Result<()> {
    let view = svc.save_view(name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        let name = &view.name;
        let entries = view.meal_rows().count();
        println!("Saved view '{name}' ({entries} entries)");
    }
    Ok(())
}

pub(crate) fn cmd_view_list(svc: &DietService, json: bool) -> Result<()> {
    let names = svc.list_saved_views()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }
    if names.is_empty() {
        eprintln!("No saved views");
        process::exit(2);
    }
    for name in &names {
        println!("  {name}");
    }
    Ok(())
}

pub(crate) fn cmd_view_show(svc: &DietService, name: &str, json: bool) -> Result<()> {
    let view = or_not_found(svc.load_view(name), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

pub(crate) fn cmd_view_delete(svc: &DietService, name: &str, json: bool) -> Result<()> {
    or_not_found(svc.delete_view(name), json)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": name.trim() }));
    } else {
        println!("Deleted view '{}'", name.trim());
    }
    Ok(())
}

fn print_view(view: &SavedView) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Food")]
        food: String,
        #[tabled(rename = "Qty")]
        quantity: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
    }

    println!("=== {} ({}) ===\n", view.name, view.saved_at);

    let rows: Vec<EntryRow> = view
        .meal_rows()
        .filter_map(|row| match row {
            ViewRow::Meal {
                meal,
                food_name,
                calories,
                protein,
                carbs,
                fat,
                quantity_g,
            } => Some(EntryRow {
                meal: meal.clone(),
                food: truncate(food_name, 35),
                quantity: format!("{quantity_g}g"),
                calories: format!("{calories:.0}"),
                protein: format!("{protein:.1}"),
                carbs: format!("{carbs:.1}"),
                fat: format!("{fat:.1}"),
            }),
            ViewRow::Summary { .. } => None,
        })
        .collect();

    if rows.is_empty() {
        println!("  (no entries)");
    } else {
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }
    println!();

    let totals = view.totals().unwrap_or_default();
    let goals = view.goals();
    for nutrient in Nutrient::ALL {
        let label = nutrient.label();
        let unit = nutrient.unit();
        let total = no_neg_zero(totals.get(nutrient));
        let goal = goals
            .get(nutrient)
            .map_or_else(|| GOAL_NOT_SET.to_string(), |g| format!("{g:.0} {unit}"));
        println!("  {label:<9} {total:>8.1} {unit:<4} goal: {goal}");
    }
}
