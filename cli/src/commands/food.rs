use anyhow::{Context, Result};
use std::path::Path;
use std::process;

use dietlog_core::DietService;
use dietlog_core::models::{FoodRecord, NewFood};

use super::helpers::food_table;

fn print_foods(foods: &[FoodRecord], empty_message: &str, json: bool) -> Result<()> {
    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("{empty_message}");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(foods)?);
    } else {
        let refs: Vec<&FoodRecord> = foods.iter().collect();
        println!("{}", food_table(&refs));
    }
    Ok(())
}

pub(crate) fn cmd_food_search(svc: &DietService, query: &str, json: bool) -> Result<()> {
    let foods = svc.search(query)?;
    print_foods(&foods, &format!("No results found for '{query}'"), json)
}

pub(crate) fn cmd_food_list(svc: &DietService, json: bool) -> Result<()> {
    let foods = svc.list_foods()?;
    print_foods(&foods, "The catalog is empty", json)
}

pub(crate) fn cmd_food_add(
    svc: &DietService,
    name: &str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    json: bool,
) -> Result<()> {
    let food = svc.add_record(&NewFood {
        name: name.to_string(),
        calories_per_100g: calories,
        protein_per_100g: protein,
        carbs_per_100g: carbs,
        fat_per_100g: fat,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let id = food.id;
        println!("Added food: {name} (id: {id})");
    }

    Ok(())
}

pub(crate) fn cmd_food_import(svc: &DietService, path: &Path, dry_run: bool, json: bool) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let summary = svc.import_catalog_csv(file, dry_run)?;
    let catalog_size = svc.food_count()?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dry_run": dry_run,
                "rows_parsed": summary.rows_parsed,
                "foods_created": summary.foods_created,
                "foods_skipped": summary.foods_skipped,
                "catalog_size": catalog_size,
            })
        );
    } else if dry_run {
        println!("Dry run: no changes made.\n");
        println!("  Rows parsed:     {}", summary.rows_parsed);
        println!("  Foods to create: {}", summary.foods_created);
        println!("  Already known:   {}", summary.foods_skipped);
    } else {
        println!("Import complete.\n");
        println!("  Rows parsed:     {}", summary.rows_parsed);
        println!("  Foods created:   {}", summary.foods_created);
        println!("  Already known:   {}", summary.foods_skipped);
        println!("  Catalog size:    {catalog_size}");
    }

    Ok(())
}
