use anyhow::Result;

use dietlog_core::DietService;
use dietlog_core::models::SlotKey;
use dietlog_core::session::{Action, Outcome, ShrinkPolicy};

use super::helpers::{or_not_found, parse_quantity, position_to_index};
use super::pick_food;

fn find_slot(svc: &DietService, meal: &str, json: bool) -> Result<SlotKey> {
    or_not_found(svc.session()?.find_slot(meal), json)
}

fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome {
        Outcome::EntryAdded {
            slot_name, entry, ..
        } => {
            let name = &entry.food.name;
            let qty = entry.quantity_g;
            let cal = entry.scaled.calories;
            println!("Added {qty}g {name} to {slot_name} ({cal:.0} kcal)");
        }
        Outcome::EntryRemoved {
            slot_name, entry, ..
        } => {
            let name = &entry.food.name;
            println!("Removed {name} from {slot_name}");
        }
        Outcome::SlotCleared {
            slot_name, removed, ..
        } => println!("Cleared {slot_name} ({removed} entries removed)"),
        Outcome::SlotRenamed {
            old_name, new_name, ..
        } => println!("Renamed {old_name} to {new_name}"),
        Outcome::Resized {
            from,
            to,
            discarded_entries,
        } => {
            println!("Meals: {from} -> {to}");
            if *discarded_entries > 0 {
                println!("Discarded {discarded_entries} entries");
            }
        }
        Outcome::GoalsSet { .. } => println!("Goals updated"),
        Outcome::GoalsCleared { was_set } => {
            if *was_set {
                println!("Goals cleared");
            } else {
                println!("No goals were set");
            }
        }
    }
    Ok(())
}

/// Apply an action and report what happened. Missing slots or entries exit with status 2.
pub(super) fn apply_and_print(svc: &DietService, action: Action, json: bool) -> Result<()> {
    let outcome = or_not_found(svc.apply(action), json)?;
    print_outcome(&outcome, json)
}

pub(crate) fn cmd_meal_add(
    svc: &DietService,
    food: &str,
    quantity: &str,
    meal: &str,
    json: bool,
) -> Result<()> {
    let quantity_g = parse_quantity(quantity)?;
    let slot = find_slot(svc, meal, json)?;
    let food = pick_food(svc, food, json)?;
    apply_and_print(
        svc,
        Action::AddEntry {
            slot,
            food,
            quantity_g,
        },
        json,
    )
}

pub(crate) fn cmd_meal_remove(svc: &DietService, meal: &str, position: usize, json: bool) -> Result<()> {
    let index = position_to_index(position)?;
    let slot = find_slot(svc, meal, json)?;
    apply_and_print(svc, Action::RemoveEntry { slot, index }, json)
}

pub(crate) fn cmd_meal_clear(svc: &DietService, meal: &str, json: bool) -> Result<()> {
    let slot = find_slot(svc, meal, json)?;
    apply_and_print(svc, Action::ClearSlot { slot }, json)
}

pub(crate) fn cmd_meal_rename(svc: &DietService, meal: &str, name: &str, json: bool) -> Result<()> {
    let slot = find_slot(svc, meal, json)?;
    apply_and_print(
        svc,
        Action::RenameSlot {
            slot,
            name: name.to_string(),
        },
        json,
    )
}

pub(crate) fn cmd_meal_count(svc: &DietService, count: u32, force: bool, json: bool) -> Result<()> {
    let policy = if force {
        ShrinkPolicy::DiscardEntries
    } else {
        ShrinkPolicy::Refuse
    };
    apply_and_print(svc, Action::Resize { count, policy }, json)
}
