use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use dietlog_core::DietService;
use dietlog_core::totals::{DailySummary, GoalStatus};
use dietlog_core::views::GOAL_NOT_SET;

use super::helpers::{no_neg_zero, progress_bar, truncate};

pub(crate) fn cmd_summary(svc: &DietService, json: bool) -> Result<()> {
    let summary = svc.summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_meals(&summary);
    print_progress(&summary);
    Ok(())
}

fn print_meals(summary: &DailySummary) {
    for slot in &summary.slots {
        let key = slot.key;
        let name = &slot.name;
        let sub_cal = no_neg_zero(slot.subtotal.calories);
        println!("  [{key}] {name} ({sub_cal:.0} kcal)");
        if slot.entries.is_empty() {
            println!("      (empty)");
        }
        for (i, e) in slot.entries.iter().enumerate() {
            let pos = i + 1;
            let food = truncate(&e.food.name, 35);
            let qty = e.quantity_g;
            let s = &e.scaled;
            println!(
                "    {pos}. {food}: {qty}g, {:.0} kcal | P:{:.1}g C:{:.1}g F:{:.1}g",
                s.calories, s.protein, s.carbs, s.fat
            );
        }
        println!();
    }
}

fn print_progress(summary: &DailySummary) {
    #[derive(Tabled)]
    struct ProgressRow {
        #[tabled(rename = "Nutrient")]
        nutrient: String,
        #[tabled(rename = "Total")]
        total: String,
        #[tabled(rename = "Goal")]
        goal: String,
        #[tabled(rename = "Progress")]
        progress: String,
    }

    let rows: Vec<ProgressRow> = summary
        .progress
        .iter()
        .map(|p| {
            let unit = p.nutrient.unit();
            let total = no_neg_zero(p.total);
            let (goal, progress) = match p.status {
                GoalStatus::Set { goal, ratio } => (format!("{goal:.0} {unit}"), progress_bar(ratio)),
                GoalStatus::NotSet => (GOAL_NOT_SET.to_string(), String::new()),
            };
            ProgressRow {
                nutrient: p.nutrient.label().to_string(),
                total: format!("{total:.1} {unit}"),
                goal,
                progress,
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
