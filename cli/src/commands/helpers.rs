use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use dietlog_core::models::FoodRecord;

/// Largest quantity accepted for a single entry, in grams.
pub(crate) const MAX_QUANTITY_G: f64 = 1000.0;

const PROGRESS_BAR_WIDTH: usize = 20;

/// Parse a quantity like "150" or "150g" into grams. Zero is allowed.
pub(crate) fn parse_quantity(s: &str) -> Result<f64> {
    let trimmed = s.trim().trim_end_matches('g').trim();
    let value: f64 = trimmed
        .parse()
        .with_context(|| format!("Invalid quantity: '{s}'. Use a number like '150' or '150g'"))?;
    if !value.is_finite() || value < 0.0 {
        bail!("Quantity must not be negative");
    }
    if value > MAX_QUANTITY_G {
        bail!("Quantity must be at most {MAX_QUANTITY_G:.0}g");
    }
    Ok(value)
}

/// Convert a 1-based position typed by the user into a 0-based index.
pub(crate) fn position_to_index(position: usize) -> Result<usize> {
    if position == 0 {
        bail!("Positions start at 1");
    }
    Ok(position - 1)
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

/// Render foods as a numbered table; the `#` column is what `prompt_choice` expects.
pub(crate) fn food_table(foods: &[&FoodRecord]) -> String {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Cal/100g")]
        calories: String,
        #[tabled(rename = "P/100g")]
        protein: String,
        #[tabled(rename = "C/100g")]
        carbs: String,
        #[tabled(rename = "F/100g")]
        fat: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.id,
            name: truncate(&f.name, 35),
            calories: format!("{:.0}", f.calories_per_100g),
            protein: format!("{:.1}", f.protein_per_100g),
            carbs: format!("{:.1}", f.carbs_per_100g),
            fat: format!("{:.1}", f.fat_per_100g),
        })
        .collect();

    Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string()
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Pass the value through, but report a missing item and exit with status 2.
pub(crate) fn or_not_found<T>(result: dietlog_core::Result<T>, json: bool) -> Result<T> {
    match result {
        Err(e) if e.is_not_found() => {
            if json {
                println!("{}", json_error(&e.to_string()));
            } else {
                eprintln!("{e}");
            }
            process::exit(2);
        }
        other => Ok(other?),
    }
}

/// A text bar like `[##########----------]  50%` for a ratio in `[0, 1]`.
pub(crate) fn progress_bar(ratio: f64) -> String {
    let ratio = ratio.clamp(0.0, 1.0);
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = (ratio * PROGRESS_BAR_WIDTH as f64).round() as usize;
    let percent = ratio * 100.0;
    format!(
        "[{}{}] {percent:>3.0}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert!((parse_quantity("150").unwrap() - 150.0).abs() < f64::EPSILON);
        assert!((parse_quantity("150g").unwrap() - 150.0).abs() < f64::EPSILON);
        assert!((parse_quantity("37.5 g").unwrap() - 37.5).abs() < f64::EPSILON);
        assert!((parse_quantity(" 0 ").unwrap() - 0.0).abs() < f64::EPSILON);
        assert!((parse_quantity("1000").unwrap() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_quantity_invalid() {
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("NaN").is_err());
    }

    #[test]
    fn test_parse_quantity_out_of_range() {
        assert!(parse_quantity("-5").is_err());
        assert!(parse_quantity("1000.5").is_err());
    }

    #[test]
    fn test_position_to_index() {
        assert_eq!(position_to_index(1).unwrap(), 0);
        assert_eq!(position_to_index(4).unwrap(), 3);
        assert!(position_to_index(0).is_err());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), "[--------------------]   0%");
        assert_eq!(progress_bar(0.5), "[##########----------]  50%");
        assert_eq!(progress_bar(1.0), "[####################] 100%");
        assert_eq!(progress_bar(3.0), progress_bar(1.0));
    }

    #[test]
    fn test_food_table_numbers_rows_from_one() {
        let cheese = FoodRecord {
            id: 7,
            name: "Cheddar cheese".to_string(),
            calories_per_100g: 403.0,
            protein_per_100g: 24.9,
            carbs_per_100g: 1.3,
            fat_per_100g: 33.1,
            created_at: String::new(),
        };
        let cherry = FoodRecord {
            id: 9,
            name: "Cherry".to_string(),
            ..cheese.clone()
        };
        let table = food_table(&[&cheese, &cherry]);
        let lines: Vec<&str> = table.lines().filter(|l| l.contains("Che")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("│ 1 ") && lines[0].contains("Cheddar cheese"));
        assert!(lines[1].contains("│ 2 ") && lines[1].contains("Cherry"));
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("Sheet 'x' not found"), r#"{"error":"Sheet 'x' not found"}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }
}
