use std::collections::HashSet;
use std::io::Read;

use serde::Serialize;
use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{NewFood, validate_food};

/// Accepted spellings for each catalog column, compared case-insensitively.
const NAME_HEADERS: [&str; 3] = ["Name", "Nome", "Food Name"];
const CALORIES_HEADERS: [&str; 3] = ["Calories", "Calorie (kcal)", "Calories (kcal)"];
const PROTEIN_HEADERS: [&str; 3] = ["Protein", "Proteine (g)", "Protein (g)"];
const CARBS_HEADERS: [&str; 4] = ["Carbs", "Carbo (g)", "Carbs (g)", "Carbohydrates (g)"];
const FAT_HEADERS: [&str; 3] = ["Fat", "Grassi (g)", "Fat (g)"];

/// What a catalog import would do / did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogImportSummary {
    pub rows_parsed: usize,
    pub foods_created: usize,
    pub foods_skipped: usize,
}

/// Parse catalog rows (values per 100 g) from any CSV reader.
///
/// Expected header: `Name,Calories,Protein,Carbs,Fat`. Blank rows are skipped,
/// blank numeric cells read as zero.
pub fn parse_catalog_csv<R: Read>(reader: R) -> Result<Vec<NewFood>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let col = |aliases: &[&str]| -> Result<usize> {
        headers
            .iter()
            .position(|h| aliases.iter().any(|a| h.eq_ignore_ascii_case(a)))
            .ok_or_else(|| Error::validation(format!("Missing required column: {}", aliases[0])))
    };

    let idx_name = col(&NAME_HEADERS)?;
    let idx_cal = col(&CALORIES_HEADERS)?;
    let idx_protein = col(&PROTEIN_HEADERS)?;
    let idx_carbs = col(&CARBS_HEADERS)?;
    let idx_fat = col(&FAT_HEADERS)?;

    let mut foods = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let record = result?;
        let line = line_num + 2;

        let name = record.get(idx_name).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }

        let number = |idx: usize, column: &str| -> Result<f64> {
            let raw = record.get(idx).unwrap_or("").trim();
            if raw.is_empty() {
                return Ok(0.0);
            }
            raw.replace(',', ".").parse::<f64>().map_err(|_| {
                Error::validation(format!("Row {line}: {column} '{raw}' is not a number"))
            })
        };

        let food = NewFood {
            calories_per_100g: number(idx_cal, "Calories")?,
            protein_per_100g: number(idx_protein, "Protein")?,
            carbs_per_100g: number(idx_carbs, "Carbs")?,
            fat_per_100g: number(idx_fat, "Fat")?,
            name,
        };
        validate_food(&food).map_err(|e| Error::validation(format!("Row {line}: {e}")))?;
        foods.push(food);
    }

    Ok(foods)
}

/// Add parsed rows to the catalog, skipping names the catalog (or an earlier row) already has.
///
/// When `dry_run` is true, nothing is written.
pub fn import_catalog(db: &Database, rows: &[NewFood], dry_run: bool) -> Result<CatalogImportSummary> {
    let mut known: HashSet<String> = db
        .list_foods()?
        .into_iter()
        .map(|f| f.name.trim().to_lowercase())
        .collect();

    let mut to_insert = Vec::new();
    let mut foods_skipped = 0;
    for row in rows {
        if known.insert(row.name.trim().to_lowercase()) {
            to_insert.push(row.clone());
        } else {
            foods_skipped += 1;
        }
    }

    if !dry_run {
        db.insert_foods(&to_insert)?;
        info!(created = to_insert.len(), skipped = foods_skipped, "imported catalog");
    }

    Ok(CatalogImportSummary {
        rows_parsed: rows.len(),
        foods_created: to_insert.len(),
        foods_skipped,
    })
}
