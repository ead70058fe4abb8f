use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::catalog;
use crate::catalog_csv::{self, CatalogImportSummary};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::export;
use crate::models::{FoodRecord, NewFood, validate_view_name};
use crate::session::{Action, Outcome, Session};
use crate::totals::{DailySummary, summarize};
use crate::views::{SavedView, build_view_rows};

/// Everything a front end needs, on top of one workbook file.
///
/// The session is reloaded and stored around each action, so separate
/// invocations share the meal builder state.
pub struct DietService {
    db: Database,
}

impl DietService {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self { db })
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Catalog ---

    pub fn list_foods(&self) -> Result<Vec<FoodRecord>> {
        self.db.list_foods()
    }

    pub fn food_count(&self) -> Result<i64> {
        self.db.count_foods()
    }

    pub fn search(&self, query: &str) -> Result<Vec<FoodRecord>> {
        let foods = self.db.list_foods()?;
        let hits = catalog::search(&foods, query).into_iter().cloned().collect();
        Ok(hits)
    }

    pub fn get_food(&self, id: i64) -> Result<FoodRecord> {
        self.db.get_food_by_id(id)
    }

    /// Resolve a food by id, exact name, or a name fragment that matches only one record.
    pub fn resolve_food(&self, reference: &str) -> Result<FoodRecord> {
        let reference = reference.trim();
        if let Ok(id) = reference.parse::<i64>() {
            return self.db.get_food_by_id(id);
        }

        let foods = self.db.list_foods()?;
        let exact = catalog::exact_matches(&foods, reference);
        if let [food] = exact.as_slice() {
            return Ok((*food).clone());
        }
        let hits = if exact.is_empty() {
            catalog::search(&foods, reference)
        } else {
            exact
        };
        match hits.as_slice() {
            [] => Err(Error::not_found(format!("No food matching '{reference}'"))),
            [food] => Ok((*food).clone()),
            many => Err(Error::validation(format!(
                "'{reference}' matches {} foods; use the food id instead",
                many.len()
            ))),
        }
    }

    pub fn add_record(&self, food: &NewFood) -> Result<FoodRecord> {
        self.db.insert_food(food)
    }

    pub fn import_catalog_csv<R: Read>(&self, reader: R, dry_run: bool) -> Result<CatalogImportSummary> {
        let rows = catalog_csv::parse_catalog_csv(reader)?;
        catalog_csv::import_catalog(&self.db, &rows, dry_run)
    }

    // --- Session ---

    pub fn session(&self) -> Result<Session> {
        Ok(self.db.load_session()?.unwrap_or_default())
    }

    /// Apply an action to the stored session. Nothing is written when the action fails.
    pub fn apply(&self, action: Action) -> Result<Outcome> {
        let current = self.session()?;
        let (next, outcome) = current.apply(action)?;
        self.db.save_session(&next)?;
        debug!(?outcome, "applied action");
        Ok(outcome)
    }

    pub fn summary(&self) -> Result<DailySummary> {
        Ok(summarize(&self.session()?))
    }

    /// Start over with an empty default session. Returns whether one was stored.
    pub fn reset_session(&self) -> Result<bool> {
        self.db.clear_session()
    }

    // --- Saved views ---

    /// Snapshot the current meals and goals under `name`, replacing a view with the same name.
    pub fn save_view(&self, name: &str) -> Result<SavedView> {
        let name = validate_view_name(name)?;
        let rows = build_view_rows(&self.session()?);
        self.db.save_sheet(&name, &rows)
    }

    pub fn list_saved_views(&self) -> Result<Vec<String>> {
        self.db.list_sheets()
    }

    pub fn load_view(&self, name: &str) -> Result<SavedView> {
        self.db.load_sheet(name.trim())
    }

    pub fn delete_view(&self, name: &str) -> Result<()> {
        if self.db.delete_sheet(name.trim())? {
            Ok(())
        } else {
            Err(Error::not_found(format!("Sheet '{}' not found", name.trim())))
        }
    }

    /// Write the catalog and every saved view to an `.xlsx` file.
    pub fn export_workbook(&self, path: &Path) -> Result<()> {
        let foods = self.db.list_foods()?;
        let views = self
            .db
            .list_sheets()?
            .iter()
            .map(|name| self.db.load_sheet(name))
            .collect::<Result<Vec<_>>>()?;
        export::export_workbook(path, &foods, &views)
    }
}
