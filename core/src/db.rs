use std::path::Path;

use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{FoodRecord, NewFood, Nutrient, validate_food};
use crate::session::Session;
use crate::views::{SavedView, ViewRow};

const SESSION_SETTING_KEY: &str = "session";

/// Sheet names are unique ignoring case, for every script, as in a workbook.
fn sheet_key(name: &str) -> String {
    name.to_lowercase()
}

/// The workbook: food catalog, saved views and the persisted session, in one SQLite file.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened workbook");
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS foods (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    calories_per_100g REAL NOT NULL,
                    protein_per_100g REAL NOT NULL,
                    carbs_per_100g REAL NOT NULL,
                    fat_per_100g REAL NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_foods_name ON foods(name);

                CREATE TABLE IF NOT EXISTS sheets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    name_key TEXT NOT NULL UNIQUE,
                    position INTEGER NOT NULL,
                    saved_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS sheet_rows (
                    sheet_id INTEGER NOT NULL REFERENCES sheets(id),
                    row_index INTEGER NOT NULL,
                    meal TEXT,
                    food_name TEXT,
                    calories REAL,
                    protein REAL,
                    carbs REAL,
                    fat REAL,
                    quantity_g REAL,
                    nutrient TEXT,
                    total REAL,
                    goal REAL,
                    PRIMARY KEY (sheet_id, row_index)
                );

                CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
            info!(from = version, to = 1, "migrated workbook schema");
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodRecord> {
        Ok(FoodRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            calories_per_100g: row.get(2)?,
            protein_per_100g: row.get(3)?,
            carbs_per_100g: row.get(4)?,
            fat_per_100g: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    // Expects columns:
    // 0: meal, 1: food_name, 2: calories, 3: protein, 4: carbs, 5: fat,
    // 6: quantity_g, 7: nutrient, 8: total, 9: goal
    fn view_row_from_row(row: &rusqlite::Row) -> rusqlite::Result<ViewRow> {
        let nutrient: Option<String> = row.get(7)?;
        if let Some(label) = nutrient {
            let nutrient = Nutrient::from_label(&label).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    format!("unknown nutrient '{label}'").into(),
                )
            })?;
            return Ok(ViewRow::Summary {
                nutrient,
                total: row.get::<_, Option<f64>>(8)?.unwrap_or(0.0),
                goal: row.get(9)?,
            });
        }
        Ok(ViewRow::Meal {
            meal: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            food_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            calories: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
            protein: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            carbs: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
            fat: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
            quantity_g: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
        })
    }

    // --- Foods ---

    pub fn insert_food(&self, food: &NewFood) -> Result<FoodRecord> {
        validate_food(food)?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO foods (name, calories_per_100g, protein_per_100g, carbs_per_100g, fat_per_100g, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                food.name.trim(),
                food.calories_per_100g,
                food.protein_per_100g,
                food.carbs_per_100g,
                food.fat_per_100g,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name = food.name.trim(), "inserted food");
        self.get_food_by_id(id)
    }

    /// Insert every food or none of them.
    pub fn insert_foods(&self, foods: &[NewFood]) -> Result<Vec<FoodRecord>> {
        for food in foods {
            validate_food(food)?;
        }
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = Vec::with_capacity(foods.len());
        for food in foods {
            inserted.push(self.insert_food(food)?);
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn get_food_by_id(&self, id: i64) -> Result<FoodRecord> {
        self.conn
            .query_row(
                "SELECT id, name, calories_per_100g, protein_per_100g, carbs_per_100g, fat_per_100g, created_at
                 FROM foods WHERE id = ?1",
                params![id],
                Self::food_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Food {id} not found")))
    }

    /// The whole catalog in insertion order.
    pub fn list_foods(&self) -> Result<Vec<FoodRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, calories_per_100g, protein_per_100g, carbs_per_100g, fat_per_100g, created_at
             FROM foods ORDER BY id",
        )?;
        let foods = stmt
            .query_map([], Self::food_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    pub fn count_foods(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM foods", [], |row| row.get(0))?)
    }

    // --- Saved views ---

    /// Store `rows` under `name`, replacing any view with that name but keeping its position.
    pub fn save_sheet(&self, name: &str, rows: &[ViewRow]) -> Result<SavedView> {
        let now = Local::now().to_rfc3339();
        let key = sheet_key(name);
        let tx = self.conn.unchecked_transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM sheets WHERE name_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let sheet_id = if let Some(id) = existing {
            tx.execute("DELETE FROM sheet_rows WHERE sheet_id = ?1", params![id])?;
            tx.execute(
                "UPDATE sheets SET name = ?1, name_key = ?2, saved_at = ?3 WHERE id = ?4",
                params![name, key, now, id],
            )?;
            id
        } else {
            tx.execute(
                "INSERT INTO sheets (name, name_key, position, saved_at)
                 VALUES (?1, ?2, (SELECT COALESCE(MAX(position), 0) + 1 FROM sheets), ?3)",
                params![name, key, now],
            )?;
            tx.last_insert_rowid()
        };

        {
            let mut stmt = tx.prepare(
                "INSERT INTO sheet_rows (sheet_id, row_index, meal, food_name, calories, protein, carbs, fat, quantity_g, nutrient, total, goal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for (idx, row) in rows.iter().enumerate() {
                let row_index = idx as i64;
                match row {
                    ViewRow::Meal {
                        meal,
                        food_name,
                        calories,
                        protein,
                        carbs,
                        fat,
                        quantity_g,
                    } => stmt.execute(params![
                        sheet_id,
                        row_index,
                        meal,
                        food_name,
                        calories,
                        protein,
                        carbs,
                        fat,
                        quantity_g,
                        None::<String>,
                        None::<f64>,
                        None::<f64>,
                    ])?,
                    ViewRow::Summary {
                        nutrient,
                        total,
                        goal,
                    } => stmt.execute(params![
                        sheet_id,
                        row_index,
                        None::<String>,
                        None::<String>,
                        None::<f64>,
                        None::<f64>,
                        None::<f64>,
                        None::<f64>,
                        None::<f64>,
                        nutrient.label(),
                        total,
                        goal,
                    ])?,
                };
            }
        }

        tx.commit()?;
        info!(name, rows = rows.len(), replaced = existing.is_some(), "saved view");
        self.load_sheet(name)
    }

    /// Saved view names in storage order.
    pub fn list_sheets(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sheets ORDER BY position")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn load_sheet(&self, name: &str) -> Result<SavedView> {
        let sheet: Option<(i64, String, String)> = self
            .conn
            .query_row(
                "SELECT id, name, saved_at FROM sheets WHERE name_key = ?1",
                params![sheet_key(name)],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((sheet_id, name, saved_at)) = sheet else {
            return Err(Error::not_found(format!("Sheet '{name}' not found")));
        };

        let mut stmt = self.conn.prepare(
            "SELECT meal, food_name, calories, protein, carbs, fat, quantity_g, nutrient, total, goal
             FROM sheet_rows WHERE sheet_id = ?1 ORDER BY row_index",
        )?;
        let rows = stmt
            .query_map(params![sheet_id], Self::view_row_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(SavedView {
            name,
            saved_at,
            rows,
        })
    }

    pub fn delete_sheet(&self, name: &str) -> Result<bool> {
        let key = sheet_key(name);
        let tx = self.conn.unchecked_transaction()?;
        let id: Option<i64> = tx
            .query_row(
                "SELECT id FROM sheets WHERE name_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = id else {
            return Ok(false);
        };
        tx.execute("DELETE FROM sheet_rows WHERE sheet_id = ?1", params![id])?;
        tx.execute("DELETE FROM sheets WHERE id = ?1", params![id])?;
        tx.commit()?;
        info!(name, "deleted view");
        Ok(true)
    }

    // --- User Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO user_settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM user_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    // --- Session ---

    pub fn load_session(&self) -> Result<Option<Session>> {
        match self.get_setting(SESSION_SETTING_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.set_setting(SESSION_SETTING_KEY, &json)
    }

    pub fn clear_session(&self) -> Result<bool> {
        self.delete_setting(SESSION_SETTING_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyGoals, SlotKey};
    use crate::views::build_view_rows;

    fn sample_food() -> NewFood {
        NewFood {
            name: "Chicken Breast".to_string(),
            calories_per_100g: 165.0,
            protein_per_100g: 31.0,
            carbs_per_100g: 0.0,
            fat_per_100g: 3.6,
        }
    }

    fn sample_rows(goal: Option<f64>) -> Vec<ViewRow> {
        vec![
            ViewRow::Meal {
                meal: "Lunch".to_string(),
                food_name: "Chicken Breast".to_string(),
                calories: 247.5,
                protein: 46.5,
                carbs: 0.0,
                fat: 5.4,
                quantity_g: 150.0,
            },
            ViewRow::Summary {
                nutrient: Nutrient::Calories,
                total: 247.5,
                goal,
            },
        ]
    }

    #[test]
    fn test_insert_and_get_food() {
        let db = Database::open_in_memory().unwrap();
        let food = db.insert_food(&sample_food()).unwrap();

        assert_eq!(food.name, "Chicken Breast");
        assert_eq!(food.calories_per_100g, 165.0);
        assert_eq!(food.fat_per_100g, 3.6);
        assert!(!food.created_at.is_empty());

        let fetched = db.get_food_by_id(food.id).unwrap();
        assert_eq!(fetched, food);
    }

    #[test]
    fn test_insert_food_trims_name() {
        let db = Database::open_in_memory().unwrap();
        let mut food = sample_food();
        food.name = "  Tofu ".to_string();
        assert_eq!(db.insert_food(&food).unwrap().name, "Tofu");
    }

    #[test]
    fn test_insert_food_rejects_invalid() {
        let db = Database::open_in_memory().unwrap();
        let mut food = sample_food();
        food.name = String::new();
        assert!(db.insert_food(&food).is_err());

        let mut food = sample_food();
        food.carbs_per_100g = -1.0;
        assert!(db.insert_food(&food).is_err());
        assert_eq!(db.count_foods().unwrap(), 0);
    }

    #[test]
    fn test_get_food_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_food_by_id(42).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_foods_in_insertion_order() {
        let db = Database::open_in_memory().unwrap();
        db.insert_food(&NewFood {
            name: "Zucchini".to_string(),
            ..sample_food()
        })
        .unwrap();
        db.insert_food(&sample_food()).unwrap();
        let names: Vec<String> = db.list_foods().unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Zucchini", "Chicken Breast"]);
    }

    #[test]
    fn test_insert_foods_is_all_or_nothing() {
        let db = Database::open_in_memory().unwrap();
        let bad = NewFood {
            name: " ".to_string(),
            ..sample_food()
        };
        assert!(db.insert_foods(&[sample_food(), bad]).is_err());
        assert_eq!(db.count_foods().unwrap(), 0);

        let inserted = db
            .insert_foods(&[sample_food(), NewFood {
                name: "Rice".to_string(),
                ..sample_food()
            }])
            .unwrap();
        assert_eq!(inserted.len(), 2);
        assert_eq!(db.count_foods().unwrap(), 2);
    }

    #[test]
    fn test_save_and_load_sheet() {
        let db = Database::open_in_memory().unwrap();
        let saved = db.save_sheet("Monday", &sample_rows(Some(2000.0))).unwrap();
        assert_eq!(saved.name, "Monday");
        assert_eq!(saved.rows, sample_rows(Some(2000.0)));

        let loaded = db.load_sheet("Monday").unwrap();
        assert_eq!(loaded.rows, sample_rows(Some(2000.0)));
    }

    #[test]
    fn test_not_set_goal_survives_storage() {
        let db = Database::open_in_memory().unwrap();
        db.save_sheet("Tuesday", &sample_rows(None)).unwrap();
        let loaded = db.load_sheet("Tuesday").unwrap();
        assert_eq!(loaded.rows[1], sample_rows(None)[1]);
    }

    #[test]
    fn test_load_missing_sheet() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_sheet("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_sheets_in_storage_order_and_replace_keeps_position() {
        let db = Database::open_in_memory().unwrap();
        db.save_sheet("Week 1", &sample_rows(None)).unwrap();
        db.save_sheet("Week 2", &sample_rows(None)).unwrap();
        db.save_sheet("Week 3", &sample_rows(None)).unwrap();
        assert_eq!(db.list_sheets().unwrap(), vec!["Week 1", "Week 2", "Week 3"]);

        let replaced = db.save_sheet("week 1", &sample_rows(Some(1800.0))[1..]).unwrap();
        assert_eq!(replaced.rows.len(), 1);
        assert_eq!(db.list_sheets().unwrap(), vec!["week 1", "Week 2", "Week 3"]);
        assert_eq!(db.load_sheet("Week 1").unwrap().rows.len(), 1);
    }

    #[test]
    fn test_sheet_names_fold_case_beyond_ascii() {
        let db = Database::open_in_memory().unwrap();
        db.save_sheet("Città", &sample_rows(None)).unwrap();
        db.save_sheet("CITTÀ", &sample_rows(Some(1800.0))[1..]).unwrap();

        assert_eq!(db.list_sheets().unwrap(), vec!["CITTÀ"]);
        assert_eq!(db.load_sheet("città").unwrap().rows.len(), 1);
        assert!(db.delete_sheet("cittÀ").unwrap());
        assert!(db.list_sheets().unwrap().is_empty());
    }

    #[test]
    fn test_delete_sheet() {
        let db = Database::open_in_memory().unwrap();
        db.save_sheet("Monday", &sample_rows(None)).unwrap();
        assert!(db.delete_sheet("monday").unwrap());
        assert!(!db.delete_sheet("monday").unwrap());
        assert!(db.list_sheets().unwrap().is_empty());
        db.save_sheet("Monday", &sample_rows(None)).unwrap();
        assert_eq!(db.load_sheet("Monday").unwrap().rows.len(), 2);
    }

    #[test]
    fn test_settings_crud() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_setting("k").unwrap().is_none());
        db.set_setting("k", "1").unwrap();
        db.set_setting("k", "2").unwrap();
        assert_eq!(db.get_setting("k").unwrap().as_deref(), Some("2"));
        assert!(db.delete_setting("k").unwrap());
        assert!(!db.delete_setting("k").unwrap());
    }

    #[test]
    fn test_session_persistence() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load_session().unwrap().is_none());

        let food = db.insert_food(&sample_food()).unwrap();
        let mut session = Session::default();
        session.add_entry(SlotKey(2), food, 150.0).unwrap();
        session
            .set_goals(DailyGoals {
                calories: Some(2100.0),
                ..DailyGoals::default()
            })
            .unwrap();
        db.save_session(&session).unwrap();

        let loaded = db.load_session().unwrap().unwrap();
        assert_eq!(loaded, session);
        assert_eq!(build_view_rows(&loaded), build_view_rows(&session));

        assert!(db.clear_session().unwrap());
        assert!(db.load_session().unwrap().is_none());
    }

    #[test]
    fn test_reopen_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diet.db");
        {
            let db = Database::open(&path).unwrap();
            db.insert_food(&sample_food()).unwrap();
            db.save_sheet("Monday", &sample_rows(None)).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count_foods().unwrap(), 1);
        assert_eq!(db.list_sheets().unwrap(), vec!["Monday"]);
    }
}
