//! Denormalized saved-view rows.
//!
//! A saved view is one table: a row per meal entry, followed by one summary
//! row per nutrient. Both kinds share the same ten columns; the fields that
//! do not apply to a row are left blank.

use serde::{Deserialize, Serialize};

use crate::models::{DailyGoals, Nutrient, Nutrients};
use crate::session::Session;
use crate::totals::daily_totals;

pub const VIEW_COLUMNS: [&str; 10] = [
    "Meal", "FoodName", "Calories", "Protein", "Carbs", "Fat", "Quantity", "Nutrient", "Total",
    "Goal",
];

/// Text written in the `Goal` column when no goal was set.
pub const GOAL_NOT_SET: &str = "Not Set";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewRow {
    Meal {
        meal: String,
        food_name: String,
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
        quantity_g: f64,
    },
    Summary {
        nutrient: Nutrient,
        total: f64,
        goal: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl ViewRow {
    /// The row laid out in [`VIEW_COLUMNS`] order.
    #[must_use]
    pub fn cells(&self) -> [Cell; 10] {
        match self {
            ViewRow::Meal {
                meal,
                food_name,
                calories,
                protein,
                carbs,
                fat,
                quantity_g,
            } => [
                Cell::Text(meal.clone()),
                Cell::Text(food_name.clone()),
                Cell::Number(*calories),
                Cell::Number(*protein),
                Cell::Number(*carbs),
                Cell::Number(*fat),
                Cell::Number(*quantity_g),
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
            ],
            ViewRow::Summary {
                nutrient,
                total,
                goal,
            } => [
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
                Cell::Text(nutrient.label().to_string()),
                Cell::Number(*total),
                goal.map_or_else(|| Cell::Text(GOAL_NOT_SET.to_string()), Cell::Number),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedView {
    pub name: String,
    pub saved_at: String,
    pub rows: Vec<ViewRow>,
}

impl SavedView {
    /// Daily totals recorded in the summary rows, if the view has any.
    #[must_use]
    pub fn totals(&self) -> Option<Nutrients> {
        let mut totals = Nutrients::ZERO;
        let mut seen = false;
        for row in &self.rows {
            if let ViewRow::Summary {
                nutrient, total, ..
            } = row
            {
                seen = true;
                match nutrient {
                    Nutrient::Calories => totals.calories = *total,
                    Nutrient::Protein => totals.protein = *total,
                    Nutrient::Carbs => totals.carbs = *total,
                    Nutrient::Fat => totals.fat = *total,
                }
            }
        }
        seen.then_some(totals)
    }

    /// Goals in effect when the view was saved.
    #[must_use]
    pub fn goals(&self) -> DailyGoals {
        let mut goals = DailyGoals::default();
        for row in &self.rows {
            if let ViewRow::Summary { nutrient, goal, .. } = row {
                match nutrient {
                    Nutrient::Calories => goals.calories = *goal,
                    Nutrient::Protein => goals.protein = *goal,
                    Nutrient::Carbs => goals.carbs = *goal,
                    Nutrient::Fat => goals.fat = *goal,
                }
            }
        }
        goals
    }

    pub fn meal_rows(&self) -> impl Iterator<Item = &ViewRow> {
        self.rows
            .iter()
            .filter(|r| matches!(r, ViewRow::Meal { .. }))
    }
}

/// Meal rows for every entry (slots in key order, empty slots skipped), then the summary rows.
#[must_use]
pub fn build_view_rows(session: &Session) -> Vec<ViewRow> {
    let mut rows: Vec<ViewRow> = session
        .slots()
        .iter()
        .flat_map(|slot| {
            slot.entries.iter().map(move |e| ViewRow::Meal {
                meal: slot.display_name.clone(),
                food_name: e.food.name.clone(),
                calories: e.scaled.calories,
                protein: e.scaled.protein,
                carbs: e.scaled.carbs,
                fat: e.scaled.fat,
                quantity_g: e.quantity_g,
            })
        })
        .collect();

    let totals = daily_totals(session.slots());
    let goals = session.goals();
    rows.extend(Nutrient::ALL.into_iter().map(|nutrient| ViewRow::Summary {
        nutrient,
        total: totals.get(nutrient),
        goal: goals.and_then(|g| g.get(nutrient)),
    }));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodRecord, SlotKey};

    fn food(name: &str, calories: f64) -> FoodRecord {
        FoodRecord {
            id: 0,
            name: name.to_string(),
            calories_per_100g: calories,
            protein_per_100g: 10.0,
            carbs_per_100g: 20.0,
            fat_per_100g: 5.0,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_rows_for_empty_session_are_summary_only() {
        let rows = build_view_rows(&Session::default());
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| matches!(
            r,
            ViewRow::Summary {
                goal: None,
                ..
            }
        )));
    }

    #[test]
    fn test_meal_rows_precede_summary_rows() {
        let mut s = Session::default();
        s.rename_slot(SlotKey(3), "Dinner").unwrap();
        s.add_entry(SlotKey(3), food("Pasta", 350.0), 120.0).unwrap();
        s.add_entry(SlotKey(1), food("Oats", 389.0), 50.0).unwrap();
        s.set_goals(DailyGoals {
            calories: Some(2200.0),
            ..DailyGoals::default()
        })
        .unwrap();

        let rows = build_view_rows(&s);
        assert_eq!(rows.len(), 6);
        match &rows[0] {
            ViewRow::Meal { meal, food_name, .. } => {
                assert_eq!(meal, "Meal 1");
                assert_eq!(food_name, "Oats");
            }
            other => panic!("expected meal row, got {other:?}"),
        }
        match &rows[1] {
            ViewRow::Meal {
                meal, quantity_g, ..
            } => {
                assert_eq!(meal, "Dinner");
                assert!((quantity_g - 120.0).abs() < f64::EPSILON);
            }
            other => panic!("expected meal row, got {other:?}"),
        }
        assert_eq!(
            rows[2],
            ViewRow::Summary {
                nutrient: Nutrient::Calories,
                total: 389.0 * 50.0 / 100.0 + 350.0 * 120.0 / 100.0,
                goal: Some(2200.0),
            }
        );
    }

    #[test]
    fn test_cells_follow_column_layout() {
        let meal = ViewRow::Meal {
            meal: "Meal 1".to_string(),
            food_name: "Oats".to_string(),
            calories: 194.5,
            protein: 8.45,
            carbs: 33.15,
            fat: 3.45,
            quantity_g: 50.0,
        };
        let cells = meal.cells();
        assert_eq!(cells.len(), VIEW_COLUMNS.len());
        assert_eq!(cells[1], Cell::Text("Oats".to_string()));
        assert_eq!(cells[6], Cell::Number(50.0));
        assert_eq!(cells[9], Cell::Empty);

        let summary = ViewRow::Summary {
            nutrient: Nutrient::Fat,
            total: 3.45,
            goal: None,
        };
        let cells = summary.cells();
        assert_eq!(cells[0], Cell::Empty);
        assert_eq!(cells[7], Cell::Text("Fat".to_string()));
        assert_eq!(cells[9], Cell::Text(GOAL_NOT_SET.to_string()));
    }

    #[test]
    fn test_saved_view_totals_and_goals() {
        let mut s = Session::default();
        s.add_entry(SlotKey(2), food("Oats", 389.0), 50.0).unwrap();
        s.set_goals(DailyGoals {
            protein: Some(100.0),
            ..DailyGoals::default()
        })
        .unwrap();
        let view = SavedView {
            name: "Monday".to_string(),
            saved_at: String::new(),
            rows: build_view_rows(&s),
        };
        assert_eq!(view.totals(), Some(daily_totals(s.slots())));
        assert_eq!(view.goals(), *s.goals().unwrap());
        assert_eq!(view.meal_rows().count(), 1);
    }
}
