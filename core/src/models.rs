use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fewest meal slots a session may hold.
pub const MIN_MEAL_SLOTS: u32 = 3;
/// Most meal slots a session may hold.
pub const MAX_MEAL_SLOTS: u32 = 10;

/// Sheet name reserved for the catalog in exported workbooks.
pub const CATALOG_SHEET_NAME: &str = "Catalog";
const MAX_VIEW_NAME_CHARS: usize = 31;
const FORBIDDEN_VIEW_NAME_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub id: i64,
    pub name: String,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
    #[serde(default)]
    pub created_at: String,
}

impl FoodRecord {
    #[must_use]
    pub fn per_100g(&self) -> Nutrients {
        Nutrients {
            calories: self.calories_per_100g,
            protein: self.protein_per_100g,
            carbs: self.carbs_per_100g,
            fat: self.fat_per_100g,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFood {
    pub name: String,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
}

/// The four tracked nutrient amounts, either per 100 g or already scaled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Nutrients {
    pub const ZERO: Nutrients = Nutrients {
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fat: 0.0,
    };

    /// Linear scaling from a per-100g basis to `quantity_g` grams.
    #[must_use]
    pub fn scaled_to(self, quantity_g: f64) -> Nutrients {
        Nutrients {
            calories: self.calories * quantity_g / 100.0,
            protein: self.protein * quantity_g / 100.0,
            carbs: self.carbs * quantity_g / 100.0,
            fat: self.fat * quantity_g / 100.0,
        }
    }

    #[must_use]
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
        }
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(self, rhs: Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for Nutrients {
    fn add_assign(&mut self, rhs: Nutrients) {
        *self = *self + rhs;
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Nutrients>>(iter: I) -> Nutrients {
        iter.fold(Nutrients::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Nutrients> for Nutrients {
    fn sum<I: Iterator<Item = &'a Nutrients>>(iter: I) -> Nutrients {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fat,
}

impl Nutrient {
    pub const ALL: [Nutrient; 4] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Nutrient::Calories => "Calories",
            Nutrient::Protein => "Protein",
            Nutrient::Carbs => "Carbs",
            Nutrient::Fat => "Fat",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            Nutrient::Protein | Nutrient::Carbs | Nutrient::Fat => "g",
        }
    }

    /// Parse a summary-row label back into a nutrient.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Nutrient> {
        Nutrient::ALL
            .into_iter()
            .find(|n| n.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A food placed in a meal slot, scaled to the entered quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub food: FoodRecord,
    pub quantity_g: f64,
    pub scaled: Nutrients,
}

impl MealEntry {
    pub fn new(food: FoodRecord, quantity_g: f64) -> Result<Self> {
        validate_quantity(quantity_g)?;
        let scaled = food.per_100g().scaled_to(quantity_g);
        Ok(MealEntry {
            food,
            quantity_g,
            scaled,
        })
    }
}

/// Stable slot identity, assigned in creation order and never derived from the display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotKey(pub u32);

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSlot {
    pub key: SlotKey,
    pub display_name: String,
    #[serde(default)]
    pub entries: Vec<MealEntry>,
}

impl MealSlot {
    #[must_use]
    pub fn new(key: SlotKey) -> Self {
        MealSlot {
            key,
            display_name: default_slot_name(key),
            entries: Vec::new(),
        }
    }
}

#[must_use]
pub fn default_slot_name(key: SlotKey) -> String {
    format!("Meal {key}")
}

/// Daily targets; a `None` field means that goal is not set, which is not the same as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyGoals {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl DailyGoals {
    #[must_use]
    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Carbs => self.carbs,
            Nutrient::Fat => self.fat,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        Nutrient::ALL.iter().all(|n| self.get(*n).is_none())
    }
}

fn validate_amount(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation(format!("{what} must be a finite number")));
    }
    if value < 0.0 {
        return Err(Error::validation(format!("{what} must not be negative")));
    }
    Ok(())
}

/// Name must not be blank; nutrient values must be finite and non-negative.
pub fn validate_food(food: &NewFood) -> Result<()> {
    if food.name.trim().is_empty() {
        return Err(Error::validation("Food name must not be empty"));
    }
    validate_amount("calories_per_100g", food.calories_per_100g)?;
    validate_amount("protein_per_100g", food.protein_per_100g)?;
    validate_amount("carbs_per_100g", food.carbs_per_100g)?;
    validate_amount("fat_per_100g", food.fat_per_100g)?;
    Ok(())
}

/// Zero is accepted as a placeholder quantity.
pub fn validate_quantity(quantity_g: f64) -> Result<()> {
    validate_amount("Quantity", quantity_g)
}

pub fn validate_goals(goals: &DailyGoals) -> Result<()> {
    if goals.is_empty() {
        return Err(Error::validation(
            "Provide at least one goal (calories, protein, carbs or fat)",
        ));
    }
    for nutrient in Nutrient::ALL {
        if let Some(v) = goals.get(nutrient) {
            validate_amount(&format!("{nutrient} goal"), v)?;
        }
    }
    Ok(())
}

pub fn validate_slot_count(count: u32) -> Result<()> {
    if (MIN_MEAL_SLOTS..=MAX_MEAL_SLOTS).contains(&count) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Number of meals must be between {MIN_MEAL_SLOTS} and {MAX_MEAL_SLOTS} (got {count})"
        )))
    }
}

pub fn validate_slot_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Meal name must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Saved views become workbook sheets on export, so they follow sheet naming rules.
pub fn validate_view_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Please enter a sheet name"));
    }
    if trimmed.chars().count() > MAX_VIEW_NAME_CHARS {
        return Err(Error::validation(format!(
            "Sheet name '{trimmed}' is longer than {MAX_VIEW_NAME_CHARS} characters"
        )));
    }
    if let Some(c) = trimmed.chars().find(|c| FORBIDDEN_VIEW_NAME_CHARS.contains(c)) {
        return Err(Error::validation(format!(
            "Sheet name '{trimmed}' must not contain '{c}'"
        )));
    }
    if trimmed.starts_with('\'') || trimmed.ends_with('\'') {
        return Err(Error::validation(format!(
            "Sheet name '{trimmed}' must not start or end with an apostrophe"
        )));
    }
    if trimmed.to_lowercase() == CATALOG_SHEET_NAME.to_lowercase() {
        return Err(Error::validation(format!(
            "'{CATALOG_SHEET_NAME}' is reserved for the food catalog"
        )));
    }
    Ok(trimmed.to_string())
}
