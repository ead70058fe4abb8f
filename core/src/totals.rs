use serde::Serialize;

use crate::models::{DailyGoals, MealEntry, MealSlot, Nutrient, Nutrients, SlotKey};
use crate::session::Session;

/// Sum of the scaled values of every entry in the slot. Empty slots total zero.
#[must_use]
pub fn meal_totals(slot: &MealSlot) -> Nutrients {
    slot.entries.iter().map(|e| e.scaled).sum()
}

#[must_use]
pub fn daily_totals<'a, I>(slots: I) -> Nutrients
where
    I: IntoIterator<Item = &'a MealSlot>,
{
    slots.into_iter().map(meal_totals).sum()
}

/// Share of `goal` reached, clamped to `[0, 1]`. A goal of zero shows no progress.
#[must_use]
pub fn progress(total: f64, goal: f64) -> f64 {
    if goal > 0.0 {
        (total / goal).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GoalStatus {
    NotSet,
    Set { goal: f64, ratio: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientProgress {
    pub nutrient: Nutrient,
    pub total: f64,
    #[serde(flatten)]
    pub status: GoalStatus,
}

#[must_use]
pub fn goal_progress(totals: &Nutrients, goals: Option<&DailyGoals>) -> Vec<NutrientProgress> {
    Nutrient::ALL
        .into_iter()
        .map(|nutrient| {
            let total = totals.get(nutrient);
            let status = match goals.and_then(|g| g.get(nutrient)) {
                Some(goal) => GoalStatus::Set {
                    goal,
                    ratio: progress(total, goal),
                },
                None => GoalStatus::NotSet,
            };
            NutrientProgress {
                nutrient,
                total,
                status,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotSummary {
    pub key: SlotKey,
    pub name: String,
    pub entries: Vec<MealEntry>,
    pub subtotal: Nutrients,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub slots: Vec<SlotSummary>,
    pub totals: Nutrients,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<DailyGoals>,
    pub progress: Vec<NutrientProgress>,
}

#[must_use]
pub fn summarize(session: &Session) -> DailySummary {
    let slots: Vec<SlotSummary> = session
        .slots()
        .iter()
        .map(|slot| SlotSummary {
            key: slot.key,
            name: slot.display_name.clone(),
            entries: slot.entries.clone(),
            subtotal: meal_totals(slot),
        })
        .collect();
    let totals: Nutrients = slots.iter().map(|s| s.subtotal).sum();
    let goals = session.goals().copied();
    let progress = goal_progress(&totals, goals.as_ref());

    DailySummary {
        slots,
        totals,
        goals,
        progress,
    }
}
