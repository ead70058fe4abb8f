//! Meal builder and goal state for one interactive session.
//!
//! A [`Session`] is a plain value. Every user action is described by an
//! [`Action`] and applied with [`Session::apply`], which leaves the current
//! session untouched and returns the next one together with an [`Outcome`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{
    DailyGoals, FoodRecord, MIN_MEAL_SLOTS, MealEntry, MealSlot, SlotKey, validate_goals,
    validate_slot_count, validate_slot_name,
};

/// What to do with populated slots when the meal count shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShrinkPolicy {
    /// Fail if any slot that would be dropped still has entries.
    #[default]
    Refuse,
    /// Drop the slots and their entries; the caller has confirmed.
    DiscardEntries,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddEntry {
        slot: SlotKey,
        food: FoodRecord,
        quantity_g: f64,
    },
    RemoveEntry {
        slot: SlotKey,
        index: usize,
    },
    ClearSlot {
        slot: SlotKey,
    },
    RenameSlot {
        slot: SlotKey,
        name: String,
    },
    Resize {
        count: u32,
        policy: ShrinkPolicy,
    },
    SetGoals(DailyGoals),
    ClearGoals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Outcome {
    EntryAdded {
        slot: SlotKey,
        slot_name: String,
        entry: MealEntry,
    },
    EntryRemoved {
        slot: SlotKey,
        slot_name: String,
        entry: MealEntry,
    },
    SlotCleared {
        slot: SlotKey,
        slot_name: String,
        removed: usize,
    },
    SlotRenamed {
        slot: SlotKey,
        old_name: String,
        new_name: String,
    },
    Resized {
        from: u32,
        to: u32,
        discarded_entries: usize,
    },
    GoalsSet {
        goals: DailyGoals,
    },
    GoalsCleared {
        was_set: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Ordered by key; keys run from 1 to `slots.len()`.
    slots: Vec<MealSlot>,
    #[serde(default)]
    goals: Option<DailyGoals>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            slots: (1..=MIN_MEAL_SLOTS).map(|k| MealSlot::new(SlotKey(k))).collect(),
            goals: None,
        }
    }
}

impl Session {
    pub fn with_slot_count(count: u32) -> Result<Self> {
        validate_slot_count(count)?;
        Ok(Session {
            slots: (1..=count).map(|k| MealSlot::new(SlotKey(k))).collect(),
            goals: None,
        })
    }

    #[must_use]
    pub fn slots(&self) -> &[MealSlot] {
        &self.slots
    }

    #[must_use]
    pub fn goals(&self) -> Option<&DailyGoals> {
        self.goals.as_ref()
    }

    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn slot(&self, key: SlotKey) -> Result<&MealSlot> {
        self.slots
            .iter()
            .find(|s| s.key == key)
            .ok_or_else(|| Error::not_found(format!("Meal slot {key} does not exist")))
    }

    fn slot_mut(&mut self, key: SlotKey) -> Result<&mut MealSlot> {
        self.slots
            .iter_mut()
            .find(|s| s.key == key)
            .ok_or_else(|| Error::not_found(format!("Meal slot {key} does not exist")))
    }

    /// Resolve a user reference to a slot: its numeric key, or its display name (case-insensitive).
    pub fn find_slot(&self, reference: &str) -> Result<SlotKey> {
        let reference = reference.trim();
        if let Ok(n) = reference.parse::<u32>() {
            return self.slot(SlotKey(n)).map(|s| s.key);
        }
        let lower = reference.to_lowercase();
        self.slots
            .iter()
            .find(|s| s.display_name.to_lowercase() == lower)
            .map(|s| s.key)
            .ok_or_else(|| Error::not_found(format!("No meal named '{reference}'")))
    }

    /// Apply one action to a copy of this session.
    ///
    /// On error `self` is unchanged, so the caller keeps the last good state.
    pub fn apply(&self, action: Action) -> Result<(Session, Outcome)> {
        let mut next = self.clone();
        let outcome = match action {
            Action::AddEntry {
                slot,
                food,
                quantity_g,
            } => {
                let entry = next.add_entry(slot, food, quantity_g)?;
                Outcome::EntryAdded {
                    slot,
                    slot_name: next.slot(slot)?.display_name.clone(),
                    entry,
                }
            }
            Action::RemoveEntry { slot, index } => {
                let entry = next.remove_entry(slot, index)?;
                Outcome::EntryRemoved {
                    slot,
                    slot_name: next.slot(slot)?.display_name.clone(),
                    entry,
                }
            }
            Action::ClearSlot { slot } => {
                let removed = next.clear_slot(slot)?;
                Outcome::SlotCleared {
                    slot,
                    slot_name: next.slot(slot)?.display_name.clone(),
                    removed,
                }
            }
            Action::RenameSlot { slot, name } => {
                let old_name = next.rename_slot(slot, &name)?;
                Outcome::SlotRenamed {
                    slot,
                    old_name,
                    new_name: next.slot(slot)?.display_name.clone(),
                }
            }
            Action::Resize { count, policy } => {
                let from = next.slot_count();
                let discarded_entries = next.resize_slot_count(count, policy)?;
                Outcome::Resized {
                    from,
                    to: count,
                    discarded_entries,
                }
            }
            Action::SetGoals(goals) => {
                next.set_goals(goals)?;
                Outcome::GoalsSet { goals }
            }
            Action::ClearGoals => Outcome::GoalsCleared {
                was_set: next.clear_goals(),
            },
        };
        Ok((next, outcome))
    }

    pub fn add_entry(
        &mut self,
        slot: SlotKey,
        food: FoodRecord,
        quantity_g: f64,
    ) -> Result<MealEntry> {
        let entry = MealEntry::new(food, quantity_g)?;
        self.slot_mut(slot)?.entries.push(entry.clone());
        Ok(entry)
    }

    /// Remove the entry at `index` (0-based). An out-of-range index leaves the slot unchanged.
    pub fn remove_entry(&mut self, slot: SlotKey, index: usize) -> Result<MealEntry> {
        let target = self.slot_mut(slot)?;
        if index >= target.entries.len() {
            let len = target.entries.len();
            return Err(Error::not_found(format!(
                "{} has no item at position {} ({len} item(s))",
                target.display_name,
                index + 1
            )));
        }
        Ok(target.entries.remove(index))
    }

    pub fn clear_slot(&mut self, slot: SlotKey) -> Result<usize> {
        let target = self.slot_mut(slot)?;
        let removed = target.entries.len();
        target.entries.clear();
        Ok(removed)
    }

    /// Returns the previous display name.
    pub fn rename_slot(&mut self, slot: SlotKey, name: &str) -> Result<String> {
        let name = validate_slot_name(name)?;
        let target = self.slot_mut(slot)?;
        Ok(std::mem::replace(&mut target.display_name, name))
    }

    /// Grow or shrink to `count` slots. Returns how many entries were discarded.
    pub fn resize_slot_count(&mut self, count: u32, policy: ShrinkPolicy) -> Result<usize> {
        validate_slot_count(count)?;
        let current = self.slot_count();

        if count >= current {
            for k in current + 1..=count {
                self.slots.push(MealSlot::new(SlotKey(k)));
            }
            return Ok(0);
        }

        let dropped = &self.slots[count as usize..];
        let populated: Vec<&str> = dropped
            .iter()
            .filter(|s| !s.entries.is_empty())
            .map(|s| s.display_name.as_str())
            .collect();
        if !populated.is_empty() && policy == ShrinkPolicy::Refuse {
            return Err(Error::validation(format!(
                "Cannot reduce to {count} meals: {} still have entries. Clear them first or force the change",
                populated.join(", ")
            )));
        }
        let discarded = dropped.iter().map(|s| s.entries.len()).sum();
        self.slots.truncate(count as usize);
        Ok(discarded)
    }

    /// Replace the goals wholesale; fields left `None` become unset.
    pub fn set_goals(&mut self, goals: DailyGoals) -> Result<()> {
        validate_goals(&goals)?;
        self.goals = Some(goals);
        Ok(())
    }

    /// Returns whether goals were set before.
    pub fn clear_goals(&mut self) -> bool {
        self.goals.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn food(id: i64, name: &str, calories: f64) -> FoodRecord {
        FoodRecord {
            id,
            name: name.to_string(),
            calories_per_100g: calories,
            protein_per_100g: 10.0,
            carbs_per_100g: 20.0,
            fat_per_100g: 5.0,
            created_at: String::new(),
        }
    }

    fn session_with_entries() -> Session {
        let mut s = Session::default();
        s.add_entry(SlotKey(1), food(1, "Oats", 389.0), 50.0).unwrap();
        s.add_entry(SlotKey(1), food(2, "Milk", 64.0), 200.0).unwrap();
        s.add_entry(SlotKey(1), food(3, "Banana", 89.0), 120.0).unwrap();
        s
    }

    #[test]
    fn test_default_session_has_three_empty_slots() {
        let s = Session::default();
        assert_eq!(s.slot_count(), 3);
        assert!(s.slots().iter().all(|slot| slot.entries.is_empty()));
        assert_eq!(s.slots()[2].display_name, "Meal 3");
        assert!(s.goals().is_none());
    }

    #[test]
    fn test_add_entry_appends_in_order() {
        let s = session_with_entries();
        let names: Vec<&str> = s
            .slot(SlotKey(1))
            .unwrap()
            .entries
            .iter()
            .map(|e| e.food.name.as_str())
            .collect();
        assert_eq!(names, vec!["Oats", "Milk", "Banana"]);
    }

    #[test]
    fn test_add_entry_unknown_slot() {
        let mut s = Session::default();
        let err = s
            .add_entry(SlotKey(9), food(1, "Oats", 389.0), 50.0)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_entry_keeps_relative_order() {
        let mut s = session_with_entries();
        let removed = s.remove_entry(SlotKey(1), 1).unwrap();
        assert_eq!(removed.food.name, "Milk");
        let names: Vec<&str> = s
            .slot(SlotKey(1))
            .unwrap()
            .entries
            .iter()
            .map(|e| e.food.name.as_str())
            .collect();
        assert_eq!(names, vec!["Oats", "Banana"]);
    }

    #[test]
    fn test_remove_entry_out_of_range_leaves_list_unchanged() {
        let mut s = session_with_entries();
        let before = s.clone();
        let err = s.remove_entry(SlotKey(1), 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(s, before);
    }

    #[test]
    fn test_clear_slot() {
        let mut s = session_with_entries();
        assert_eq!(s.clear_slot(SlotKey(1)).unwrap(), 3);
        assert!(s.slot(SlotKey(1)).unwrap().entries.is_empty());
        assert_eq!(s.clear_slot(SlotKey(1)).unwrap(), 0);
    }

    #[test]
    fn test_rename_keeps_entries_and_key() {
        let mut s = session_with_entries();
        let old = s.rename_slot(SlotKey(1), "  Breakfast ").unwrap();
        assert_eq!(old, "Meal 1");
        let slot = s.slot(SlotKey(1)).unwrap();
        assert_eq!(slot.display_name, "Breakfast");
        assert_eq!(slot.key, SlotKey(1));
        assert_eq!(slot.entries.len(), 3);
        assert_eq!(s.find_slot("breakfast").unwrap(), SlotKey(1));
        assert!(s.rename_slot(SlotKey(1), " ").is_err());
    }

    #[test]
    fn test_find_slot_by_key_or_name() {
        let s = Session::default();
        assert_eq!(s.find_slot("2").unwrap(), SlotKey(2));
        assert_eq!(s.find_slot("meal 3").unwrap(), SlotKey(3));
        assert!(s.find_slot("7").unwrap_err().is_not_found());
        assert!(s.find_slot("Dinner").unwrap_err().is_not_found());
    }

    #[test]
    fn test_resize_grow_appends_default_slots() {
        let mut s = session_with_entries();
        s.rename_slot(SlotKey(2), "Lunch").unwrap();
        assert_eq!(s.resize_slot_count(5, ShrinkPolicy::Refuse).unwrap(), 0);
        assert_eq!(s.slot_count(), 5);
        assert_eq!(s.slots()[1].display_name, "Lunch");
        assert_eq!(s.slots()[4].key, SlotKey(5));
        assert_eq!(s.slots()[4].display_name, "Meal 5");
        assert_eq!(s.slot(SlotKey(1)).unwrap().entries.len(), 3);
    }

    #[test]
    fn test_resize_bounds() {
        let mut s = Session::default();
        assert!(s.resize_slot_count(2, ShrinkPolicy::Refuse).is_err());
        assert!(s.resize_slot_count(11, ShrinkPolicy::Refuse).is_err());
        assert_eq!(s.slot_count(), 3);
    }

    #[test]
    fn test_shrink_drops_empty_slots_freely() {
        let mut s = Session::with_slot_count(6).unwrap();
        s.add_entry(SlotKey(2), food(1, "Oats", 389.0), 50.0).unwrap();
        assert_eq!(s.resize_slot_count(3, ShrinkPolicy::Refuse).unwrap(), 0);
        assert_eq!(s.slot_count(), 3);
    }

    #[test]
    fn test_shrink_refuses_to_lose_entries() {
        let mut s = Session::with_slot_count(5).unwrap();
        s.add_entry(SlotKey(5), food(1, "Oats", 389.0), 50.0).unwrap();
        let before = s.clone();
        let err = s.resize_slot_count(4, ShrinkPolicy::Refuse).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("Meal 5"));
        assert_eq!(s, before);

        assert_eq!(s.resize_slot_count(4, ShrinkPolicy::DiscardEntries).unwrap(), 1);
        assert_eq!(s.slot_count(), 4);
    }

    #[test]
    fn test_regrow_after_shrink_reuses_keys_with_empty_slots() {
        let mut s = Session::with_slot_count(4).unwrap();
        s.rename_slot(SlotKey(4), "Snack").unwrap();
        s.resize_slot_count(3, ShrinkPolicy::Refuse).unwrap();
        s.resize_slot_count(4, ShrinkPolicy::Refuse).unwrap();
        assert_eq!(s.slot(SlotKey(4)).unwrap().display_name, "Meal 4");
    }

    #[test]
    fn test_set_goals_replaces_wholesale() {
        let mut s = Session::default();
        s.set_goals(DailyGoals {
            calories: Some(2000.0),
            protein: Some(120.0),
            ..DailyGoals::default()
        })
        .unwrap();
        s.set_goals(DailyGoals {
            fat: Some(70.0),
            ..DailyGoals::default()
        })
        .unwrap();
        let goals = s.goals().unwrap();
        assert_eq!(goals.calories, None);
        assert_eq!(goals.protein, None);
        assert_eq!(goals.fat, Some(70.0));
        assert!(s.clear_goals());
        assert!(!s.clear_goals());
    }

    #[test]
    fn test_apply_is_pure() {
        let s = Session::default();
        let (next, outcome) = s
            .apply(Action::AddEntry {
                slot: SlotKey(2),
                food: food(1, "Oats", 389.0),
                quantity_g: 50.0,
            })
            .unwrap();
        assert!(s.slot(SlotKey(2)).unwrap().entries.is_empty());
        assert_eq!(next.slot(SlotKey(2)).unwrap().entries.len(), 1);
        match outcome {
            Outcome::EntryAdded {
                slot,
                slot_name,
                entry,
            } => {
                assert_eq!(slot, SlotKey(2));
                assert_eq!(slot_name, "Meal 2");
                assert!((entry.scaled.calories - 194.5).abs() < 1e-9);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_apply_error_keeps_state() {
        let s = session_with_entries();
        let err = s
            .apply(Action::RemoveEntry {
                slot: SlotKey(1),
                index: 10,
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(s.slot(SlotKey(1)).unwrap().entries.len(), 3);
    }

    #[test]
    fn test_apply_resize_outcome() {
        let s = Session::default();
        let (next, outcome) = s
            .apply(Action::Resize {
                count: 7,
                policy: ShrinkPolicy::Refuse,
            })
            .unwrap();
        assert_eq!(next.slot_count(), 7);
        assert_eq!(
            outcome,
            Outcome::Resized {
                from: 3,
                to: 7,
                discarded_entries: 0
            }
        );
    }

    #[test]
    fn test_session_json_round_trip() {
        let mut s = session_with_entries();
        s.set_goals(DailyGoals {
            calories: Some(1800.0),
            ..DailyGoals::default()
        })
        .unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
