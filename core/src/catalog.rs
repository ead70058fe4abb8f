use crate::models::FoodRecord;

/// Case-insensitive substring match on the food name, keeping catalog order.
///
/// A blank query places no constraint and returns every record.
#[must_use]
pub fn search<'a>(foods: &'a [FoodRecord], query: &str) -> Vec<&'a FoodRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return foods.iter().collect();
    }
    foods
        .iter()
        .filter(|f| f.name.to_lowercase().contains(&needle))
        .collect()
}

/// Records whose name equals `name` ignoring case and surrounding whitespace.
#[must_use]
pub fn exact_matches<'a>(foods: &'a [FoodRecord], name: &str) -> Vec<&'a FoodRecord> {
    let wanted = name.trim().to_lowercase();
    foods
        .iter()
        .filter(|f| f.name.trim().to_lowercase() == wanted)
        .collect()
}
