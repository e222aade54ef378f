use serde::{Deserialize, Serialize};

use crate::sanitize::truncate;

pub const MAX_ID_LEN: usize = 64;
pub const MAX_DATE_LEN: usize = 32;
pub const MAX_TIME_LEN: usize = 5;
pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DAYS: usize = 366;
pub const MAX_ITEMS_PER_DAY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub name: String,
}

impl ItineraryItem {
    /// Builds an item with every field cut to its storage length.
    pub fn sanitized(id: &str, activity_id: Option<&str>, time: &str, name: &str) -> Self {
        Self {
            id: truncate(id, MAX_ID_LEN),
            activity_id: activity_id
                .map(|a| truncate(a, MAX_ID_LEN))
                .filter(|a| !a.is_empty()),
            time: truncate(time, MAX_TIME_LEN),
            name: truncate(name, MAX_NAME_LEN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub items: Vec<ItineraryItem>,
}

impl ItineraryDay {
    pub fn sanitized(id: &str, date: &str, items: Vec<ItineraryItem>) -> Self {
        Self {
            id: truncate(id, MAX_ID_LEN),
            date: truncate(date, MAX_DATE_LEN),
            items: items.into_iter().take(MAX_ITEMS_PER_DAY).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_truncation() {
        let long_id = "x".repeat(100);
        let item = ItineraryItem::sanitized(&long_id, Some(""), "09:30 AM", "Louvre");
        assert_eq!(item.id.len(), MAX_ID_LEN);
        assert_eq!(item.time, "09:30");
        assert_eq!(item.activity_id, None);
        assert_eq!(item.name, "Louvre");
    }

    #[test]
    fn test_day_caps_items() {
        let items = (0..150)
            .map(|i| ItineraryItem::sanitized(&i.to_string(), None, "10:00", "x"))
            .collect();
        let day = ItineraryDay::sanitized("day-1", "2025-06-10T00:00:00.000Z-extra-junk", items);
        assert_eq!(day.items.len(), MAX_ITEMS_PER_DAY);
        assert_eq!(day.date.chars().count(), MAX_DATE_LEN);
    }
}
