use chrono::NaiveDate;
use tracing::trace;

use super::LineItem;

/// Line items that share one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub items: Vec<LineItem>,
}

/// Groups consecutive items of the same day. `items` are expected to be sorted by day, an
/// unsorted input produces one group per run of equal days.
pub fn group_by_day(items: Vec<LineItem>) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = vec![];

    for item in items {
        match groups.last_mut() {
            Some(group) if group.day == item.day => group.items.push(item),
            Some(_) | None => {
                trace!("Starting group {}", item.day);
                groups.push(DayGroup {
                    day: item.day,
                    items: vec![item],
                })
            }
        }
    }

    groups
}
