use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::LogEntry;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub entries: Vec<LogEntry>,
}

/// Calendar days, newest first; entries inside a day in time order.
pub fn build_days(entries: &[LogEntry]) -> Vec<TimelineDay> {
    let mut days: BTreeMap<NaiveDate, Vec<LogEntry>> = BTreeMap::new();
    for entry in entries {
        days.entry(entry.timestamp.date_naive())
            .or_default()
            .push(entry.clone());
    }
    days.into_iter()
        .rev()
        .map(|(date, mut entries)| {
            entries.sort_by_key(|e| e.timestamp);
            TimelineDay { date, entries }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportSpec {
    pub row_height: f64,
    pub viewport_height: f64,
    pub scroll_offset: f64,
    #[serde(default = "default_overscan")]
    pub overscan: usize,
}

fn default_overscan() -> usize {
    3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

/// Rows to render for a fixed-height virtual list: the rows intersecting the
/// viewport widened by `overscan` on both sides. `end` is exclusive.
pub fn visible_range(total_rows: usize, spec: &ViewportSpec) -> VisibleRange {
    if total_rows == 0 || spec.row_height <= 0.0 {
        return VisibleRange { start: 0, end: 0 };
    }
    let offset = spec.scroll_offset.max(0.0);
    let first = (offset / spec.row_height).floor() as usize;
    let last = ((offset + spec.viewport_height.max(0.0)) / spec.row_height).ceil() as usize;
    let start = first.saturating_sub(spec.overscan).min(total_rows);
    let end = last.saturating_add(spec.overscan).min(total_rows);
    VisibleRange {
        start,
        end: end.max(start),
    }
}
