//! Per-column summary statistics.

use std::collections::HashSet;

use serde::Serialize;

use crate::frame::{CellValue, Column, DataType, Frame};

/// Basic statistics for one column.
///
/// Numeric columns carry `min`, `max` and `mean`; string columns carry
/// `unique_count` (distinct non-null values). All columns report their type
/// and null count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    #[serde(rename = "type")]
    pub dtype: DataType,
    pub null_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<CellValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<CellValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_count: Option<usize>,
}

impl ColumnStats {
    pub fn compute(column: &Column) -> Self {
        let mut stats = Self {
            dtype: column.dtype(),
            null_count: column.null_count(),
            min: None,
            max: None,
            mean: None,
            unique_count: None,
        };

        match column.dtype() {
            dtype if dtype.is_numeric() => {
                let present: Vec<&CellValue> =
                    column.values().iter().filter(|v| !v.is_null()).collect();
                stats.min = extreme(&present, |a, b| a < b);
                stats.max = extreme(&present, |a, b| a > b);
                if !present.is_empty() {
                    let sum: f64 = present.iter().filter_map(|v| v.as_f64()).sum();
                    stats.mean = Some(sum / present.len() as f64);
                }
            }
            DataType::String => {
                let distinct: HashSet<&str> = column
                    .values()
                    .iter()
                    .filter_map(|v| match v {
                        CellValue::Text(s) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect();
                stats.unique_count = Some(distinct.len());
            }
            _ => {}
        }

        stats
    }
}

/// Statistics for every column of a frame, in column order
pub fn frame_stats(frame: &Frame) -> Vec<(String, ColumnStats)> {
    frame
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), ColumnStats::compute(c)))
        .collect()
}

fn extreme(values: &[&CellValue], better: impl Fn(f64, f64) -> bool) -> Option<CellValue> {
    let mut best: Option<(&CellValue, f64)> = None;
    for value in values {
        let Some(n) = value.as_f64() else { continue };
        match best {
            Some((_, current)) if !better(n, current) => {}
            _ => best = Some((*value, n)),
        }
    }
    best.map(|(v, _)| v.clone())
}
