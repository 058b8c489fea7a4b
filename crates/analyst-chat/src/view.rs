//! Result views: how an executed result set is offered for inspection.
//!
//! A view is computed from the result alone and never feeds back into the
//! conversation.

use serde::Serialize;
use serde_json::Value;

use analyst_core::types::ExecutionResult;

/// One tab of a multi-row result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultTab {
    Data,
    LineChart,
    BarChart,
}

/// Presentation chosen for a result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultView {
    /// Zero or one row: a plain table.
    Table,
    /// Several rows: data plus line and bar charts over `series`.
    Tabs {
        tabs: Vec<ResultTab>,
        /// Column used as the chart index; `None` means row position.
        index: Option<String>,
        series: Vec<ChartSeries>,
    },
}

/// A plottable column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    /// `(index label, value)` pairs; null cells are left out.
    pub points: Vec<(String, f64)>,
}

impl ResultView {
    pub fn for_result(result: &ExecutionResult) -> Self {
        if result.rows.len() <= 1 {
            return ResultView::Table;
        }

        let index = if result.columns.len() > 1 {
            result.columns.first().cloned()
        } else {
            None
        };

        ResultView::Tabs {
            tabs: vec![ResultTab::Data, ResultTab::LineChart, ResultTab::BarChart],
            index,
            series: chart_series(result),
        }
    }

    pub fn is_tabbed(&self) -> bool {
        matches!(self, ResultView::Tabs { .. })
    }
}

/// Numeric columns of `result`, keyed by the first column when there is more
/// than one column and by row position otherwise.
pub fn chart_series(result: &ExecutionResult) -> Vec<ChartSeries> {
    let indexed = result.columns.len() > 1;
    let first_value_column = usize::from(indexed);

    let labels: Vec<String> = result
        .rows
        .iter()
        .enumerate()
        .map(|(pos, row)| {
            if indexed {
                row.first().map(label).unwrap_or_default()
            } else {
                pos.to_string()
            }
        })
        .collect();

    let mut series = Vec::new();
    for (col, name) in result.columns.iter().enumerate().skip(first_value_column) {
        let cells: Vec<&Value> = result
            .rows
            .iter()
            .map(|row| row.get(col).unwrap_or(&Value::Null))
            .collect();

        let numeric = cells
            .iter()
            .all(|cell| cell.is_null() || as_number(cell).is_some());
        if !numeric {
            continue;
        }

        let points = labels
            .iter()
            .zip(cells)
            .filter_map(|(label, cell)| as_number(cell).map(|v| (label.clone(), v)))
            .collect();
        series.push(ChartSeries {
            name: name.clone(),
            points,
        });
    }
    series
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn label(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
