use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use super::{ScalePass, ScaledGeometry};
use crate::model::{Column, Widget, WidgetId};

#[derive(Debug, Error)]
pub enum ColumnMetadataError {
    #[error("column metadata unavailable for {path}: {reason}")]
    Unavailable { path: String, reason: String },
}

/// Supplies rendered column widths for table-like widgets whose design does
/// not carry them. Implementations typically consult a data cache.
pub trait ColumnMetadataProvider {
    /// `Ok(None)` means the widths are not known yet.
    fn column_widths(
        &self,
        path: &str,
        widget: &Widget,
    ) -> Result<Option<Vec<i32>>, ColumnMetadataError>;
}

/// Provider for callers without a data layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoColumnMetadata;

impl ColumnMetadataProvider for NoColumnMetadata {
    fn column_widths(
        &self,
        _path: &str,
        _widget: &Widget,
    ) -> Result<Option<Vec<i32>>, ColumnMetadataError> {
        Ok(None)
    }
}

impl ColumnMetadataProvider for HashMap<String, Vec<i32>> {
    fn column_widths(
        &self,
        path: &str,
        _widget: &Widget,
    ) -> Result<Option<Vec<i32>>, ColumnMetadataError> {
        Ok(self.get(path).cloned())
    }
}

/// Spreads `target` over the visible columns in proportion to their design
/// widths. Hidden columns get zero; the last visible column takes whatever
/// flooring left over so the visible widths add up to `target`.
pub fn distribute_column_widths(columns: &[Column], target: i32) -> Vec<i32> {
    let target = target.max(0);
    let mut widths = vec![0; columns.len()];
    let visible: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, column)| !column.hidden)
        .map(|(idx, _)| idx)
        .collect();
    let Some((&last, leading)) = visible.split_last() else {
        return widths;
    };

    let total: i64 = visible
        .iter()
        .map(|&idx| i64::from(columns[idx].width.max(0)))
        .sum();
    let mut used = 0;
    for &idx in leading {
        let width = if total > 0 {
            (i64::from(target) * i64::from(columns[idx].width.max(0)) / total) as i32
        } else {
            target / visible.len() as i32
        };
        let width = width.clamp(0, target - used);
        widths[idx] = width;
        used += width;
    }
    widths[last] = target - used;
    widths
}

/// Spreads `target` again over widths that were already scaled once, using
/// them as the design weights. Hidden flags come from the table's stored
/// columns when it has any.
pub(super) fn respread_column_widths(
    widths: &[i32],
    widget: Option<&Widget>,
    target: i32,
) -> Vec<i32> {
    let stored = widget
        .and_then(Widget::table)
        .map(|table| table.columns.as_slice())
        .unwrap_or_default();
    let columns: Vec<Column> = widths
        .iter()
        .enumerate()
        .map(|(idx, &width)| {
            if stored.get(idx).is_some_and(|column| column.hidden) {
                Column::hidden(width)
            } else {
                Column::new(width)
            }
        })
        .collect();
    distribute_column_widths(&columns, target)
}

impl ScalePass<'_> {
    /// Design columns of a table: stored widths, then the provider, then the
    /// configured default for every counted column.
    fn design_columns(&self, id: WidgetId) -> Vec<Column> {
        let widget = self.dashboard.widget(id);
        let Some(table) = widget.table() else {
            return Vec::new();
        };
        if !table.columns.is_empty() {
            return table.columns.clone();
        }
        let path = self.path(id);
        match self.provider.column_widths(&path, widget) {
            Ok(Some(widths)) => return widths.into_iter().map(Column::new).collect(),
            Ok(None) => {}
            Err(err) => {
                warn!(widget = %path, error = %err, "falling back to default column width");
            }
        }
        vec![Column::new(self.config.default_column_width); table.column_count]
    }

    pub(super) fn scale_columns(&self, id: WidgetId, geometry: &mut ScaledGeometry) {
        let columns = self.design_columns(id);
        geometry.column_widths = if columns.is_empty() {
            None
        } else {
            Some(distribute_column_widths(&columns, geometry.size.width))
        };
    }
}
