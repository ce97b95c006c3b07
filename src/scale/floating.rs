use tracing::debug;

use super::table::respread_column_widths;
use super::{LineEndpoints, ScalePass, ScaledGeometry};
use crate::geometry::{Point, Ratio, scale_floor};
use crate::model::WidgetId;

impl ScaledGeometry {
    /// Shrinks around `origin`, keeping relative placement.
    fn shrink_about(&mut self, origin: Point, factor: f64) {
        let ratio = Ratio::uniform(factor);
        self.position = Point::new(
            origin.x + scale_floor(self.position.x - origin.x, factor),
            origin.y + scale_floor(self.position.y - origin.y, factor),
        );
        self.size = ratio.scale_size(self.size);
        if let Some(line) = self.line {
            self.line = Some(LineEndpoints {
                start: ratio.scale_point(line.start),
                end: ratio.scale_point(line.end),
            });
        }
        if let Some(list_height) = self.list_height {
            self.list_height = Some(scale_floor(list_height, factor).max(0));
        }
    }
}

impl ScalePass<'_> {
    /// Floating widgets without a container are pinned to the top-left corner.
    /// Floating members of containers move with their container instead.
    pub(super) fn place_floating(&mut self) {
        let floating: Vec<WidgetId> = self
            .dashboard
            .roots()
            .filter(|id| {
                let widget = self.dashboard.widget(*id);
                widget.floating && !widget.kind.is_annotation_part()
            })
            .collect();
        for id in floating {
            self.fit_floating(id);
        }
    }

    pub(super) fn fit_floating(&mut self, id: WidgetId) {
        let Some(rect) = self.rect(id) else {
            return;
        };
        if rect.width > self.viewport.width {
            let available = f64::from(self.viewport.width - self.config.floating_margin);
            let factor = (available / f64::from(rect.width)).max(0.0);
            debug!(
                widget = %self.path(id),
                width = rect.width,
                viewport_width = self.viewport.width,
                factor,
                "shrinking floating widget"
            );
            self.shrink_subtree(id, rect.position(), factor);
        }
        self.translate_subtree(id, -rect.x, -rect.y);
    }

    fn shrink_subtree(&mut self, id: WidgetId, origin: Point, factor: f64) {
        if let Some(mut geometry) = self.get(id).cloned() {
            geometry.shrink_about(origin, factor);
            if self.dashboard.widget(id).table().is_some() {
                self.scale_columns(id, &mut geometry);
            }
            self.store(id, geometry);
        }
        let dashboard = self.dashboard;
        let embedded = dashboard.widget(id).embedded();
        if let Some(nested) = self.nested.get_mut(&id) {
            for (path, geometry) in nested.widgets.iter_mut() {
                geometry.shrink_about(origin, factor);
                if let Some(widths) = geometry.column_widths.take() {
                    let table = embedded.and_then(|sub| sub.resolve(path));
                    geometry.column_widths =
                        Some(respread_column_widths(&widths, table, geometry.size.width));
                }
            }
        }
        for &member in dashboard.widget(id).members() {
            self.shrink_subtree(member, origin, factor);
        }
    }
}
