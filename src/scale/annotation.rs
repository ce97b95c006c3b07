use std::collections::HashSet;

use super::{LineEndpoints, ScalePass, ScaledGeometry};
use crate::geometry::{Point, Ratio, Rect};
use crate::model::{AnnotationDetail, WidgetId, WidgetKind};

impl ScalePass<'_> {
    /// Places annotation markers, connector lines and rectangles relative to
    /// their anchor's scaled geometry. Runs last so anchors are final.
    pub(super) fn reposition_annotations(&mut self) {
        let mut placed = HashSet::new();
        let annotations: Vec<(WidgetId, AnnotationDetail)> = self
            .dashboard
            .iter()
            .filter_map(|(id, widget)| widget.annotation().map(|detail| (id, *detail)))
            .collect();

        for (id, detail) in annotations {
            let Some(anchor) = detail.anchor else {
                continue;
            };
            let Some(anchor_rect) = self.rect(anchor) else {
                continue;
            };
            let anchor_source = self.dashboard.widget(anchor).source_rect();
            // Parts of a shrink-to-fit table still move with the table, but
            // their offsets from it stay at design size.
            let local = self.anchor_ratio(anchor, anchor_source, anchor_rect);

            for part in [Some(id), detail.line, detail.rectangle].into_iter().flatten() {
                let source = self.dashboard.widget(part).source_rect();
                let offset = Point::new(source.x - anchor_source.x, source.y - anchor_source.y);
                let scaled = local.scale_point(offset);
                let position = anchor_rect.position().offset(scaled.x, scaled.y);
                let mut geometry = self.part_geometry(part, position);
                if Some(part) == detail.rectangle {
                    geometry.position = self.keep_in_viewport(geometry.rect());
                }
                self.store(part, geometry);
                placed.insert(part);
            }
        }

        let unplaced: Vec<WidgetId> = self
            .dashboard
            .iter()
            .filter(|(id, widget)| widget.kind.is_annotation_part() && !placed.contains(id))
            .map(|(id, _)| id)
            .collect();
        for part in unplaced {
            let source = self.dashboard.widget(part).source_rect();
            let geometry = self.part_geometry(part, self.ratio.scale_point(source.position()));
            self.store(part, geometry);
        }
    }

    /// How much the anchor itself was scaled, per axis. Shrink-to-fit tables
    /// size themselves from data, so their parts keep design offsets.
    fn anchor_ratio(&self, anchor: WidgetId, source: Rect, scaled: Rect) -> Ratio {
        let shrink_to_fit = self
            .dashboard
            .widget(anchor)
            .table()
            .is_some_and(|table| table.shrink_to_fit);
        if shrink_to_fit {
            return Ratio::IDENTITY;
        }
        let axis = |scaled: i32, source: i32| {
            if source == 0 {
                1.0
            } else {
                f64::from(scaled) / f64::from(source)
            }
        };
        Ratio::new(
            axis(scaled.width, source.width),
            axis(scaled.height, source.height),
        )
    }

    /// Annotation parts keep their design size; connector lines keep their
    /// endpoints.
    fn part_geometry(&self, part: WidgetId, position: Point) -> ScaledGeometry {
        let widget = self.dashboard.widget(part);
        let mut geometry = ScaledGeometry::new(position, widget.source_rect().size().clamped());
        if widget.kind == WidgetKind::AnnotationLine {
            geometry.line = widget.line().map(|line| LineEndpoints {
                start: line.start,
                end: line.end,
            });
        }
        geometry
    }

    fn keep_in_viewport(&self, rect: Rect) -> Point {
        let mut x = rect.x.min(self.viewport.width - rect.width);
        let mut y = rect.y;
        if let Some(height) = self.viewport.height {
            y = y.min(height - rect.height);
        }
        x = x.max(0);
        y = y.max(0);
        Point::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ScaleConfig;
    use crate::geometry::{Point, Size};
    use crate::model::{
        AnnotationDetail, Dashboard, LineDetail, TableDetail, Widget, WidgetDetail, WidgetId,
        WidgetKind,
    };
    use crate::scale::{NoColumnMetadata, ScaleOutput, Viewport, scale_dashboard};

    fn add(dashboard: &mut Dashboard, widget: Widget) -> WidgetId {
        dashboard.add_widget(widget).unwrap()
    }

    fn run(dashboard: &Dashboard, width: i32) -> ScaleOutput {
        scale_dashboard(
            dashboard,
            &Viewport::new(width, None),
            &ScaleConfig::default(),
            &NoColumnMetadata,
        )
    }

    /// A chart at (200, 200) with a marker, connector and callout box.
    fn annotated(anchor: Widget) -> Dashboard {
        let mut dashboard = Dashboard::new();
        add(
            &mut dashboard,
            Widget::new("page", WidgetKind::Other, Point::ORIGIN, Size::new(1000, 1000)),
        );
        let anchor = add(&mut dashboard, anchor);
        let marker = add(
            &mut dashboard,
            Widget::new("note", WidgetKind::Annotation, Point::new(300, 300), Size::new(10, 10)),
        );
        let line = add(
            &mut dashboard,
            Widget::new("note_line", WidgetKind::AnnotationLine, Point::new(300, 240), Size::new(60, 60))
                .with_detail(WidgetDetail::Line(LineDetail {
                    start: Point::new(0, 60),
                    end: Point::new(60, 0),
                    ..Default::default()
                })),
        );
        let rectangle = add(
            &mut dashboard,
            Widget::new("note_box", WidgetKind::AnnotationRectangle, Point::new(360, 200), Size::new(120, 40)),
        );
        dashboard
            .link_annotation(
                marker,
                AnnotationDetail {
                    anchor: Some(anchor),
                    line: Some(line),
                    rectangle: Some(rectangle),
                },
            )
            .unwrap();
        dashboard
    }

    #[test]
    fn parts_follow_scaled_anchor() {
        let dashboard = annotated(Widget::new(
            "chart",
            WidgetKind::Chart,
            Point::new(200, 200),
            Size::new(400, 400),
        ));
        let output = run(&dashboard, 500);
        let chart = output.get("chart").unwrap();
        assert_eq!(chart.position, Point::new(100, 100));

        let marker = output.get("note").unwrap();
        assert_eq!(marker.position, Point::new(150, 150));
        assert_eq!(marker.size, Size::new(10, 10));

        let line = output.get("note_line").unwrap();
        assert_eq!(line.position, Point::new(150, 120));
        let endpoints = line.line.unwrap();
        assert_eq!(endpoints.start, Point::new(0, 60));
        assert_eq!(endpoints.end, Point::new(60, 0));

        let rectangle = output.get("note_box").unwrap();
        assert_eq!(rectangle.position, Point::new(180, 100));
        assert_eq!(rectangle.size, Size::new(120, 40));
    }

    #[test]
    fn shrink_to_fit_anchor_keeps_design_offsets() {
        let dashboard = annotated(
            Widget::new("grid", WidgetKind::Table, Point::new(200, 200), Size::new(400, 400))
                .with_detail(WidgetDetail::Table(TableDetail {
                    shrink_to_fit: true,
                    ..Default::default()
                })),
        );
        let output = run(&dashboard, 500);
        let grid = output.get("grid").unwrap();
        let marker = output.get("note").unwrap();
        assert_eq!(marker.position, grid.position.offset(100, 100));
    }

    #[test]
    fn rectangle_stays_inside_viewport() {
        let mut dashboard = annotated(Widget::new(
            "chart",
            WidgetKind::Chart,
            Point::new(200, 200),
            Size::new(400, 400),
        ));
        let id = dashboard.id_of("note_box").unwrap();
        dashboard.widget_mut(id).design_position = Point::new(900, -400);
        let output = run(&dashboard, 500);
        let rectangle = output.get("note_box").unwrap();
        assert_eq!(rectangle.position, Point::new(500 - 120, 0));
    }

    #[test]
    fn unlinked_parts_scale_position_only() {
        let mut dashboard = Dashboard::new();
        add(
            &mut dashboard,
            Widget::new("page", WidgetKind::Other, Point::ORIGIN, Size::new(1000, 1000)),
        );
        add(
            &mut dashboard,
            Widget::new("stray", WidgetKind::AnnotationRectangle, Point::new(400, 600), Size::new(80, 20)),
        );
        let output = run(&dashboard, 500);
        let stray = output.get("stray").unwrap();
        assert_eq!(stray.position, Point::new(200, 300));
        assert_eq!(stray.size, Size::new(80, 20));
    }
}
