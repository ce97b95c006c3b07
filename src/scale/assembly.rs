use super::{LineEndpoints, ScalePass, ScaledGeometry, scale_nested};
use crate::geometry::{Point, Ratio, Rect, bounding_box, scale_floor};
use crate::model::{WidgetId, WidgetKind};

/// Where a widget sits relative to the container that scales it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Placement {
    Free,
    /// Tab members share the tab's origin below the tab bar.
    InTab {
        origin: Point,
        tab_width: i32,
        repair_height: f64,
    },
    /// Selection container members share the container's x and width and
    /// follow it by `dy` when the container was moved off its scaled y.
    InSelection { x: i32, width: i32, dy: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScaleRule {
    Generic,
    Table,
    Line,
    Tab,
    SelectionContainer,
    Group,
    Embedded,
}

fn rule_for(kind: WidgetKind) -> ScaleRule {
    match kind {
        WidgetKind::Table | WidgetKind::Crosstab | WidgetKind::CalcTable => ScaleRule::Table,
        WidgetKind::Line => ScaleRule::Line,
        WidgetKind::Tab => ScaleRule::Tab,
        WidgetKind::CurrentSelectionContainer => ScaleRule::SelectionContainer,
        WidgetKind::GroupContainer => ScaleRule::Group,
        WidgetKind::EmbeddedDashboard => ScaleRule::Embedded,
        WidgetKind::Chart
        | WidgetKind::SelectionList
        | WidgetKind::SelectionTree
        | WidgetKind::TimeSlider
        | WidgetKind::Calendar
        | WidgetKind::ListInput
        | WidgetKind::Shape
        | WidgetKind::Annotation
        | WidgetKind::AnnotationLine
        | WidgetKind::AnnotationRectangle
        | WidgetKind::Other => ScaleRule::Generic,
    }
}

impl ScalePass<'_> {
    pub(super) fn scale_roots(&mut self) {
        let roots: Vec<WidgetId> = self.dashboard.roots().collect();
        for id in roots {
            if self.dashboard.widget(id).kind.is_annotation_part() {
                continue;
            }
            self.scale_widget(id, Placement::Free, false);
        }
    }

    /// Scales one widget and, for containers, everything it holds.
    /// `overlap` lets fixed-height controls scale vertically.
    pub(super) fn scale_widget(&mut self, id: WidgetId, placement: Placement, overlap: bool) {
        let rule = rule_for(self.dashboard.widget(id).kind);
        if rule == ScaleRule::Group {
            self.scale_group(id, placement);
            return;
        }

        let mut geometry = self.base_geometry(id, placement, overlap);
        match rule {
            ScaleRule::Table => self.scale_columns(id, &mut geometry),
            ScaleRule::Line => self.scale_line(id, &mut geometry),
            _ => {}
        }
        if let Some(drop_down) = self.dashboard.widget(id).drop_down() {
            let ratio = self.ratio_for(id);
            geometry.list_height = Some(scale_floor(drop_down.list_height, ratio.y).max(0));
        }
        self.store(id, geometry);

        match rule {
            ScaleRule::Tab => self.scale_tab_members(id),
            ScaleRule::SelectionContainer => self.scale_selection_members(id),
            ScaleRule::Embedded => self.scale_embedded(id, placement),
            _ => {}
        }
    }

    fn base_geometry(&self, id: WidgetId, placement: Placement, overlap: bool) -> ScaledGeometry {
        let widget = self.dashboard.widget(id);
        let source = widget.source_rect();
        let ratio = self.ratio_for(id);
        let fixed_height = widget.kind.has_fixed_height() && !overlap;

        // A kept height never moves the top edge off `floor(y * ratio.y)`.
        let mut position = ratio.scale_point(source.position());
        let mut size = ratio.scale_size(source.size());
        if fixed_height {
            size.height = source.height.max(0);
        }

        match placement {
            Placement::Free => {}
            Placement::InTab {
                origin,
                repair_height,
                ..
            } => {
                position = origin;
                if !fixed_height {
                    let height = f64::from(source.height) * ratio.y + repair_height;
                    size.height = (height.floor() as i32).max(0);
                }
            }
            Placement::InSelection { x, width, dy } => {
                position.x = x;
                position.y += dy;
                size.width = width.max(0);
            }
        }
        ScaledGeometry::new(position, size)
    }

    fn scale_line(&self, id: WidgetId, geometry: &mut ScaledGeometry) {
        let widget = self.dashboard.widget(id);
        let Some(line) = widget.line() else {
            return;
        };
        let mut ratio = self.ratio_for(id);
        if geometry.size.height == 0 {
            // A flattened line keeps its thickness and its endpoints' y.
            geometry.size.height = widget.source_rect().height.max(0);
            ratio = Ratio::new(ratio.x, 1.0);
        }
        geometry.line = Some(LineEndpoints {
            start: ratio.scale_point(line.start),
            end: ratio.scale_point(line.end),
        });
    }

    fn scale_tab_members(&mut self, tab: WidgetId) {
        let Some(tab_geometry) = self.get(tab).cloned() else {
            return;
        };
        let dashboard = self.dashboard;
        let widget = dashboard.widget(tab);
        let design_height = f64::from(widget.source_rect().height);
        let placement = Placement::InTab {
            origin: Point::new(
                tab_geometry.position.x,
                tab_geometry.position.y + tab_geometry.size.height,
            ),
            tab_width: tab_geometry.size.width,
            repair_height: design_height * self.ratio_for(tab).y - design_height,
        };
        for &member in widget.members() {
            if dashboard.widget(member).kind.is_annotation_part() {
                continue;
            }
            self.scale_widget(member, placement, false);
        }
    }

    fn scale_selection_members(&mut self, container: WidgetId) {
        let Some(container_rect) = self.rect(container) else {
            return;
        };
        let dashboard = self.dashboard;
        let source_y = dashboard.widget(container).source_rect().y;
        let placement = Placement::InSelection {
            x: container_rect.x,
            width: container_rect.width,
            dy: container_rect.y - scale_floor(source_y, self.ratio_for(container).y),
        };
        let min_row_height = self.config.min_row_height;
        for &member in dashboard.widget(container).members() {
            let widget = dashboard.widget(member);
            if widget.kind.is_annotation_part() {
                continue;
            }
            self.scale_widget(member, placement, false);

            if !widget.drop_down().is_some_and(|detail| detail.drop_down) {
                continue;
            }
            let ratio = self.ratio_for(member);
            let source_height = widget.source_rect().height.max(0);
            let Some(geometry) = self.get_mut(member) else {
                continue;
            };
            if geometry.size.height < min_row_height {
                // Collapsed drop-downs keep their title row; the ratio is kept
                // so expanding can size the list later.
                geometry.size.height = source_height;
                geometry.drop_down_ratio = Some(ratio);
            }
        }
    }

    /// Groups take the bounding box of their scaled members. Inside a tab the
    /// group, members included, moves so its top-left edge sits at the tab
    /// origin.
    fn scale_group(&mut self, id: WidgetId, placement: Placement) {
        let members: Vec<WidgetId> = self
            .dashboard
            .widget(id)
            .members()
            .iter()
            .copied()
            .filter(|member| !self.dashboard.widget(*member).kind.is_annotation_part())
            .collect();
        for &member in &members {
            self.scale_widget(member, Placement::Free, false);
        }
        let rect = self
            .group_bounds(&members)
            .unwrap_or_else(|| self.base_geometry(id, Placement::Free, false).rect());
        self.store(id, ScaledGeometry::new(rect.position(), rect.size()));

        match placement {
            Placement::Free => {}
            Placement::InTab { origin, .. } => {
                self.translate_subtree(id, origin.x - rect.x, origin.y - rect.y);
            }
            Placement::InSelection { x, dy, .. } => {
                self.translate_subtree(id, x - rect.x, dy);
            }
        }
    }

    fn group_bounds(&self, members: &[WidgetId]) -> Option<Rect> {
        bounding_box(members.iter().filter_map(|member| self.rect(*member)))
    }

    /// Recomputes the boxes of the groups enclosing `id` after it changed.
    pub(super) fn refresh_enclosing_groups(&mut self, id: WidgetId) {
        let groups: Vec<WidgetId> = self
            .dashboard
            .ancestors(id)
            .take_while(|ancestor| self.dashboard.widget(*ancestor).kind == WidgetKind::GroupContainer)
            .collect();
        for group in groups {
            let members: Vec<WidgetId> = self.dashboard.widget(group).members().to_vec();
            let Some(rect) = self.group_bounds(&members) else {
                continue;
            };
            if let Some(geometry) = self.get_mut(group) {
                geometry.position = rect.position();
                geometry.size = rect.size();
            }
        }
    }

    fn scale_embedded(&mut self, id: WidgetId, placement: Placement) {
        let dashboard = self.dashboard;
        let widget = dashboard.widget(id);
        let (Some(sub), Some(rect)) = (widget.embedded(), self.rect(id)) else {
            return;
        };
        let width = match placement {
            Placement::InTab { tab_width, .. } => tab_width,
            _ => rect.width,
        };
        let viewport = self.viewport.nested(width, rect.height);
        let prefix = format!("{}{}.", self.prefix, widget.name);
        let mut output = scale_nested(sub, &viewport, self.config, self.provider, &prefix);
        output.translate(rect.x, rect.y);
        self.nested.insert(id, output);
    }
}
