use super::EdgeSummary;
use crate::config::ScaleConfig;
use crate::geometry::Rect;
use crate::model::{Dashboard, Widget, WidgetId, WidgetKind};

/// Extremal widgets of a dashboard and the margin to keep free for
/// scrollbars that may appear at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeBounds {
    pub right_most: WidgetId,
    pub bottom_most: WidgetId,
    pub left_most: WidgetId,
    pub top_most: WidgetId,
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl EdgeBounds {
    pub fn extent(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.right - self.left,
            self.bottom - self.top,
        )
    }

    pub fn summary(&self, dashboard: &Dashboard) -> EdgeSummary {
        let name = |id: WidgetId| dashboard.widget(id).name.clone();
        EdgeSummary {
            right_most: name(self.right_most),
            bottom_most: name(self.bottom_most),
            left_most: name(self.left_most),
            top_most: name(self.top_most),
            extent: self.extent(),
            offset_x: self.offset_x,
            offset_y: self.offset_y,
        }
    }
}

/// Widgets that take part in the canvas extent. Selection container members
/// live inside their container, annotations float above the canvas and
/// floating widgets are pinned to the origin later.
pub(super) fn is_canvas_widget(dashboard: &Dashboard, id: WidgetId) -> bool {
    let widget = dashboard.widget(id);
    widget.visible
        && !widget.kind.is_annotation_part()
        && !dashboard.is_effectively_floating(id)
        && !dashboard.in_selection_container(id)
}

pub fn find_bounding_edges(
    dashboard: &Dashboard,
    config: &ScaleConfig,
    mobile: bool,
) -> Option<EdgeBounds> {
    let mut bounds: Option<EdgeBounds> = None;
    for (id, widget) in dashboard.iter() {
        if !is_canvas_widget(dashboard, id) {
            continue;
        }
        let rect = padded_rect(widget, config, mobile);
        let Some(current) = bounds.as_mut() else {
            bounds = Some(EdgeBounds {
                right_most: id,
                bottom_most: id,
                left_most: id,
                top_most: id,
                left: rect.x,
                top: rect.y,
                right: rect.right(),
                bottom: rect.bottom(),
                offset_x: 0,
                offset_y: 0,
            });
            continue;
        };
        if rect.right() > current.right {
            current.right = rect.right();
            current.right_most = id;
        }
        if rect.bottom() > current.bottom {
            current.bottom = rect.bottom();
            current.bottom_most = id;
        }
        if rect.x < current.left {
            current.left = rect.x;
            current.left_most = id;
        }
        if rect.y < current.top {
            current.top = rect.y;
            current.top_most = id;
        }
    }

    let mut bounds = bounds?;
    bounds.offset_x = edge_offset(dashboard.widget(bounds.right_most).kind, config, mobile);
    bounds.offset_y = edge_offset(dashboard.widget(bounds.bottom_most).kind, config, mobile);
    Some(bounds)
}

/// Source rectangle grown by the room runtime scrollbars need.
fn padded_rect(widget: &Widget, config: &ScaleConfig, mobile: bool) -> Rect {
    let rect = widget.source_rect();
    match widget.kind {
        kind if kind == WidgetKind::Chart || kind.is_table_like() => {
            rect.pad(config.table_edge_padding, config.table_edge_padding)
        }
        WidgetKind::TimeSlider => rect.pad(config.time_slider_edge_padding, 0),
        WidgetKind::EmbeddedDashboard => {
            let Some(sub) = widget
                .embedded()
                .and_then(|sub| find_bounding_edges(sub, config, mobile))
            else {
                return rect;
            };
            Rect {
                width: rect.width.max(sub.right),
                height: rect.height.max(sub.bottom),
                ..rect
            }
        }
        _ => rect,
    }
}

fn edge_offset(kind: WidgetKind, config: &ScaleConfig, mobile: bool) -> i32 {
    if kind.is_data_widget() {
        config.data_offset_for(mobile)
    } else if kind.is_control() {
        config.control_offset
    } else {
        0
    }
}
