//! Runtime scaling of a dashboard onto a viewport.
//!
//! A pass borrows the dashboard immutably and produces a [`ScaleOutput`];
//! nothing in the tree changes until [`Dashboard::apply`] is called. The
//! stages run in a fixed order: bounding edges, scale ratio, per-widget
//! scaling, floating placement, overlap correction, annotations.

mod annotation;
mod assembly;
mod bounds;
mod floating;
mod overlap;
mod ratio;
mod table;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

pub use bounds::{EdgeBounds, find_bounding_edges};
pub use ratio::{RatioInputs, compute_ratio};
pub use table::{
    ColumnMetadataError, ColumnMetadataProvider, NoColumnMetadata, distribute_column_widths,
};

use crate::config::{ScaleConfig, ViewportConfig, is_mobile_user_agent};
use crate::geometry::{Point, Ratio, Rect, Size};
use crate::model::{Dashboard, PATH_SEPARATOR, WidgetId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    /// Some callers only fix the width; the height then follows the width ratio.
    pub height: Option<i32>,
    pub mobile: bool,
    pub user_agent: Option<String>,
}

impl Viewport {
    pub fn new(width: i32, height: Option<i32>) -> Self {
        Self {
            width,
            height,
            mobile: false,
            user_agent: None,
        }
    }

    pub fn with_mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Mobile devices, or browsers announcing themselves as such, get the
    /// narrower allowances.
    pub fn uses_mobile_allowance(&self) -> bool {
        self.mobile
            || self
                .user_agent
                .as_deref()
                .is_some_and(is_mobile_user_agent)
    }

    fn nested(&self, width: i32, height: i32) -> Self {
        Self {
            width,
            height: Some(height),
            mobile: self.mobile,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl From<&ViewportConfig> for Viewport {
    fn from(config: &ViewportConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            mobile: config.mobile,
            user_agent: config.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineEndpoints {
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledGeometry {
    pub position: Point,
    pub size: Size,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_widths: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineEndpoints>,
    /// Ratio kept for drop-down members that collapse to their title row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_down_ratio: Option<Ratio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_height: Option<i32>,
}

impl ScaledGeometry {
    pub fn new(position: Point, size: Size) -> Self {
        Self {
            position,
            size,
            column_widths: None,
            line: None,
            drop_down_ratio: None,
            list_height: None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_parts(self.position, self.size)
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.position = self.position.offset(dx, dy);
    }
}

/// Names of the extremal widgets and the canvas they span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSummary {
    pub right_most: String,
    pub bottom_most: String,
    pub left_most: String,
    pub top_most: String,
    pub extent: Rect,
    pub offset_x: i32,
    pub offset_y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleOutput {
    pub ratio: Ratio,
    pub bounds: Option<EdgeSummary>,
    /// Keyed by widget path; widgets of embedded dashboards use `outer.inner`.
    pub widgets: BTreeMap<String, ScaledGeometry>,
}

impl ScaleOutput {
    pub fn get(&self, path: &str) -> Option<&ScaledGeometry> {
        self.widgets.get(path)
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        for geometry in self.widgets.values_mut() {
            geometry.translate(dx, dy);
        }
    }
}

/// Runs one complete scaling pass.
pub fn scale_dashboard(
    dashboard: &Dashboard,
    viewport: &Viewport,
    config: &ScaleConfig,
    provider: &dyn ColumnMetadataProvider,
) -> ScaleOutput {
    scale_nested(dashboard, viewport, config, provider, "")
}

/// Scales and writes the result back into the dashboard.
pub fn scale_in_place(
    dashboard: &mut Dashboard,
    viewport: &Viewport,
    config: &ScaleConfig,
    provider: &dyn ColumnMetadataProvider,
) -> ScaleOutput {
    let output = scale_dashboard(dashboard, viewport, config, provider);
    dashboard.apply(&output);
    output
}

fn scale_nested(
    dashboard: &Dashboard,
    viewport: &Viewport,
    config: &ScaleConfig,
    provider: &dyn ColumnMetadataProvider,
    prefix: &str,
) -> ScaleOutput {
    let mobile = viewport.uses_mobile_allowance();
    let bounds = find_bounding_edges(dashboard, config, mobile);
    let ratio = match &bounds {
        Some(bounds) if dashboard.scale_to_screen => {
            compute_ratio(&RatioInputs::collect(dashboard, bounds, viewport, config))
        }
        _ => Ratio::IDENTITY,
    };
    debug!(
        dashboard = prefix,
        ratio_x = ratio.x,
        ratio_y = ratio.y,
        viewport_width = viewport.width,
        viewport_height = ?viewport.height,
        "scale ratio computed"
    );

    let mut pass = ScalePass {
        dashboard,
        viewport,
        config,
        provider,
        ratio,
        prefix: prefix.to_string(),
        geometry: vec![None; dashboard.len()],
        nested: BTreeMap::new(),
    };
    pass.scale_roots();
    pass.place_floating();
    pass.resolve_overlaps();
    pass.reposition_annotations();
    pass.finish(bounds.map(|bounds| bounds.summary(dashboard)))
}

/// Working state of a single pass over one dashboard.
struct ScalePass<'a> {
    dashboard: &'a Dashboard,
    viewport: &'a Viewport,
    config: &'a ScaleConfig,
    provider: &'a dyn ColumnMetadataProvider,
    ratio: Ratio,
    prefix: String,
    geometry: Vec<Option<ScaledGeometry>>,
    nested: BTreeMap<WidgetId, ScaleOutput>,
}

impl ScalePass<'_> {
    fn get(&self, id: WidgetId) -> Option<&ScaledGeometry> {
        self.geometry[id.index()].as_ref()
    }

    fn get_mut(&mut self, id: WidgetId) -> Option<&mut ScaledGeometry> {
        self.geometry[id.index()].as_mut()
    }

    fn rect(&self, id: WidgetId) -> Option<Rect> {
        self.get(id).map(ScaledGeometry::rect)
    }

    fn store(&mut self, id: WidgetId, geometry: ScaledGeometry) {
        self.geometry[id.index()] = Some(geometry);
    }

    fn path(&self, id: WidgetId) -> String {
        format!("{}{}", self.prefix, self.dashboard.widget(id).name)
    }

    /// Floating widgets, and everything inside them, never grow.
    fn ratio_for(&self, id: WidgetId) -> Ratio {
        if self.dashboard.is_effectively_floating(id) {
            self.ratio.capped()
        } else {
            self.ratio
        }
    }

    /// Moves a widget together with its members and embedded contents.
    fn translate_subtree(&mut self, id: WidgetId, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        if let Some(geometry) = self.get_mut(id) {
            geometry.translate(dx, dy);
        }
        if let Some(nested) = self.nested.get_mut(&id) {
            nested.translate(dx, dy);
        }
        let dashboard = self.dashboard;
        for &member in dashboard.widget(id).members() {
            self.translate_subtree(member, dx, dy);
        }
    }

    fn finish(self, bounds: Option<EdgeSummary>) -> ScaleOutput {
        let mut widgets = BTreeMap::new();
        for (id, widget) in self.dashboard.iter() {
            if let Some(geometry) = &self.geometry[id.index()] {
                widgets.insert(widget.name.clone(), geometry.clone());
            }
        }
        for (id, nested) in self.nested {
            let name = &self.dashboard.widget(id).name;
            for (path, geometry) in nested.widgets {
                widgets.insert(format!("{name}{PATH_SEPARATOR}{path}"), geometry);
            }
        }
        ScaleOutput {
            ratio: self.ratio,
            bounds,
            widgets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Widget, WidgetDetail, WidgetKind};

    fn widget(name: &str, kind: WidgetKind, x: i32, y: i32, w: i32, h: i32) -> Widget {
        Widget::new(name, kind, Point::new(x, y), Size::new(w, h))
    }

    fn run(dashboard: &Dashboard, viewport: Viewport) -> ScaleOutput {
        scale_dashboard(dashboard, &viewport, &ScaleConfig::default(), &NoColumnMetadata)
    }

    #[test]
    fn half_width_viewport_halves_x_axis() {
        let mut dashboard = Dashboard::new();
        dashboard
            .add_widget(widget("w", WidgetKind::Other, 100, 100, 200, 100))
            .unwrap();
        dashboard
            .add_widget(widget("corner", WidgetKind::Other, 1000, 700, 200, 100))
            .unwrap();
        let output = run(&dashboard, Viewport::new(600, Some(800)));
        assert_eq!(output.ratio, Ratio::new(0.5, 1.0));
        let w = output.get("w").unwrap();
        assert_eq!(w.position.x, 50);
        assert_eq!(w.size.width, 100);

        dashboard.fit_to_width = true;
        let output = run(&dashboard, Viewport::new(600, Some(800)));
        assert_eq!(output.ratio, Ratio::uniform(0.5));
        let w = output.get("w").unwrap();
        assert_eq!(w.position, Point::new(50, 50));
        assert_eq!(w.size, Size::new(100, 50));
    }

    #[test]
    fn empty_dashboard_uses_identity() {
        let output = run(&Dashboard::new(), Viewport::new(300, Some(300)));
        assert_eq!(output.ratio, Ratio::IDENTITY);
        assert!(output.widgets.is_empty());
        assert!(output.bounds.is_none());
    }

    #[test]
    fn scale_to_screen_off_keeps_design_geometry() {
        let mut dashboard = Dashboard::new();
        dashboard.scale_to_screen = false;
        dashboard
            .add_widget(widget("w", WidgetKind::Chart, 10, 20, 300, 200))
            .unwrap();
        let output = run(&dashboard, Viewport::new(100, Some(100)));
        assert_eq!(output.ratio, Ratio::IDENTITY);
        assert_eq!(output.get("w").unwrap().rect(), Rect::new(10, 20, 300, 200));
    }

    #[test]
    fn embedded_widgets_are_prefixed_and_translated() {
        let mut sub = Dashboard::new();
        sub.add_widget(widget("inner", WidgetKind::Other, 0, 0, 100, 50))
            .unwrap();
        let mut dashboard = Dashboard::new();
        dashboard
            .add_widget(
                widget("frame", WidgetKind::EmbeddedDashboard, 40, 60, 100, 50)
                    .with_detail(WidgetDetail::Embedded(Box::new(sub))),
            )
            .unwrap();
        dashboard.scale_to_screen = false;
        let output = run(&dashboard, Viewport::new(500, Some(500)));
        let inner = output.get("frame.inner").unwrap();
        assert_eq!(inner.position, Point::new(40, 60));
        assert_eq!(inner.size, Size::new(100, 50));
    }

    #[test]
    fn apply_writes_nested_results() {
        let mut sub = Dashboard::new();
        sub.add_widget(widget("inner", WidgetKind::Other, 0, 0, 100, 50))
            .unwrap();
        let mut dashboard = Dashboard::new();
        dashboard
            .add_widget(
                widget("frame", WidgetKind::EmbeddedDashboard, 0, 0, 200, 100)
                    .with_detail(WidgetDetail::Embedded(Box::new(sub))),
            )
            .unwrap();
        let output = scale_in_place(
            &mut dashboard,
            &Viewport::new(100, Some(50)),
            &ScaleConfig::default(),
            &NoColumnMetadata,
        );
        let inner = dashboard.resolve("frame.inner").unwrap();
        assert_eq!(inner.scaled_position, Some(output.get("frame.inner").unwrap().position));
        assert!(dashboard.by_name("frame").unwrap().scaled_size.is_some());
    }

    #[test]
    fn mobile_user_agent_selects_mobile_allowance() {
        let viewport = Viewport::new(400, None).with_user_agent("Mozilla/5.0 (iPad; CPU OS 17_0)");
        assert!(viewport.uses_mobile_allowance());
        assert!(!Viewport::new(400, None).uses_mobile_allowance());
    }
}
