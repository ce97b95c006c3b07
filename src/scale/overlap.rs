use tracing::debug;

use super::ScalePass;
use super::assembly::Placement;
use crate::model::WidgetId;

impl ScalePass<'_> {
    /// Input controls keep their design height, so scaling the canvas down
    /// can push one into the next. Every overlapping pair found in the
    /// scaled layout is re-scaled once with heights following the ratio.
    pub(super) fn resolve_overlaps(&mut self) {
        let candidates = self.overlap_candidates();
        let mut overlapping: Vec<WidgetId> = Vec::new();
        for (idx, &a) in candidates.iter().enumerate() {
            for &b in &candidates[idx + 1..] {
                if !self.may_conflict(a, b) {
                    continue;
                }
                let (Some(rect_a), Some(rect_b)) = (self.rect(a), self.rect(b)) else {
                    continue;
                };
                if rect_a.intersects(&rect_b) {
                    debug!(first = %self.path(a), second = %self.path(b), "scaled controls overlap");
                    overlapping.push(a);
                    overlapping.push(b);
                }
            }
        }
        overlapping.sort();
        overlapping.dedup();
        for id in overlapping {
            self.rescale_for_overlap(id);
        }
    }

    /// Members of floating containers move with their pinned container and are
    /// never candidates.
    fn overlap_candidates(&self) -> Vec<WidgetId> {
        let dashboard = self.dashboard;
        dashboard
            .iter()
            .filter(|(id, widget)| {
                widget.visible
                    && widget.kind.is_input_control()
                    && dashboard.managing_container(*id).is_none()
                    && !dashboard
                        .ancestors(*id)
                        .any(|ancestor| dashboard.widget(ancestor).floating)
            })
            .map(|(id, _)| id)
            .collect()
    }

    fn may_conflict(&self, a: WidgetId, b: WidgetId) -> bool {
        let (first, second) = (self.dashboard.widget(a), self.dashboard.widget(b));
        if first.floating != second.floating {
            return false;
        }
        if first.floating && first.container() != second.container() {
            return false;
        }
        !self.dashboard.related(a, b)
    }

    fn rescale_for_overlap(&mut self, id: WidgetId) {
        self.scale_widget(id, Placement::Free, true);
        let widget = self.dashboard.widget(id);
        if widget.floating && widget.container().is_none() {
            self.fit_floating(id);
        }
        self.refresh_enclosing_groups(id);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ScaleConfig;
    use crate::geometry::{Point, Size};
    use crate::model::{Dashboard, Widget, WidgetId, WidgetKind};
    use crate::scale::{NoColumnMetadata, ScaleOutput, Viewport, scale_dashboard};

    fn add(dashboard: &mut Dashboard, name: &str, kind: WidgetKind, x: i32, y: i32, w: i32, h: i32) -> WidgetId {
        dashboard
            .add_widget(Widget::new(name, kind, Point::new(x, y), Size::new(w, h)))
            .unwrap()
    }

    fn run(dashboard: &Dashboard) -> ScaleOutput {
        scale_dashboard(
            dashboard,
            &Viewport::new(500, Some(500)),
            &ScaleConfig::default(),
            &NoColumnMetadata,
        )
    }

    /// Two stacked radio lists that collide once heights stay fixed at half
    /// the canvas scale.
    fn stacked() -> Dashboard {
        let mut dashboard = Dashboard::new();
        add(&mut dashboard, "page", WidgetKind::Other, 0, 0, 1000, 1000);
        add(&mut dashboard, "upper", WidgetKind::ListInput, 0, 100, 200, 100);
        add(&mut dashboard, "lower", WidgetKind::ListInput, 0, 200, 200, 100);
        dashboard
    }

    #[test]
    fn overlapping_controls_scale_their_height() {
        let output = run(&stacked());
        let upper = output.get("upper").unwrap().rect();
        let lower = output.get("lower").unwrap().rect();
        assert!(!upper.intersects(&lower));
        assert_eq!(upper.height, 50);
        assert_eq!(lower.height, 50);
    }

    #[test]
    fn correction_is_deterministic() {
        let dashboard = stacked();
        assert_eq!(run(&dashboard), run(&dashboard));
    }

    #[test]
    fn disjoint_controls_keep_design_height() {
        let mut dashboard = Dashboard::new();
        add(&mut dashboard, "page", WidgetKind::Other, 0, 0, 1000, 1000);
        add(&mut dashboard, "left", WidgetKind::ListInput, 0, 100, 200, 40);
        add(&mut dashboard, "right", WidgetKind::ListInput, 600, 100, 200, 40);
        let output = run(&dashboard);
        assert_eq!(output.get("left").unwrap().size.height, 40);
        assert_eq!(output.get("right").unwrap().size.height, 40);
    }

    #[test]
    fn floating_mismatch_is_ignored() {
        let mut dashboard = stacked();
        dashboard
            .add_widget(
                Widget::new("popup", WidgetKind::TimeSlider, Point::new(0, 100), Size::new(200, 100))
                    .with_floating(true),
            )
            .unwrap();
        let output = run(&dashboard);
        assert_eq!(output.get("popup").unwrap().size.height, 100);
    }

    #[test]
    fn managed_controls_are_not_candidates() {
        let mut dashboard = Dashboard::new();
        add(&mut dashboard, "page", WidgetKind::Other, 0, 0, 1000, 1000);
        let tab = add(&mut dashboard, "tabs", WidgetKind::Tab, 0, 0, 400, 30);
        let a = add(&mut dashboard, "a", WidgetKind::ListInput, 0, 30, 200, 100);
        let b = add(&mut dashboard, "b", WidgetKind::ListInput, 0, 30, 200, 100);
        dashboard.set_container(a, tab).unwrap();
        dashboard.set_container(b, tab).unwrap();
        let output = run(&dashboard);
        assert_eq!(output.get("a").unwrap().size.height, 100);
        assert_eq!(output.get("b").unwrap().size.height, 100);
    }

    #[test]
    fn controls_in_a_floating_group_stay_pinned_with_it() {
        let mut dashboard = Dashboard::new();
        add(&mut dashboard, "page", WidgetKind::Other, 0, 0, 1000, 1000);
        let popup = dashboard
            .add_widget(
                Widget::new("popup", WidgetKind::GroupContainer, Point::new(0, 0), Size::new(1, 1))
                    .with_floating(true),
            )
            .unwrap();
        for (name, y) in [("a", 400), ("b", 500)] {
            let id = dashboard
                .add_widget(
                    Widget::new(name, WidgetKind::ListInput, Point::new(300, y), Size::new(200, 100))
                        .with_floating(true),
                )
                .unwrap();
            dashboard.set_container(id, popup).unwrap();
        }

        let output = run(&dashboard);
        assert_eq!(output.get("popup").unwrap().position, Point::ORIGIN);
        let a = output.get("a").unwrap().rect();
        let b = output.get("b").unwrap().rect();
        assert_eq!(a.position(), Point::ORIGIN);
        assert_eq!(b.position(), Point::new(0, 50));
        assert_eq!(a.x.min(b.x), 0);
    }
}
