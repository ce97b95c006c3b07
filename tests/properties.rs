use proptest::prelude::*;

use viewsheet_scale::geometry::{Point, Size};
use viewsheet_scale::model::Column;
use viewsheet_scale::scale::{NoColumnMetadata, distribute_column_widths};
use viewsheet_scale::{Dashboard, ScaleConfig, Viewport, Widget, WidgetKind, scale_dashboard};

const KINDS: [WidgetKind; 8] = [
    WidgetKind::Other,
    WidgetKind::Chart,
    WidgetKind::Table,
    WidgetKind::ListInput,
    WidgetKind::TimeSlider,
    WidgetKind::Calendar,
    WidgetKind::Shape,
    WidgetKind::SelectionList,
];

type WidgetSample = (usize, i32, i32, i32, i32, bool);

fn widget_sample() -> impl Strategy<Value = WidgetSample> {
    (
        0..KINDS.len(),
        0..2000i32,
        0..2000i32,
        -20..800i32,
        -20..600i32,
        any::<bool>(),
    )
}

fn build(samples: &[WidgetSample], allow_floating: bool) -> Dashboard {
    let mut dashboard = Dashboard::new();
    for (idx, &(kind, x, y, width, height, floating)) in samples.iter().enumerate() {
        let widget = Widget::new(
            format!("w{idx}"),
            KINDS[kind],
            Point::new(x, y),
            Size::new(width, height),
        )
        .with_floating(allow_floating && floating);
        dashboard.add_widget(widget).unwrap();
    }
    dashboard
}

fn run(dashboard: &Dashboard, width: i32, height: Option<i32>) -> viewsheet_scale::ScaleOutput {
    scale_dashboard(
        dashboard,
        &Viewport::new(width, height),
        &ScaleConfig::default(),
        &NoColumnMetadata,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ratio_grows_with_viewport_width(
        samples in prop::collection::vec(widget_sample(), 1..12),
        narrow in 50..2000i32,
        extra in 0..2000i32,
    ) {
        let dashboard = build(&samples, false);
        let small = run(&dashboard, narrow, None);
        let large = run(&dashboard, narrow + extra, None);
        prop_assert!(small.ratio.x <= large.ratio.x);
    }

    #[test]
    fn scaled_sizes_are_never_negative(
        samples in prop::collection::vec(widget_sample(), 0..16),
        width in 1..2500i32,
        height in prop::option::of(1..2000i32),
    ) {
        let dashboard = build(&samples, true);
        let output = run(&dashboard, width, height);
        for geometry in output.widgets.values() {
            prop_assert!(geometry.size.width >= 0);
            prop_assert!(geometry.size.height >= 0);
        }
    }

    #[test]
    fn repeated_passes_agree(
        samples in prop::collection::vec(widget_sample(), 0..16),
        width in 1..2500i32,
        height in prop::option::of(1..2000i32),
    ) {
        let dashboard = build(&samples, false);
        prop_assert_eq!(run(&dashboard, width, height), run(&dashboard, width, height));
    }

    #[test]
    fn floating_widgets_stay_within_design_size(
        samples in prop::collection::vec(widget_sample(), 1..12),
        width in 100..2500i32,
        height in prop::option::of(100..2000i32),
    ) {
        let dashboard = build(&samples, true);
        let output = run(&dashboard, width, height);
        for (_, widget) in dashboard.iter().filter(|(_, widget)| widget.floating) {
            let geometry = output.get(&widget.name).unwrap();
            let design = widget.design_size.clamped();
            prop_assert!(geometry.size.width <= design.width);
            prop_assert!(geometry.size.height <= design.height);
            prop_assert_eq!(geometry.position, Point::ORIGIN);
        }
    }

    #[test]
    fn visible_columns_fill_the_target(
        widths in prop::collection::vec((0..400i32, any::<bool>()), 1..10),
        target in 0..3000i32,
    ) {
        let columns: Vec<Column> = widths
            .iter()
            .map(|&(width, hidden)| if hidden { Column::hidden(width) } else { Column::new(width) })
            .collect();
        let scaled = distribute_column_widths(&columns, target);
        prop_assert_eq!(scaled.len(), columns.len());
        prop_assert!(scaled.iter().all(|width| *width >= 0));
        let visible: i32 = columns
            .iter()
            .zip(&scaled)
            .filter(|(column, _)| !column.hidden)
            .map(|(_, width)| *width)
            .sum();
        if columns.iter().any(|column| !column.hidden) {
            prop_assert_eq!(visible, target);
        } else {
            prop_assert_eq!(visible, 0);
        }
    }
}
