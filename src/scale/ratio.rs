use super::bounds::is_canvas_widget;
use super::{EdgeBounds, Viewport};
use crate::config::ScaleConfig;
use crate::geometry::{Ratio, Size};
use crate::model::Dashboard;

#[derive(Debug, Clone, PartialEq)]
pub struct RatioInputs {
    /// Right/bottom extent of the padded content, measured from the origin.
    pub canvas: Size,
    pub offset_x: i32,
    pub offset_y: i32,
    pub viewport_width: i32,
    pub viewport_height: Option<i32>,
    pub fit_to_width: bool,
    pub balance_padding: bool,
    pub scrollbar: i32,
    /// `(y, height)` of widgets that keep their design height.
    pub fixed_heights: Vec<(i32, i32)>,
}

impl RatioInputs {
    pub fn collect(
        dashboard: &Dashboard,
        bounds: &EdgeBounds,
        viewport: &Viewport,
        config: &ScaleConfig,
    ) -> Self {
        let fixed_heights = dashboard
            .iter()
            .filter(|(id, widget)| {
                widget.kind.has_fixed_height() && is_canvas_widget(dashboard, *id)
            })
            .map(|(_, widget)| {
                let rect = widget.source_rect();
                (rect.y, rect.height)
            })
            .collect();
        Self {
            canvas: Size::new(bounds.right, bounds.bottom),
            offset_x: bounds.offset_x,
            offset_y: bounds.offset_y,
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            fit_to_width: dashboard.fit_to_width,
            balance_padding: dashboard.balance_padding,
            scrollbar: config.scrollbar_allowance(viewport.uses_mobile_allowance()),
            fixed_heights,
        }
    }
}

/// Available viewport extent and effective canvas extent along one axis.
/// Balanced padding grows the canvas by the offset, otherwise the viewport
/// gives the offset up.
fn axis(viewport: i32, canvas: i32, offset: i32, balance_padding: bool) -> (f64, f64) {
    if balance_padding {
        (f64::from(viewport), f64::from(canvas + offset))
    } else {
        (f64::from(viewport - offset), f64::from(canvas))
    }
}

pub fn compute_ratio(inputs: &RatioInputs) -> Ratio {
    if inputs.canvas.width <= 0 || inputs.canvas.height <= 0 {
        return Ratio::IDENTITY;
    }
    let (available_width, canvas_width) = axis(
        inputs.viewport_width,
        inputs.canvas.width,
        inputs.offset_x,
        inputs.balance_padding,
    );
    let ratio_x = (available_width / canvas_width).max(0.0);

    let Some(viewport_height) = inputs.viewport_height else {
        return Ratio::uniform(ratio_x);
    };

    if inputs.fit_to_width {
        let ratio = fit_width_ratio(
            ratio_x,
            available_width,
            canvas_width,
            f64::from(inputs.canvas.height),
            f64::from(viewport_height),
            f64::from(inputs.scrollbar),
        );
        return Ratio::uniform(ratio);
    }

    let (available_height, canvas_height) = axis(
        viewport_height,
        inputs.canvas.height,
        inputs.offset_y,
        inputs.balance_padding,
    );
    let effective = max_effective_canvas_height(available_height, canvas_height, &inputs.fixed_heights);
    Ratio::new(ratio_x, (available_height / effective).max(0.0))
}

fn fit_width_ratio(
    ratio: f64,
    available_width: f64,
    canvas_width: f64,
    canvas_height: f64,
    viewport_height: f64,
    scrollbar: f64,
) -> f64 {
    if canvas_height * ratio <= viewport_height {
        return ratio;
    }
    // Content is taller than the viewport: a vertical scrollbar will eat into
    // the width.
    let corrected = ((available_width - scrollbar) / canvas_width).max(0.0);
    if canvas_height * corrected <= viewport_height {
        // Without the scrollbar the content now fits; fill the height exactly.
        return (viewport_height / canvas_height).min(ratio);
    }
    corrected
}

/// Canvas height that leaves every fixed-height widget fully visible once
/// its top edge has been scaled.
fn max_effective_canvas_height(available: f64, canvas: f64, fixed_heights: &[(i32, i32)]) -> f64 {
    let mut effective = canvas;
    for &(y, height) in fixed_heights {
        let (y, height) = (f64::from(y), f64::from(height));
        if y <= 0.0 || available <= height {
            continue;
        }
        effective = effective.max(y * available / (available - height));
    }
    effective
}
