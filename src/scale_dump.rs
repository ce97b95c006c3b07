use crate::model::Dashboard;
use crate::scale::{EdgeSummary, ScaleOutput, Viewport};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleDump {
    pub viewport_width: i32,
    pub viewport_height: Option<i32>,
    pub mobile: bool,
    pub ratio: [f64; 2],
    pub bounds: Option<EdgeSummary>,
    pub widgets: Vec<WidgetDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDump {
    pub path: String,
    pub kind: Option<String>,
    pub design: Option<[i32; 4]>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_widths: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<[[i32; 2]; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_height: Option<i32>,
}

impl ScaleDump {
    pub fn from_output(dashboard: &Dashboard, viewport: &Viewport, output: &ScaleOutput) -> Self {
        let widgets = output
            .widgets
            .iter()
            .map(|(path, geometry)| {
                let widget = dashboard.resolve(path);
                WidgetDump {
                    path: path.clone(),
                    kind: widget.map(|widget| format!("{:?}", widget.kind)),
                    design: widget.map(|widget| {
                        let rect = widget.design_rect();
                        [rect.x, rect.y, rect.width, rect.height]
                    }),
                    x: geometry.position.x,
                    y: geometry.position.y,
                    width: geometry.size.width,
                    height: geometry.size.height,
                    column_widths: geometry.column_widths.clone(),
                    line: geometry
                        .line
                        .map(|line| [[line.start.x, line.start.y], [line.end.x, line.end.y]]),
                    list_height: geometry.list_height,
                }
            })
            .collect();

        ScaleDump {
            viewport_width: viewport.width,
            viewport_height: viewport.height,
            mobile: viewport.uses_mobile_allowance(),
            ratio: [output.ratio.x, output.ratio.y],
            bounds: output.bounds.clone(),
            widgets,
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or to stdout without one.
pub fn write_scale_dump(path: Option<&Path>, dump: &ScaleDump) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, dump)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScaleConfig;
    use crate::geometry::{Point, Size};
    use crate::model::{Widget, WidgetKind};
    use crate::scale::{NoColumnMetadata, scale_dashboard};

    #[test]
    fn dump_lists_every_scaled_widget() {
        let mut dashboard = Dashboard::new();
        dashboard
            .add_widget(Widget::new("chart", WidgetKind::Chart, Point::new(0, 0), Size::new(390, 190)))
            .unwrap();
        let viewport = Viewport::new(200, None);
        let output = scale_dashboard(&dashboard, &viewport, &ScaleConfig::default(), &NoColumnMetadata);
        let dump = ScaleDump::from_output(&dashboard, &viewport, &output);
        assert_eq!(dump.widgets.len(), 1);
        assert_eq!(dump.widgets[0].kind.as_deref(), Some("Chart"));
        assert_eq!(dump.widgets[0].design, Some([0, 0, 390, 190]));

        let json = serde_json::to_value(&dump).unwrap();
        assert_eq!(json["viewportWidth"], 200);
        assert_eq!(json["bounds"]["rightMost"], "chart");
        assert!(json["widgets"][0].get("columnWidths").is_none());
    }
}
