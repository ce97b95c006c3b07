//! JSON interchange form of a dashboard.
//!
//! Documents are parsed with JSON5 so hand-written fixtures may carry
//! comments and trailing commas. Containers and annotation targets are
//! referenced by name and resolved once every widget is known.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    AnnotationDetail, Column, Dashboard, DashboardError, DropDownDetail, LineDetail,
    TableDetail, Widget, WidgetDetail, WidgetKind,
};
use crate::geometry::{Point, Size};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    #[serde(default)]
    pub fit_to_width: bool,
    #[serde(default)]
    pub balance_padding: bool,
    #[serde(default = "default_true")]
    pub scale_to_screen: bool,
    #[serde(default)]
    pub widgets: Vec<WidgetDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDocument {
    pub name: String,
    pub kind: WidgetKind,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub layout_position: Option<Point>,
    #[serde(default)]
    pub layout_size: Option<Size>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub floating: bool,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub column_count: Option<usize>,
    #[serde(default)]
    pub shrink_to_fit: bool,
    #[serde(default)]
    pub start: Option<Point>,
    #[serde(default)]
    pub end: Option<Point>,
    #[serde(default)]
    pub drop_down: bool,
    #[serde(default)]
    pub list_height: Option<i32>,
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub rectangle: Option<String>,
    #[serde(default)]
    pub dashboard: Option<DashboardDocument>,
}

fn default_true() -> bool {
    true
}

impl WidgetDocument {
    fn detail(&self) -> Result<WidgetDetail, DashboardError> {
        let kind = self.kind;
        let detail = if kind.is_table_like() {
            WidgetDetail::Table(TableDetail {
                columns: self.columns.clone(),
                column_count: self.column_count.unwrap_or(self.columns.len()),
                shrink_to_fit: self.shrink_to_fit,
                scaled_column_widths: None,
            })
        } else if matches!(kind, WidgetKind::Line | WidgetKind::AnnotationLine) {
            WidgetDetail::Line(LineDetail {
                start: self.start.unwrap_or(Point::ORIGIN),
                end: self.end.unwrap_or(Point::new(self.width, self.height)),
                scaled_start: None,
                scaled_end: None,
            })
        } else if kind.supports_drop_down() && (self.drop_down || self.list_height.is_some()) {
            WidgetDetail::DropDown(DropDownDetail {
                drop_down: self.drop_down,
                list_height: self.list_height.unwrap_or(self.height),
                scaled_ratio: None,
                scaled_list_height: None,
            })
        } else if kind == WidgetKind::Annotation {
            WidgetDetail::Annotation(AnnotationDetail::default())
        } else if kind == WidgetKind::EmbeddedDashboard {
            let sub = match &self.dashboard {
                Some(doc) => doc.to_dashboard().map_err(|err| DashboardError::Embedded {
                    name: self.name.clone(),
                    source: Box::new(err),
                })?,
                None => Dashboard::new(),
            };
            WidgetDetail::Embedded(Box::new(sub))
        } else {
            WidgetDetail::None
        };
        Ok(detail)
    }
}

impl DashboardDocument {
    pub fn to_dashboard(&self) -> Result<Dashboard, DashboardError> {
        let mut dashboard = Dashboard::new();
        dashboard.fit_to_width = self.fit_to_width;
        dashboard.balance_padding = self.balance_padding;
        dashboard.scale_to_screen = self.scale_to_screen;

        let mut ids = Vec::with_capacity(self.widgets.len());
        for doc in &self.widgets {
            let widget = Widget::new(
                doc.name.clone(),
                doc.kind,
                Point::new(doc.x, doc.y),
                Size::new(doc.width, doc.height),
            )
            .with_layout(doc.layout_position, doc.layout_size)
            .with_visible(doc.visible)
            .with_z_index(doc.z_index)
            .with_floating(doc.floating)
            .with_detail(doc.detail()?);
            ids.push(dashboard.add_widget(widget)?);
        }

        let lookup = |dashboard: &Dashboard, name: &Option<String>| match name {
            Some(name) => dashboard
                .id_of(name)
                .map(Some)
                .ok_or_else(|| DashboardError::UnknownWidget(name.clone())),
            None => Ok(None),
        };

        for (doc, id) in self.widgets.iter().zip(ids.iter().copied()) {
            if let Some(container) = lookup(&dashboard, &doc.container)? {
                dashboard.set_container(id, container)?;
            }
            if doc.kind == WidgetKind::Annotation {
                let detail = AnnotationDetail {
                    anchor: lookup(&dashboard, &doc.anchor)?,
                    line: lookup(&dashboard, &doc.line)?,
                    rectangle: lookup(&dashboard, &doc.rectangle)?,
                };
                dashboard.link_annotation(id, detail)?;
            }
        }

        Ok(dashboard)
    }
}

pub fn parse_dashboard(input: &str) -> anyhow::Result<Dashboard> {
    let document: DashboardDocument =
        json5::from_str(input).context("malformed dashboard document")?;
    Ok(document.to_dashboard()?)
}

pub fn load_dashboard(path: &Path) -> anyhow::Result<Dashboard> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading dashboard {}", path.display()))?;
    parse_dashboard(&contents).with_context(|| format!("loading dashboard {}", path.display()))
}
