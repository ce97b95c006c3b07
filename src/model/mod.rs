//! The in-memory dashboard model.
//!
//! A [`Dashboard`] owns its widgets in an arena and hands out [`WidgetId`]
//! handles. Containers only record membership by id; the arena is the sole
//! owner. Embedded sub-dashboards are owned by the widget that embeds them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Point, Ratio, Rect, Size};
use crate::scale::{ScaleOutput, ScaledGeometry};

pub mod document;

pub use document::{DashboardDocument, WidgetDocument, load_dashboard, parse_dashboard};

/// Separator between path segments of widgets nested in embedded dashboards.
pub const PATH_SEPARATOR: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(usize);

impl WidgetId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    Table,
    Crosstab,
    CalcTable,
    Chart,
    SelectionList,
    SelectionTree,
    TimeSlider,
    Calendar,
    ListInput,
    Tab,
    CurrentSelectionContainer,
    GroupContainer,
    EmbeddedDashboard,
    Line,
    Shape,
    Annotation,
    AnnotationLine,
    AnnotationRectangle,
    Other,
}

impl WidgetKind {
    pub fn is_table_like(self) -> bool {
        matches!(self, Self::Table | Self::Crosstab | Self::CalcTable)
    }

    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::Tab | Self::CurrentSelectionContainer | Self::GroupContainer
        )
    }

    /// Containers that position their members themselves; members are never
    /// scaled by the generic rule.
    pub fn manages_member_layout(self) -> bool {
        matches!(self, Self::Tab | Self::CurrentSelectionContainer)
    }

    pub fn is_annotation_part(self) -> bool {
        matches!(
            self,
            Self::Annotation | Self::AnnotationLine | Self::AnnotationRectangle
        )
    }

    pub fn is_input_control(self) -> bool {
        matches!(self, Self::ListInput | Self::TimeSlider)
    }

    /// Kinds whose height stays at design size unless an overlap correction
    /// lets them scale vertically.
    pub fn has_fixed_height(self) -> bool {
        matches!(self, Self::ListInput | Self::TimeSlider | Self::Tab)
    }

    pub fn is_shape(self) -> bool {
        matches!(self, Self::Line | Self::Shape)
    }

    /// Widgets that may grow scrollbars at runtime.
    pub fn is_data_widget(self) -> bool {
        matches!(
            self,
            Self::Chart
                | Self::Table
                | Self::Crosstab
                | Self::CalcTable
                | Self::SelectionList
                | Self::SelectionTree
                | Self::CurrentSelectionContainer
        )
    }

    pub fn is_control(self) -> bool {
        matches!(
            self,
            Self::Tab | Self::TimeSlider | Self::ListInput | Self::Calendar
        )
    }

    pub fn supports_drop_down(self) -> bool {
        matches!(
            self,
            Self::SelectionList | Self::SelectionTree | Self::ListInput
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub width: i32,
    #[serde(default)]
    pub hidden: bool,
}

impl Column {
    pub fn new(width: i32) -> Self {
        Self {
            width,
            hidden: false,
        }
    }

    pub fn hidden(width: i32) -> Self {
        Self {
            width,
            hidden: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDetail {
    /// Design-time column widths, empty when only the count is known.
    pub columns: Vec<Column>,
    pub column_count: usize,
    /// Shrink-to-fit tables size their rows from data at render time.
    pub shrink_to_fit: bool,
    pub scaled_column_widths: Option<Vec<i32>>,
}

/// Endpoints relative to the line widget's own position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineDetail {
    pub start: Point,
    pub end: Point,
    pub scaled_start: Option<Point>,
    pub scaled_end: Option<Point>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropDownDetail {
    pub drop_down: bool,
    /// Expanded list height at design size.
    pub list_height: i32,
    pub scaled_ratio: Option<Ratio>,
    pub scaled_list_height: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationDetail {
    pub anchor: Option<WidgetId>,
    pub line: Option<WidgetId>,
    pub rectangle: Option<WidgetId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum WidgetDetail {
    #[default]
    None,
    Table(TableDetail),
    Line(LineDetail),
    DropDown(DropDownDetail),
    Annotation(AnnotationDetail),
    Embedded(Box<Dashboard>),
}

impl WidgetDetail {
    fn fits(&self, kind: WidgetKind) -> bool {
        match self {
            Self::None => true,
            Self::Table(_) => kind.is_table_like(),
            Self::Line(_) => matches!(kind, WidgetKind::Line | WidgetKind::AnnotationLine),
            Self::DropDown(_) => kind.supports_drop_down(),
            Self::Annotation(_) => kind == WidgetKind::Annotation,
            Self::Embedded(_) => kind == WidgetKind::EmbeddedDashboard,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub name: String,
    pub kind: WidgetKind,
    pub design_position: Point,
    pub design_size: Size,
    pub layout_position: Option<Point>,
    pub layout_size: Option<Size>,
    pub scaled_position: Option<Point>,
    pub scaled_size: Option<Size>,
    pub visible: bool,
    pub z_index: i32,
    pub floating: bool,
    pub detail: WidgetDetail,
    container: Option<WidgetId>,
    members: Vec<WidgetId>,
}

impl Widget {
    pub fn new(name: impl Into<String>, kind: WidgetKind, position: Point, size: Size) -> Self {
        Self {
            name: name.into(),
            kind,
            design_position: position,
            design_size: size,
            layout_position: None,
            layout_size: None,
            scaled_position: None,
            scaled_size: None,
            visible: true,
            z_index: 0,
            floating: false,
            detail: WidgetDetail::None,
            container: None,
            members: Vec::new(),
        }
    }

    pub fn with_layout(mut self, position: Option<Point>, size: Option<Size>) -> Self {
        self.layout_position = position;
        self.layout_size = size;
        self
    }

    pub fn with_detail(mut self, detail: WidgetDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_floating(mut self, floating: bool) -> Self {
        self.floating = floating;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Geometry fed into scaling: the layout override per field, else design.
    pub fn source_rect(&self) -> Rect {
        Rect::from_parts(
            self.layout_position.unwrap_or(self.design_position),
            self.layout_size.unwrap_or(self.design_size),
        )
    }

    pub fn design_rect(&self) -> Rect {
        Rect::from_parts(self.design_position, self.design_size)
    }

    pub fn scaled_rect(&self) -> Option<Rect> {
        Some(Rect::from_parts(self.scaled_position?, self.scaled_size?))
    }

    pub fn container(&self) -> Option<WidgetId> {
        self.container
    }

    pub fn members(&self) -> &[WidgetId] {
        &self.members
    }

    pub fn table(&self) -> Option<&TableDetail> {
        match &self.detail {
            WidgetDetail::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn line(&self) -> Option<&LineDetail> {
        match &self.detail {
            WidgetDetail::Line(line) => Some(line),
            _ => None,
        }
    }

    pub fn drop_down(&self) -> Option<&DropDownDetail> {
        match &self.detail {
            WidgetDetail::DropDown(drop_down) => Some(drop_down),
            _ => None,
        }
    }

    pub fn annotation(&self) -> Option<&AnnotationDetail> {
        match &self.detail {
            WidgetDetail::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }

    pub fn embedded(&self) -> Option<&Dashboard> {
        match &self.detail {
            WidgetDetail::Embedded(dashboard) => Some(dashboard),
            _ => None,
        }
    }

    fn apply_geometry(&mut self, geometry: &ScaledGeometry) {
        self.scaled_position = Some(geometry.position);
        self.scaled_size = Some(geometry.size);
        match &mut self.detail {
            WidgetDetail::Table(table) => {
                table.scaled_column_widths = geometry.column_widths.clone();
            }
            WidgetDetail::Line(line) => {
                line.scaled_start = geometry.line.map(|line| line.start);
                line.scaled_end = geometry.line.map(|line| line.end);
            }
            WidgetDetail::DropDown(drop_down) => {
                drop_down.scaled_ratio = geometry.drop_down_ratio;
                drop_down.scaled_list_height = geometry.list_height;
            }
            _ => {}
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("widget name must not be empty")]
    EmptyName,

    #[error("widget name '{0}' must not contain '.'")]
    InvalidName(String),

    #[error("duplicate widget name: {0}")]
    DuplicateName(String),

    #[error("unknown widget: {0}")]
    UnknownWidget(String),

    #[error("'{container}' is a {kind:?} and cannot contain other widgets")]
    NotAContainer { container: String, kind: WidgetKind },

    #[error("'{member}' already belongs to '{container}'")]
    AlreadyContained { member: String, container: String },

    #[error("placing '{member}' inside '{container}' would form a cycle")]
    ContainerCycle { member: String, container: String },

    #[error("detail of '{name}' does not match its kind {kind:?}")]
    DetailMismatch { name: String, kind: WidgetKind },

    #[error("annotation '{annotation}' cannot reference '{target}' as its {role}")]
    InvalidAnnotationTarget {
        annotation: String,
        target: String,
        role: &'static str,
    },

    #[error("in embedded dashboard '{name}': {source}")]
    Embedded {
        name: String,
        #[source]
        source: Box<DashboardError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    widgets: Vec<Widget>,
    index: HashMap<String, WidgetId>,
    pub fit_to_width: bool,
    pub balance_padding: bool,
    pub scale_to_screen: bool,
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            widgets: Vec::new(),
            index: HashMap::new(),
            fit_to_width: false,
            balance_padding: false,
            scale_to_screen: true,
        }
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn add_widget(&mut self, mut widget: Widget) -> Result<WidgetId, DashboardError> {
        if widget.name.is_empty() {
            return Err(DashboardError::EmptyName);
        }
        if widget.name.contains(PATH_SEPARATOR) {
            return Err(DashboardError::InvalidName(widget.name));
        }
        if self.index.contains_key(&widget.name) {
            return Err(DashboardError::DuplicateName(widget.name));
        }
        if !widget.detail.fits(widget.kind) {
            return Err(DashboardError::DetailMismatch {
                name: widget.name,
                kind: widget.kind,
            });
        }
        if let WidgetDetail::Annotation(detail) = &widget.detail {
            self.check_annotation(&widget.name, detail)?;
        }
        widget.container = None;
        widget.members.clear();
        let id = WidgetId(self.widgets.len());
        self.index.insert(widget.name.clone(), id);
        self.widgets.push(widget);
        Ok(id)
    }

    /// Records `member` as belonging to `container`, keeping the member list
    /// and the back-reference in agreement.
    pub fn set_container(
        &mut self,
        member: WidgetId,
        container: WidgetId,
    ) -> Result<(), DashboardError> {
        let container_widget = self.widget(container);
        if !container_widget.kind.is_container() {
            return Err(DashboardError::NotAContainer {
                container: container_widget.name.clone(),
                kind: container_widget.kind,
            });
        }
        if let Some(existing) = self.widget(member).container {
            return Err(DashboardError::AlreadyContained {
                member: self.widget(member).name.clone(),
                container: self.widget(existing).name.clone(),
            });
        }
        if member == container || self.ancestors(container).any(|id| id == member) {
            return Err(DashboardError::ContainerCycle {
                member: self.widget(member).name.clone(),
                container: self.widget(container).name.clone(),
            });
        }
        self.widgets[member.0].container = Some(container);
        self.widgets[container.0].members.push(member);
        Ok(())
    }

    /// Attaches anchor, connector line and rectangle to an annotation marker.
    pub fn link_annotation(
        &mut self,
        annotation: WidgetId,
        detail: AnnotationDetail,
    ) -> Result<(), DashboardError> {
        let widget = self.widget(annotation);
        if widget.kind != WidgetKind::Annotation {
            return Err(DashboardError::DetailMismatch {
                name: widget.name.clone(),
                kind: widget.kind,
            });
        }
        self.check_annotation(&widget.name, &detail)?;
        self.widgets[annotation.0].detail = WidgetDetail::Annotation(detail);
        Ok(())
    }

    fn check_annotation(
        &self,
        annotation: &str,
        detail: &AnnotationDetail,
    ) -> Result<(), DashboardError> {
        let checks = [
            (detail.anchor, "anchor"),
            (detail.line, "line"),
            (detail.rectangle, "rectangle"),
        ];
        for (target, role) in checks {
            let Some(target) = target else {
                continue;
            };
            let Some(target_widget) = self.get(target) else {
                return Err(DashboardError::UnknownWidget(format!(
                    "{role} of annotation '{annotation}'"
                )));
            };
            let valid = match role {
                "anchor" => !target_widget.kind.is_annotation_part(),
                "line" => target_widget.kind == WidgetKind::AnnotationLine,
                _ => target_widget.kind == WidgetKind::AnnotationRectangle,
            };
            if !valid {
                return Err(DashboardError::InvalidAnnotationTarget {
                    annotation: annotation.to_string(),
                    target: target_widget.name.clone(),
                    role,
                });
            }
        }
        Ok(())
    }

    /// Panics on an id that was not handed out by this dashboard.
    pub fn widget(&self, id: WidgetId) -> &Widget {
        &self.widgets[id.0]
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> &mut Widget {
        &mut self.widgets[id.0]
    }

    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<WidgetId> {
        self.index.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&Widget> {
        self.id_of(name).map(|id| self.widget(id))
    }

    /// Resolves a dotted path through embedded dashboards.
    pub fn resolve(&self, path: &str) -> Option<&Widget> {
        match path.split_once(PATH_SEPARATOR) {
            None => self.by_name(path),
            Some((head, rest)) => self.by_name(head)?.embedded()?.resolve(rest),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (WidgetId, &Widget)> {
        self.widgets
            .iter()
            .enumerate()
            .map(|(idx, widget)| (WidgetId(idx), widget))
    }

    /// Widgets without a container, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = WidgetId> + '_ {
        self.iter()
            .filter(|(_, widget)| widget.container.is_none())
            .map(|(id, _)| id)
    }

    /// Containers enclosing `id`, innermost first.
    pub fn ancestors(&self, id: WidgetId) -> impl Iterator<Item = WidgetId> + '_ {
        std::iter::successors(self.widget(id).container, move |current| {
            self.widget(*current).container
        })
    }

    /// The closest tab or selection container responsible for positioning
    /// `id`, looking through intermediate groups.
    pub fn managing_container(&self, id: WidgetId) -> Option<WidgetId> {
        self.ancestors(id)
            .find(|ancestor| self.widget(*ancestor).kind.manages_member_layout())
    }

    pub fn in_selection_container(&self, id: WidgetId) -> bool {
        self.ancestors(id)
            .any(|ancestor| self.widget(ancestor).kind == WidgetKind::CurrentSelectionContainer)
    }

    /// Floating either directly or through an enclosing floating container.
    pub fn is_effectively_floating(&self, id: WidgetId) -> bool {
        self.widget(id).floating || self.ancestors(id).any(|ancestor| self.widget(ancestor).floating)
    }

    /// `a` and `b` are the same widget or one encloses the other.
    pub fn related(&self, a: WidgetId, b: WidgetId) -> bool {
        a == b || self.ancestors(a).any(|id| id == b) || self.ancestors(b).any(|id| id == a)
    }

    /// Writes a pass result back into the tree. Paths that no longer resolve
    /// are ignored.
    pub fn apply(&mut self, output: &ScaleOutput) {
        for (path, geometry) in &output.widgets {
            self.apply_path(path, geometry);
        }
    }

    fn apply_path(&mut self, path: &str, geometry: &ScaledGeometry) {
        match path.split_once(PATH_SEPARATOR) {
            None => {
                if let Some(id) = self.id_of(path) {
                    self.widgets[id.0].apply_geometry(geometry);
                }
            }
            Some((head, rest)) => {
                let Some(id) = self.id_of(head) else {
                    return;
                };
                if let WidgetDetail::Embedded(sub) = &mut self.widgets[id.0].detail {
                    sub.apply_path(rest, geometry);
                }
            }
        }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}
