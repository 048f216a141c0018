//! Page templates: one frame plus the hooks painted around it

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::DocumentGeometry;
use crate::types::Rect;

/// Padding between a frame edge and its content
pub const FRAME_PADDING: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    /// First page of a machine: big header, shorter frame, footer
    Measurement,
    /// Continuation pages: page number, full frame, footer
    MeasurementTwo,
    /// Letter and closing pages: page number only
    Normal,
}

impl TemplateId {
    pub fn name(self) -> &'static str {
        match self {
            TemplateId::Measurement => "measurement",
            TemplateId::MeasurementTwo => "measurement_two",
            TemplateId::Normal => "normal",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoration painted on every page of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageHook {
    /// Page number plus the logo / badge / company / date table
    MachineHeader,
    /// Page number only
    StandardHeader,
    /// Contact table in the bottom margin
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub id: &'static str,
    pub rect: Rect,
}

impl Frame {
    /// Area available to flowables once padding is removed
    pub fn content_area(&self) -> Rect {
        self.rect.inset(FRAME_PADDING)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageTemplate {
    pub id: TemplateId,
    pub frame: Frame,
    /// Hooks painted when the page opens
    pub on_page: Vec<PageHook>,
    /// Hooks painted when the page closes
    pub on_page_end: Vec<PageHook>,
}

impl PageTemplate {
    /// The three report templates, `measurement` first
    pub fn report_set(geometry: &DocumentGeometry) -> Vec<PageTemplate> {
        let machine_frame = Frame {
            id: "machine_frame",
            rect: geometry.machine_frame(),
        };
        let standard_frame = Frame {
            id: "standard_frame",
            rect: geometry.standard_frame(),
        };
        vec![
            PageTemplate {
                id: TemplateId::Measurement,
                frame: machine_frame,
                on_page: vec![PageHook::MachineHeader],
                on_page_end: vec![PageHook::Footer],
            },
            PageTemplate {
                id: TemplateId::MeasurementTwo,
                frame: standard_frame,
                on_page: vec![PageHook::StandardHeader],
                on_page_end: vec![PageHook::Footer],
            },
            PageTemplate {
                id: TemplateId::Normal,
                frame: standard_frame,
                on_page: vec![PageHook::StandardHeader],
                on_page_end: Vec::new(),
            },
        ]
    }
}
