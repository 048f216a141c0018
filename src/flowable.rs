//! Story elements consumed by the paginator

use std::fmt;
use std::path::PathBuf;

use crate::error::ReportResult;
use crate::font_registry::FontLibrary;
use crate::paragraph::Paragraph;
use crate::renderer::Surface;
use crate::table::Table;
use crate::template::TemplateId;
use crate::types::{Rect, Size};

/// Image file drawn at a fixed display size
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBox {
    pub path: PathBuf,
    pub width: f64,
    pub height: f64,
}

impl ImageBox {
    pub fn new(path: impl Into<PathBuf>, width: f64, height: f64) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Paragraph(Paragraph),
    Table(Table),
    Image(ImageBox),
    Spacer(f64),
    PageBreak,
    /// Template used for the next page that is opened
    NextTemplate(TemplateId),
}

impl Flowable {
    /// Control markers occupy no space and are handled by the paginator
    pub fn is_control(&self) -> bool {
        matches!(self, Flowable::PageBreak | Flowable::NextTemplate(_))
    }

    pub fn wrap(&self, avail_width: f64, fonts: &FontLibrary) -> Size {
        match self {
            Flowable::Paragraph(para) => para.wrap(avail_width, fonts),
            Flowable::Table(table) => table.wrap(fonts),
            Flowable::Image(image) => Size::new(image.width, image.height),
            Flowable::Spacer(height) => Size::new(avail_width, *height),
            Flowable::PageBreak | Flowable::NextTemplate(_) => Size::new(0.0, 0.0),
        }
    }

    /// Split so that the first part fits `avail_height`
    pub fn split(
        &self,
        avail_width: f64,
        avail_height: f64,
        fonts: &FontLibrary,
    ) -> Option<(Flowable, Flowable)> {
        match self {
            Flowable::Paragraph(para) => para
                .split(avail_width, avail_height, fonts)
                .map(|(head, tail)| (Flowable::Paragraph(head), Flowable::Paragraph(tail))),
            Flowable::Table(table) => table
                .split(avail_height, fonts)
                .map(|(head, tail)| (Flowable::Table(head), Flowable::Table(tail))),
            _ => None,
        }
    }

    /// Draw inside `area` with the top edge at `top`; tables and images are
    /// centred horizontally, paragraphs take the full width
    pub fn draw(&self, surface: &mut Surface<'_>, area: &Rect, top: f64) -> ReportResult<()> {
        let size = self.wrap(area.width, surface.fonts.library());
        let centred_x = area.x + (area.width - size.width) / 2.0;
        match self {
            Flowable::Paragraph(para) => para.draw(surface, area.x, top, area.width),
            Flowable::Table(table) => table.draw(surface, centred_x, top - size.height),
            Flowable::Image(image) => surface.draw_image(
                &image.path,
                Rect::new(centred_x, top - image.height, image.width, image.height),
            ),
            Flowable::Spacer(_) | Flowable::PageBreak | Flowable::NextTemplate(_) => Ok(()),
        }
    }
}

impl From<Paragraph> for Flowable {
    fn from(para: Paragraph) -> Self {
        Flowable::Paragraph(para)
    }
}

impl From<Table> for Flowable {
    fn from(table: Table) -> Self {
        Flowable::Table(table)
    }
}

impl From<ImageBox> for Flowable {
    fn from(image: ImageBox) -> Self {
        Flowable::Image(image)
    }
}

impl fmt::Display for Flowable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flowable::Paragraph(para) => {
                let text = para.text();
                let preview: String = text.chars().take(30).collect();
                write!(f, "Paragraph({preview:?})")
            }
            Flowable::Table(table) => write!(f, "Table({}x{})", table.rows(), table.cols()),
            Flowable::Image(image) => write!(f, "Image({})", image.path.display()),
            Flowable::Spacer(height) => write!(f, "Spacer({height:.1})"),
            Flowable::PageBreak => write!(f, "PageBreak"),
            Flowable::NextTemplate(id) => write!(f, "NextTemplate({})", id.name()),
        }
    }
}
