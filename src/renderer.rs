//! PDF document writer
//!
//! Owns the pdf-writer `Pdf`, hands out object ids and turns each finished
//! page canvas into a page object whose Resources list the fonts and the
//! images drawn on it. Object 1 is the catalog, object 2 the page tree.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use pdf_writer::{Finish, Pdf, Ref, TextStr};

use crate::canvas::{PaintMode, PdfCanvas};
use crate::error::{ReportError, ReportResult};
use crate::font_registry::{FontLibrary, FontRegistry};
use crate::geometry::rect_to_pdf;
use crate::image_registry::ImageRegistry;
use crate::types::{Color, FontWeight, Rect, Size};

/// Sequential indirect object ids
#[derive(Debug, Clone)]
pub struct RefAllocator {
    next: i32,
}

impl RefAllocator {
    pub fn new(start: i32) -> Self {
        Self { next: start }
    }

    pub fn next(&mut self) -> Ref {
        let id = Ref::new(self.next);
        self.next += 1;
        id
    }
}

/// Metadata written to the document information dictionary
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

struct OpenPage {
    id: Ref,
    content_id: Ref,
    size: Size,
    canvas: PdfCanvas,
}

/// Drawing context for the page currently open
///
/// Bundles the canvas with the registries it needs so that flowables and
/// page hooks can draw text and images without knowing about object ids.
pub struct Surface<'a> {
    pub canvas: &'a mut PdfCanvas,
    pub fonts: &'a mut FontRegistry,
    pub images: &'a mut ImageRegistry,
    pdf: &'a mut Pdf,
    refs: &'a mut RefAllocator,
    page_size: Size,
}

impl Surface<'_> {
    pub fn page_size(&self) -> Size {
        self.page_size
    }

    /// Show a single run of text with its baseline at (x, y)
    pub fn draw_text(&mut self, x: f64, y: f64, weight: FontWeight, size: f64, color: Color, text: &str) {
        if text.is_empty() {
            return;
        }
        let encoded = self.fonts.encode(weight, text);
        let name = self.fonts.resource_name(weight).to_string();
        self.canvas.text(x, y, &name, size, color, &encoded);
    }

    /// Draw an image file scaled into the given box
    pub fn draw_image(&mut self, path: &Path, rect: Rect) -> ReportResult<()> {
        let name = self.images.use_image(self.pdf, self.refs, path)?;
        self.canvas.image(&name, rect);
        Ok(())
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.canvas.rect(rect, PaintMode::Fill, color, 0.0);
    }

    pub fn stroke_rect(&mut self, rect: Rect, width: f64, color: Color) {
        self.canvas.rect(rect, PaintMode::Stroke, color, width);
    }

    pub fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Color) {
        self.canvas.line(from, to, width, color);
    }
}

pub struct PdfRenderer {
    pdf: Pdf,
    refs: RefAllocator,
    page_tree_id: Ref,
    pages: Vec<Ref>,
    current: Option<OpenPage>,
    fonts: FontRegistry,
    images: ImageRegistry,
}

impl PdfRenderer {
    pub fn new(library: Arc<FontLibrary>) -> Self {
        let mut pdf = Pdf::new();
        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        pdf.catalog(catalog_id).pages(page_tree_id);

        let mut refs = RefAllocator::new(3);
        let fonts = FontRegistry::new(library, &mut refs);

        Self {
            pdf,
            refs,
            page_tree_id,
            pages: Vec::new(),
            current: None,
            fonts,
            images: ImageRegistry::new(),
        }
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_open_page(&self) -> bool {
        self.current.is_some()
    }

    /// Start a new page, closing the one currently open
    pub fn begin_page(&mut self, size: Size) {
        self.end_page();
        let id = self.refs.next();
        let content_id = self.refs.next();
        self.pages.push(id);
        self.current = Some(OpenPage {
            id,
            content_id,
            size,
            canvas: PdfCanvas::new(),
        });
        debug!("Opened page {}", self.pages.len());
    }

    /// Write the open page object and its content stream
    pub fn end_page(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        let content = open.canvas.finish();
        self.pdf.stream(open.content_id, &content);

        let mut page = self.pdf.page(open.id);
        page.media_box(rect_to_pdf(&Rect::new(0.0, 0.0, open.size.width, open.size.height)));
        page.parent(self.page_tree_id);
        page.contents(open.content_id);
        {
            let mut resources = page.resources();
            self.fonts.write_resources(&mut resources);
            self.images.write_page_resources(&mut resources);
        }
        page.finish();
        self.images.end_page();
    }

    /// Drawing context for the open page
    pub fn surface(&mut self) -> ReportResult<Surface<'_>> {
        let open = self
            .current
            .as_mut()
            .ok_or_else(|| ReportError::Layout("no page is open".to_string()))?;
        Ok(Surface {
            canvas: &mut open.canvas,
            fonts: &mut self.fonts,
            images: &mut self.images,
            pdf: &mut self.pdf,
            refs: &mut self.refs,
            page_size: open.size,
        })
    }

    /// Close the last page, write fonts and the page tree, return the bytes
    pub fn finish(mut self, info: &DocumentInfo) -> Vec<u8> {
        self.end_page();
        self.fonts.write_fonts(&mut self.pdf, &mut self.refs);

        let count = self.pages.len() as i32;
        self.pdf
            .pages(self.page_tree_id)
            .kids(self.pages.iter().copied())
            .count(count);

        if info.title.is_some() || info.author.is_some() || info.subject.is_some() || info.creator.is_some() {
            let info_id = self.refs.next();
            let mut dict = self.pdf.document_info(info_id);
            if let Some(title) = &info.title {
                dict.title(TextStr(title));
            }
            if let Some(author) = &info.author {
                dict.author(TextStr(author));
            }
            if let Some(subject) = &info.subject {
                dict.subject(TextStr(subject));
            }
            if let Some(creator) = &info.creator {
                dict.creator(TextStr(creator));
            }
        }

        let bytes = self.pdf.finish();
        info!(
            "PDF generated: {} pages, {} images, {} bytes",
            count,
            self.images.len(),
            bytes.len()
        );
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> PdfRenderer {
        PdfRenderer::new(Arc::new(FontLibrary::builtin()))
    }

    #[test]
    fn test_ref_allocator_is_sequential() {
        let mut refs = RefAllocator::new(5);
        assert_eq!(refs.next(), Ref::new(5));
        assert_eq!(refs.next(), Ref::new(6));
    }

    #[test]
    fn test_surface_requires_open_page() {
        let mut renderer = renderer();
        assert!(renderer.surface().is_err());
        renderer.begin_page(Size::new(595.0, 842.0));
        assert!(renderer.surface().is_ok());
    }

    #[test]
    fn test_pages_are_counted() {
        let mut renderer = renderer();
        renderer.begin_page(Size::new(595.0, 842.0));
        renderer.begin_page(Size::new(595.0, 842.0));
        assert_eq!(renderer.page_count(), 2);
        let bytes = renderer.finish(&DocumentInfo::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-"));
        assert!(text.contains("/Count 2"));
    }

    #[test]
    fn test_text_is_written_with_font_resource() {
        let mut renderer = renderer();
        renderer.begin_page(Size::new(595.0, 842.0));
        renderer
            .surface()
            .unwrap()
            .draw_text(10.0, 10.0, FontWeight::Bold, 10.0, Color::black(), "Hola");
        let bytes = renderer.finish(&DocumentInfo {
            title: Some("Informe".to_string()),
            ..Default::default()
        });
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/F2 10 Tf"));
        assert!(text.contains("/Helvetica-Bold"));
        assert!(text.contains("(Informe)"));
    }
}
