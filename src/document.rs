//! Paginated document assembly
//!
//! `DocTemplate` owns the page templates and lays a story of flowables out
//! page by page. The first page opens before any flowable is read, using the
//! first template; every later page opens only when content arrives for it.
//! `NextTemplate` is fixed as the template of the following page when the
//! current page ends. A marker read while no page is open therefore applies
//! to the page after the next one, and the page already open never changes.

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::error::{ReportError, ReportResult};
use crate::flowable::Flowable;
use crate::font_registry::FontLibrary;
use crate::renderer::{DocumentInfo, PdfRenderer, Surface};
use crate::template::{PageHook, PageTemplate, TemplateId};
use crate::types::Size;

const EPSILON: f64 = 1e-6;

/// What a page hook knows about the page it paints on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// 1-based page number
    pub number: usize,
    pub template: TemplateId,
    pub page_size: Size,
}

/// Paints the header and footer hooks of a template
pub trait PageDecorator {
    fn decorate(&self, hook: PageHook, surface: &mut Surface<'_>, page: &PageInfo) -> ReportResult<()>;
}

/// Leaves every page undecorated
pub struct NoDecoration;

impl PageDecorator for NoDecoration {
    fn decorate(&self, _hook: PageHook, _surface: &mut Surface<'_>, _page: &PageInfo) -> ReportResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRecord {
    pub number: usize,
    pub template: TemplateId,
    /// Hooks painted on this page, in painting order
    pub hooks: Vec<PageHook>,
}

/// Per-page record of a finished build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    pub pages: Vec<PageRecord>,
    pub bytes_written: usize,
}

impl BuildSummary {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn templates(&self) -> Vec<TemplateId> {
        self.pages.iter().map(|page| page.template).collect()
    }
}

pub struct DocTemplate {
    templates: Vec<PageTemplate>,
    page_size: Size,
    library: Arc<FontLibrary>,
    info: DocumentInfo,
}

impl DocTemplate {
    pub fn new(
        templates: Vec<PageTemplate>,
        page_size: Size,
        library: Arc<FontLibrary>,
    ) -> ReportResult<Self> {
        if templates.is_empty() {
            return Err(ReportError::Config("no page templates".to_string()));
        }
        let mut seen = BTreeSet::new();
        for template in &templates {
            if !seen.insert(template.id) {
                return Err(ReportError::Config(format!(
                    "duplicate page template {}",
                    template.id
                )));
            }
        }
        Ok(Self {
            templates,
            page_size,
            library,
            info: DocumentInfo::default(),
        })
    }

    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    pub fn template(&self, id: TemplateId) -> ReportResult<&PageTemplate> {
        self.templates
            .iter()
            .find(|template| template.id == id)
            .ok_or_else(|| ReportError::UnknownTemplate(id.name().to_string()))
    }

    pub fn templates(&self) -> &[PageTemplate] {
        &self.templates
    }

    /// Lay out the story and write the PDF to `out`
    ///
    /// Nothing is written when layout fails.
    pub fn build<W: Write>(
        &self,
        story: Vec<Flowable>,
        decorator: &dyn PageDecorator,
        out: &mut W,
    ) -> ReportResult<BuildSummary> {
        let (bytes, mut summary) = self.render(story, decorator)?;
        out.write_all(&bytes)?;
        out.flush()?;
        summary.bytes_written = bytes.len();
        info!("Report written: {} pages, {} bytes", summary.page_count(), bytes.len());
        Ok(summary)
    }

    /// Lay out the story and return the PDF bytes
    pub fn render(
        &self,
        story: Vec<Flowable>,
        decorator: &dyn PageDecorator,
    ) -> ReportResult<(Vec<u8>, BuildSummary)> {
        let mut paginator = Paginator {
            doc: self,
            decorator,
            renderer: PdfRenderer::new(Arc::clone(&self.library)),
            open: None,
            last_template: self.templates[0].id,
            pending: None,
            committed: None,
            summary: BuildSummary::default(),
        };

        paginator.begin_page()?;
        for flowable in story {
            paginator.add(flowable)?;
        }
        paginator.end_page()?;

        let Paginator { renderer, summary, .. } = paginator;
        let bytes = renderer.finish(&self.info);
        Ok((bytes, summary))
    }
}

struct OpenFrame {
    template: TemplateId,
    number: usize,
    /// Top edge for the next flowable
    cursor: f64,
    /// Whether anything has been placed in the frame
    used: bool,
}

struct Paginator<'a> {
    doc: &'a DocTemplate,
    decorator: &'a dyn PageDecorator,
    renderer: PdfRenderer,
    open: Option<OpenFrame>,
    last_template: TemplateId,
    /// Set by `NextTemplate`, fixed for the following page when a page ends
    pending: Option<TemplateId>,
    /// Template of the next page to open
    committed: Option<TemplateId>,
    summary: BuildSummary,
}

impl Paginator<'_> {
    fn page_info(&self, template: TemplateId, number: usize) -> PageInfo {
        PageInfo {
            number,
            template,
            page_size: self.doc.page_size,
        }
    }

    fn begin_page(&mut self) -> ReportResult<()> {
        self.end_page()?;
        let doc = self.doc;
        let id = self.committed.take().unwrap_or(self.last_template);
        let template = doc.template(id)?;
        self.last_template = id;

        self.renderer.begin_page(doc.page_size);
        let number = self.renderer.page_count();
        let info = self.page_info(id, number);
        debug!("Page {} uses template {}", number, id);

        let mut surface = self.renderer.surface()?;
        for hook in &template.on_page {
            surface.canvas.save_state();
            self.decorator.decorate(*hook, &mut surface, &info)?;
            surface.canvas.restore_state();
        }

        self.summary.pages.push(PageRecord {
            number,
            template: id,
            hooks: template.on_page.clone(),
        });
        self.open = Some(OpenFrame {
            template: id,
            number,
            cursor: template.frame.content_area().top(),
            used: false,
        });
        Ok(())
    }

    fn end_page(&mut self) -> ReportResult<()> {
        let Some(frame) = self.open.take() else {
            return Ok(());
        };
        let doc = self.doc;
        let template = doc.template(frame.template)?;
        let info = self.page_info(frame.template, frame.number);

        let mut surface = self.renderer.surface()?;
        for hook in &template.on_page_end {
            surface.canvas.save_state();
            self.decorator.decorate(*hook, &mut surface, &info)?;
            surface.canvas.restore_state();
        }
        if let Some(record) = self.summary.pages.last_mut() {
            record.hooks.extend(template.on_page_end.iter().copied());
        }
        self.renderer.end_page();
        self.committed = self.pending.take();
        Ok(())
    }

    fn add(&mut self, flowable: Flowable) -> ReportResult<()> {
        if flowable.is_control() {
            self.control(flowable)
        } else {
            self.place(flowable)
        }
    }

    fn control(&mut self, marker: Flowable) -> ReportResult<()> {
        match marker {
            Flowable::NextTemplate(id) => {
                self.doc.template(id)?;
                self.pending = Some(id);
                Ok(())
            }
            Flowable::PageBreak => self.end_page(),
            _ => Ok(()),
        }
    }

    fn place(&mut self, mut flowable: Flowable) -> ReportResult<()> {
        loop {
            if self.open.is_none() {
                self.begin_page()?;
            }
            let (template, cursor, used) = match &self.open {
                Some(frame) => (frame.template, frame.cursor, frame.used),
                None => return Err(ReportError::Layout("no open frame".to_string())),
            };
            let area = self.doc.template(template)?.frame.content_area();
            let available = cursor - area.y;
            let size = flowable.wrap(area.width, self.doc.library.as_ref());

            if size.height <= available + EPSILON {
                let mut surface = self.renderer.surface()?;
                flowable.draw(&mut surface, &area, cursor)?;
                if let Some(frame) = self.open.as_mut() {
                    frame.cursor -= size.height;
                    frame.used = true;
                }
                return Ok(());
            }

            if let Flowable::Spacer(_) = flowable {
                // A spacer that overflows ends the frame and is dropped
                debug!("Dropping {} at the bottom of page", flowable);
                if used {
                    self.end_page()?;
                }
                return Ok(());
            }

            if used {
                self.end_page()?;
                continue;
            }

            match flowable.split(area.width, available, self.doc.library.as_ref()) {
                Some((head, tail)) => {
                    debug!("Split {} across pages", flowable);
                    let head_height = head.wrap(area.width, self.doc.library.as_ref()).height;
                    let mut surface = self.renderer.surface()?;
                    head.draw(&mut surface, &area, cursor)?;
                    if let Some(frame) = self.open.as_mut() {
                        frame.cursor -= head_height;
                        frame.used = true;
                    }
                    self.end_page()?;
                    flowable = tail;
                }
                None => {
                    return Err(ReportError::Layout(format!(
                        "{} of height {:.1}pt does not fit the {:.1}pt frame of template {}",
                        flowable, size.height, available, template
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::geometry::DocumentGeometry;
    use crate::paragraph::Paragraph;
    use crate::styles::STANDARD;
    use crate::table::{Cell, Table};

    struct Recorder {
        calls: RefCell<Vec<(usize, PageHook)>>,
    }

    impl PageDecorator for Recorder {
        fn decorate(&self, hook: PageHook, _surface: &mut Surface<'_>, page: &PageInfo) -> ReportResult<()> {
            self.calls.borrow_mut().push((page.number, hook));
            Ok(())
        }
    }

    fn doc() -> DocTemplate {
        let geometry = DocumentGeometry::default();
        DocTemplate::new(
            PageTemplate::report_set(&geometry),
            geometry.page_size(),
            Arc::new(FontLibrary::builtin()),
        )
        .unwrap()
    }

    fn para(text: &str) -> Flowable {
        Flowable::Paragraph(Paragraph::new(text, STANDARD))
    }

    #[test]
    fn test_empty_story_has_one_page() {
        let (bytes, summary) = doc().render(Vec::new(), &NoDecoration).unwrap();
        assert_eq!(summary.page_count(), 1);
        assert_eq!(summary.templates(), vec![TemplateId::Measurement]);
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_template_switch_applies_to_next_page() {
        let story = vec![
            para("uno"),
            Flowable::NextTemplate(TemplateId::Normal),
            para("sigue en la primera"),
            Flowable::PageBreak,
            para("dos"),
        ];
        let (_, summary) = doc().render(story, &NoDecoration).unwrap();
        assert_eq!(
            summary.templates(),
            vec![TemplateId::Measurement, TemplateId::Normal]
        );
    }

    #[test]
    fn test_template_after_break_waits_for_the_following_page() {
        let story = vec![
            para("carta"),
            Flowable::NextTemplate(TemplateId::Measurement),
            Flowable::PageBreak,
            Flowable::NextTemplate(TemplateId::MeasurementTwo),
            para("máquina"),
            Flowable::PageBreak,
            para("continuación"),
        ];
        let (_, summary) = doc().render(story, &NoDecoration).unwrap();
        assert_eq!(
            summary.templates(),
            vec![
                TemplateId::Measurement,
                TemplateId::Measurement,
                TemplateId::MeasurementTwo
            ]
        );
    }

    #[test]
    fn test_switch_sequence_with_distinct_templates() {
        let story = vec![
            Flowable::NextTemplate(TemplateId::Normal),
            para("uno"),
            Flowable::PageBreak,
            Flowable::NextTemplate(TemplateId::MeasurementTwo),
            para("dos"),
            Flowable::PageBreak,
            para("tres"),
            Flowable::PageBreak,
            para("cuatro"),
        ];
        let (_, summary) = doc().render(story, &NoDecoration).unwrap();
        assert_eq!(
            summary.templates(),
            vec![
                TemplateId::Measurement,
                TemplateId::Normal,
                TemplateId::MeasurementTwo,
                TemplateId::MeasurementTwo
            ]
        );
    }

    #[test]
    fn test_trailing_page_break_adds_no_page() {
        let story = vec![para("uno"), Flowable::PageBreak];
        let (_, summary) = doc().render(story, &NoDecoration).unwrap();
        assert_eq!(summary.page_count(), 1);
    }

    #[test]
    fn test_hooks_run_on_every_page() {
        let recorder = Recorder { calls: RefCell::new(Vec::new()) };
        let story = vec![
            para("uno"),
            Flowable::NextTemplate(TemplateId::MeasurementTwo),
            Flowable::PageBreak,
            para("dos"),
        ];
        let (_, summary) = doc().render(story, &recorder).unwrap();
        assert_eq!(
            recorder.calls.into_inner(),
            vec![
                (1, PageHook::MachineHeader),
                (1, PageHook::Footer),
                (2, PageHook::StandardHeader),
                (2, PageHook::Footer),
            ]
        );
        assert_eq!(summary.pages[1].hooks, vec![PageHook::StandardHeader, PageHook::Footer]);
    }

    #[test]
    fn test_overflow_moves_to_new_page() {
        let rows = (0..60).map(|i| vec![Cell::from(format!("fila {i}"))]).collect();
        let table = Table::new(rows, vec![200.0]).with_row_heights(vec![20.0; 60]);
        let story = vec![Flowable::Table(table)];
        let (_, summary) = doc().render(story, &NoDecoration).unwrap();
        // 60 rows of 20pt never fit a single frame
        assert!(summary.page_count() >= 2);
        assert_eq!(summary.pages[1].template, TemplateId::Measurement);
    }

    #[test]
    fn test_unsplittable_oversize_is_layout_error() {
        let table = Table::new(vec![vec![Cell::from("x")]], vec![100.0]).with_row_heights(vec![2000.0]);
        let result = doc().render(vec![Flowable::Table(table)], &NoDecoration);
        assert!(matches!(result, Err(ReportError::Layout(_))));
    }

    #[test]
    fn test_duplicate_templates_rejected() {
        let geometry = DocumentGeometry::default();
        let mut templates = PageTemplate::report_set(&geometry);
        templates.push(templates[0].clone());
        let result = DocTemplate::new(templates, geometry.page_size(), Arc::new(FontLibrary::builtin()));
        assert!(matches!(result, Err(ReportError::Config(_))));
    }

    #[test]
    fn test_build_writes_to_sink() {
        let mut out = Vec::new();
        let summary = doc().build(vec![para("hola")], &NoDecoration, &mut out).unwrap();
        assert_eq!(summary.bytes_written, out.len());
        assert!(out.ends_with(b"%%EOF") || out.ends_with(b"%%EOF\n"));
    }
}
