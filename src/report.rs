//! Vibration analysis report builder
//!
//! `ReportBuilder` turns a [`ReportContext`] into the tables and paragraphs
//! of a report and paints the page decorations (page number, logo header,
//! contact footer) as a [`PageDecorator`]. Callers either push their own
//! flowables or use [`ReportBuilder::measurement_story`] for the standard
//! letter followed by one section per measured machine.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::config::ReportConfig;
use crate::context::{MeasurementRow, PointReading, ReportContext};
use crate::document::{BuildSummary, DocTemplate, PageDecorator, PageInfo};
use crate::error::{ReportError, ReportResult};
use crate::flowable::{Flowable, ImageBox};
use crate::font_registry::FontLibrary;
use crate::geometry::{cm, DocumentGeometry};
use crate::models::GraphKind;
use crate::paragraph::{Inline, Paragraph};
use crate::renderer::{DocumentInfo, Surface};
use crate::severity;
use crate::styles::{
    long_date, ADDRESS, BLACK_BOLD, BLACK_BOLD_CENTER, BLACK_SMALL, BLUE_FOOTER, BLUE_HEADER,
    CELPHONE, EMAIL, FOOTER_CITY, GREEN_SMALL, LETTER_CITY, LINK_BLUE, PHONE, STANDARD,
    STANDARD_CENTER, STANDARD_HEADER, TABLE_BLUE, WEBSITE, WHATSAPP,
};
use crate::table::{Cell, Table, TableCommand};
use crate::template::{PageHook, PageTemplate, TemplateId};
use crate::types::{Alignment, Color, FontWeight, VAlign};

pub const READINGS_TITLE: &str = "LECTURAS REGISTRADAS (@ptitude - SKF)";
pub const TENDENCY_TITLE: &str = "GRAFICAS TENDENCIAS (En el tiempo)";
pub const ESPECTRA_TITLE: &str = "GRAFICAS ESPECTROS";
pub const TIME_SIGNAL_TITLE: &str = "GRAFICAS SEÑAL EN EL TIEMPO";

const SIGNATURE_LINE_WIDTH: usize = 36;
const FOOTER_LINE_WIDTH: usize = 80;

/// Logo and partner badge drawn in the machine header
#[derive(Debug, Clone, PartialEq)]
pub struct ReportAssets {
    logo: PathBuf,
    badge: PathBuf,
}

impl ReportAssets {
    /// Both files must exist
    pub fn new(logo: impl Into<PathBuf>, badge: impl Into<PathBuf>) -> ReportResult<Self> {
        let logo = logo.into();
        let badge = badge.into();
        for path in [&logo, &badge] {
            if !path.is_file() {
                return Err(ReportError::MissingAsset(path.display().to_string()));
            }
        }
        Ok(Self { logo, badge })
    }

    pub fn from_config(config: &ReportConfig) -> ReportResult<Self> {
        Self::new(config.logo_path(), config.badge_path())
    }

    pub fn logo(&self) -> &Path {
        &self.logo
    }

    pub fn badge(&self) -> &Path {
        &self.badge
    }
}

pub struct ReportBuilder {
    context: ReportContext,
    assets: ReportAssets,
    geometry: DocumentGeometry,
    library: Arc<FontLibrary>,
    story: Vec<Flowable>,
}

impl ReportBuilder {
    pub fn new(
        context: ReportContext,
        assets: ReportAssets,
        geometry: DocumentGeometry,
        library: Arc<FontLibrary>,
    ) -> ReportResult<Self> {
        geometry.validate().map_err(ReportError::Config)?;
        debug!(
            "Report for {} with {} rows, dated {}",
            context.company(),
            context.rows().len(),
            context.report_date()
        );
        Ok(Self {
            context,
            assets,
            geometry,
            library,
            story: Vec::new(),
        })
    }

    pub fn context(&self) -> &ReportContext {
        &self.context
    }

    pub fn story(&self) -> &[Flowable] {
        &self.story
    }

    pub fn push(&mut self, flowable: impl Into<Flowable>) -> &mut Self {
        self.story.push(flowable.into());
        self
    }

    pub fn extend(&mut self, flowables: impl IntoIterator<Item = Flowable>) -> &mut Self {
        self.story.extend(flowables);
        self
    }

    fn width(&self) -> f64 {
        self.geometry.width()
    }

    // ===== Page decorations =====

    /// Logo spanning both rows, badge and caption, report date and company
    pub fn header_table(&self) -> Table {
        let data = vec![
            vec![
                Cell::from(ImageBox::new(self.assets.logo(), cm(8.65), cm(2.51))),
                Cell::from(Paragraph::new("Con tecnología", GREEN_SMALL)),
                Cell::from(Paragraph::new(self.context.report_date().to_uppercase(), STANDARD_HEADER)),
            ],
            vec![
                Cell::Empty,
                Cell::from(ImageBox::new(self.assets.badge(), cm(1.76), cm(0.47))),
                Cell::from(Paragraph::new(self.context.company().to_uppercase(), BLUE_HEADER)),
            ],
        ];
        Table::new(data, vec![cm(9.0), cm(2.5), cm(6.5)])
            .with_row_heights(vec![cm(1.26), cm(1.26)])
            .with_style(vec![
                TableCommand::Align((0, 0), (0, -1), Alignment::Left),
                TableCommand::Valign((0, 0), (0, -1), VAlign::Middle),
                TableCommand::Align((1, 0), (1, -1), Alignment::Center),
                TableCommand::Valign((1, 0), (1, 0), VAlign::Bottom),
                TableCommand::Valign((1, -1), (1, -1), VAlign::Top),
                TableCommand::Valign((2, 0), (2, -1), VAlign::Middle),
                TableCommand::Align((2, 0), (2, -1), Alignment::Left),
                TableCommand::Span((0, 0), (0, -1)),
            ])
    }

    /// Rule, address line and web/e-mail line
    pub fn footer_table(&self) -> Table {
        let line_one = Paragraph::new("_".repeat(FOOTER_LINE_WIDTH), BLUE_FOOTER);
        let line_two = Paragraph::new(
            format!("{ADDRESS} {PHONE} {CELPHONE} {WHATSAPP}"),
            BLACK_SMALL,
        );
        let line_three = Paragraph::from_inlines(
            vec![
                Inline::text(format!("{WEBSITE} E-mail: ")),
                Inline::colored(EMAIL, LINK_BLUE),
                Inline::text(format!(" {FOOTER_CITY}")),
            ],
            GREEN_SMALL,
        );
        Table::new(
            vec![
                vec![Cell::from(line_one)],
                vec![Cell::from(line_two)],
                vec![Cell::from(line_three)],
            ],
            vec![self.width()],
        )
        .with_row_heights(vec![cm(0.5), cm(0.4), cm(0.4)])
        .with_style(vec![
            TableCommand::Valign((0, 0), (-1, -1), VAlign::Middle),
            TableCommand::Align((0, 0), (-1, -1), Alignment::Center),
        ])
    }

    fn draw_page_number(&self, surface: &mut Surface<'_>, page: &PageInfo) -> ReportResult<()> {
        let number = Paragraph::new(page.number.to_string(), BLACK_SMALL);
        number.draw(
            surface,
            self.geometry.left(),
            cm(self.geometry.page_number_top),
            self.width(),
        )
    }

    // ===== Letter =====

    /// City and date line, then the addressee block
    pub fn letter_header(&self) -> Vec<Flowable> {
        let requester = self.context.requester();
        let date = Paragraph::new(
            format!("{LETTER_CITY}, {},", long_date(self.context.issued_on())),
            STANDARD,
        );
        let addressee = Paragraph::from_inlines(
            vec![
                Inline::text("Ingeniero:"),
                Inline::Break,
                Inline::bold(requester.full_name().to_uppercase()),
                Inline::Break,
                Inline::text("Dpto. de Mantenimiento"),
                Inline::Break,
                Inline::text("Email: "),
                Inline::colored(requester.email.clone(), LINK_BLUE),
            ],
            STANDARD,
        );
        vec![
            Flowable::Paragraph(date),
            Flowable::Spacer(cm(1.0)),
            Flowable::Paragraph(addressee),
        ]
    }

    /// Signature line, upper-cased name and certifications per engineer;
    /// the second column stays blank when there is a single engineer
    pub fn signatures_table(&self) -> Table {
        let line = "_".repeat(SIGNATURE_LINE_WIDTH);
        let column = |first_name: &str, last_name: &str, certifications: &str| {
            [
                Cell::from(Paragraph::new(line.clone(), STANDARD)),
                Cell::from(Paragraph::new(
                    format!("{first_name} {last_name}").trim().to_uppercase(),
                    BLACK_BOLD,
                )),
                Cell::from(Paragraph::new(certifications, STANDARD)),
            ]
        };

        let one = self.context.engineer_one();
        let first = column(one.first_name.as_str(), one.last_name.as_str(), one.certifications.as_str());
        let second = match self.context.engineer_two() {
            Some(two) => column(two.first_name.as_str(), two.last_name.as_str(), two.certifications.as_str()),
            None => [Cell::Empty, Cell::Empty, Cell::Empty],
        };

        let data = first
            .into_iter()
            .zip(second)
            .map(|(left, right)| vec![left, right])
            .collect();
        Table::new(data, vec![cm(9.0), cm(9.0)])
            .with_row_heights(vec![cm(0.4), cm(0.5), cm(0.5)])
            .with_style(vec![
                TableCommand::Valign((0, 0), (-1, -1), VAlign::Middle),
                TableCommand::Align((0, 0), (-1, -1), Alignment::Left),
            ])
    }

    /// Static velocity / machine class reference chart
    pub fn severity_table(&self) -> Table {
        severity::severity_table()
    }

    // ===== Measurement sections =====

    pub fn analysis_table(&self, analysis: &str, recommendation: &str) -> Table {
        let data = vec![
            vec![Cell::from(Paragraph::new("ANÁLISIS DE VIBRACIÓN", STANDARD_CENTER))],
            vec![Cell::from(Paragraph::new(analysis, STANDARD))],
            vec![Cell::from(Paragraph::new(
                "CORRECTIVOS Y/O RECOMENDACIONES",
                STANDARD_CENTER,
            ))],
            vec![Cell::from(Paragraph::new(recommendation, STANDARD))],
        ];
        Table::new(data, vec![self.width()]).with_style(vec![
            TableCommand::Valign((0, 0), (-1, -1), VAlign::Middle),
            TableCommand::Align((0, 0), (-1, -1), Alignment::Center),
        ])
    }

    /// Upper-cased title over a 17 x 6 cm graph
    pub fn graph_table(&self, title: &str, graph: &Path) -> Table {
        let data = vec![
            vec![Cell::from(Paragraph::new(title.to_uppercase(), STANDARD_CENTER))],
            vec![Cell::from(ImageBox::new(graph, cm(17.0), cm(6.0)))],
        ];
        Table::new(data, vec![self.width()])
            .with_row_heights(vec![cm(0.5), cm(7.0)])
            .with_style(vec![
                TableCommand::Valign((0, 0), (-1, -1), VAlign::Middle),
                TableCommand::Align((0, 0), (-1, -1), Alignment::Center),
                TableCommand::Background((0, 0), (0, 0), TABLE_BLUE),
                TableCommand::Grid((0, 0), (-1, -1), 0.25, Color::black()),
            ])
    }

    /// Schematic diagram next to the machine photo
    pub fn pictures_table(&self, diagram: &Path, machine_image: &Path) -> Table {
        let data = vec![
            vec![
                Cell::from(Paragraph::new("DIAGRAMA ESQUEMATICO", STANDARD)),
                Cell::from(Paragraph::new("IMAGEN MAQUINA", STANDARD)),
            ],
            vec![
                Cell::from(ImageBox::new(diagram, cm(7.0), cm(6.0))),
                Cell::from(ImageBox::new(machine_image, cm(7.0), cm(6.0))),
            ],
        ];
        Table::new(data, vec![cm(9.0), cm(9.0)])
            .with_row_heights(vec![cm(0.5), cm(6.0)])
            .with_style(vec![
                TableCommand::Valign((0, 0), (-1, -1), VAlign::Middle),
                TableCommand::Align((0, 0), (-1, -1), Alignment::Center),
                TableCommand::Grid((0, 0), (-1, -1), 0.25, Color::black()),
                TableCommand::Background((0, 0), (1, 0), TABLE_BLUE),
            ])
    }

    /// Point, position, type and overall value of every reading
    pub fn readings_table(&self, readings: &[PointReading]) -> Table {
        let mut data = vec![["Punto", "Posición", "Tipo", "Valor (mm/s)"]
            .into_iter()
            .map(Cell::from)
            .collect::<Vec<_>>()];
        for reading in readings {
            let value = reading
                .value
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| "-".to_string());
            data.push(vec![
                Cell::from(reading.number.to_string()),
                Cell::from(reading.position.code()),
                Cell::from(reading.point_type.code()),
                Cell::from(value),
            ]);
        }
        let rows = data.len();
        Table::new(data, vec![self.width() / 4.0; 4])
            .with_row_heights(vec![cm(0.5); rows])
            .with_style(vec![
                TableCommand::Valign((0, 0), (-1, -1), VAlign::Middle),
                TableCommand::Align((0, 0), (-1, -1), Alignment::Center),
                TableCommand::FontName((0, 0), (-1, 0), FontWeight::Bold),
                TableCommand::Background((0, 0), (-1, 0), TABLE_BLUE),
                TableCommand::Grid((0, 0), (-1, -1), 0.25, Color::black()),
            ])
    }

    pub fn readings_title(&self) -> Paragraph {
        Paragraph::new(READINGS_TITLE, STANDARD_CENTER)
    }

    pub fn tendency_title(&self) -> Paragraph {
        Paragraph::new(TENDENCY_TITLE, STANDARD_CENTER)
    }

    pub fn espectra_title(&self) -> Paragraph {
        Paragraph::new(ESPECTRA_TITLE, STANDARD_CENTER)
    }

    pub fn time_signal_title(&self) -> Paragraph {
        Paragraph::new(TIME_SIGNAL_TITLE, STANDARD_CENTER)
    }

    fn machine_section(&self, row: &MeasurementRow) -> Vec<Flowable> {
        let gap = || Flowable::Spacer(cm(0.5));
        let machine = &row.machine;
        let mut section = vec![
            Flowable::Paragraph(Paragraph::new(
                format!("{} - {}", machine.name, row.measurement_type.label()).to_uppercase(),
                BLACK_BOLD_CENTER,
            )),
            gap(),
        ];

        if let Some(pictures) = &row.pictures {
            section.push(Flowable::Table(self.pictures_table(&pictures.diagram, &pictures.image)));
            section.push(gap());
        }

        if !row.readings.is_empty() {
            section.push(Flowable::Paragraph(self.readings_title()));
            section.push(Flowable::Table(self.readings_table(&row.readings)));
            section.push(gap());
        }

        for (kind, title) in [
            (GraphKind::Tendency, self.tendency_title()),
            (GraphKind::Espectra, self.espectra_title()),
            (GraphKind::TimeSignal, self.time_signal_title()),
        ] {
            let mut graphs = row.graphs_of(kind).peekable();
            if graphs.peek().is_none() {
                continue;
            }
            section.push(Flowable::Paragraph(title));
            for graph in graphs {
                section.push(Flowable::Table(self.graph_table(&graph.title(), &graph.image)));
                section.push(gap());
            }
        }

        section.push(Flowable::Table(
            self.analysis_table(&row.analysis, &row.recommendation),
        ));
        section
    }

    /// The standard report: letter with the severity chart and signatures on
    /// the first page, then one section per row starting on a page with the
    /// machine header and continuing on standard pages
    pub fn measurement_story(&self) -> Vec<Flowable> {
        let mut story = self.letter_header();
        story.push(Flowable::Spacer(cm(1.0)));
        story.push(Flowable::Table(self.severity_table()));
        story.push(Flowable::Spacer(cm(1.5)));
        story.push(Flowable::Table(self.signatures_table()));

        for row in self.context.rows() {
            story.push(Flowable::NextTemplate(TemplateId::Measurement));
            story.push(Flowable::PageBreak);
            story.push(Flowable::NextTemplate(TemplateId::MeasurementTwo));
            story.extend(self.machine_section(row));
        }
        story
    }

    // ===== Build =====

    fn doc_template(&self) -> ReportResult<DocTemplate> {
        let info = DocumentInfo {
            title: Some(format!("Informe de vibraciones {}", self.context.company())),
            author: Some(self.context.engineer_one().full_name()),
            subject: Some(self.context.report_date().to_string()),
            creator: Some(format!("vibro_report {}", env!("CARGO_PKG_VERSION"))),
        };
        Ok(DocTemplate::new(
            PageTemplate::report_set(&self.geometry),
            self.geometry.page_size(),
            Arc::clone(&self.library),
        )?
        .with_info(info))
    }

    /// Render the accumulated story into `out`
    pub fn build<W: Write>(&self, out: &mut W) -> ReportResult<BuildSummary> {
        let doc = self.doc_template()?;
        doc.build(self.story.clone(), self, out)
    }

    /// Render into a file; the file is only created once layout succeeded
    pub fn build_to_path(&self, path: &Path) -> ReportResult<BuildSummary> {
        let doc = self.doc_template()?;
        let (bytes, mut summary) = doc.render(self.story.clone(), self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        summary.bytes_written = bytes.len();
        info!("Report saved to {} ({} pages)", path.display(), summary.page_count());
        Ok(summary)
    }
}

impl PageDecorator for ReportBuilder {
    fn decorate(&self, hook: PageHook, surface: &mut Surface<'_>, page: &PageInfo) -> ReportResult<()> {
        match hook {
            PageHook::MachineHeader => {
                self.draw_page_number(surface, page)?;
                let table = self.header_table();
                let height = table.wrap(surface.fonts.library()).height;
                table.draw(
                    surface,
                    self.geometry.left(),
                    cm(self.geometry.header_top) - height,
                )
            }
            PageHook::StandardHeader => self.draw_page_number(surface, page),
            PageHook::Footer => {
                let table = self.footer_table();
                let height = table.wrap(surface.fonts.library()).height;
                table.draw(
                    surface,
                    self.geometry.left(),
                    (self.geometry.bottom() - height) / 2.0,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{engineer, requester, row};
    use chrono::NaiveDate;
    use image::{ImageOutputFormat, RgbImage};

    fn write_jpeg(path: &Path) {
        let img = RgbImage::from_pixel(8, 4, image::Rgb([20, 120, 200]));
        let mut file = File::create(path).unwrap();
        img.write_to(&mut file, ImageOutputFormat::Jpeg(90)).unwrap();
    }

    fn builder(rows: Vec<MeasurementRow>, dir: &Path) -> ReportBuilder {
        let logo = dir.join("logo.jpg");
        let badge = dir.join("skf.jpg");
        write_jpeg(&logo);
        write_jpeg(&badge);
        let context = ReportContext::new(
            rows,
            requester(),
            NaiveDate::from_ymd_opt(2020, 3, 20).unwrap(),
        )
        .unwrap();
        ReportBuilder::new(
            context,
            ReportAssets::new(logo, badge).unwrap(),
            DocumentGeometry::default(),
            Arc::new(FontLibrary::builtin()),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_asset_rejected() {
        let result = ReportAssets::new("/nonexistent/logo.jpg", "/nonexistent/skf.jpg");
        assert!(matches!(result, Err(ReportError::MissingAsset(_))));
    }

    #[test]
    fn test_single_engineer_signature() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(vec![row(1, 2)], dir.path());
        let table = builder.signatures_table();
        assert_eq!(table.rows(), 3);
        for r in 0..3 {
            assert!(matches!(table.cell(0, r), Some(Cell::Paragraph(_))));
            assert_eq!(table.cell(1, r), Some(&Cell::Empty));
        }
        match table.cell(0, 1) {
            Some(Cell::Paragraph(name)) => assert_eq!(name.text(), "ANA PÉREZ"),
            other => panic!("unexpected cell {other:?}"),
        }
    }

    #[test]
    fn test_two_engineer_signature() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = row(1, 2);
        first.engineer_two = Some(engineer("Juan", "Ríos"));
        let builder = builder(vec![first], dir.path());
        let table = builder.signatures_table();
        match table.cell(1, 1) {
            Some(Cell::Paragraph(name)) => assert_eq!(name.text(), "JUAN RÍOS"),
            other => panic!("unexpected cell {other:?}"),
        }
        match table.cell(1, 2) {
            Some(Cell::Paragraph(cert)) => assert_eq!(cert.text(), "ISO 18436-2 CAT II"),
            other => panic!("unexpected cell {other:?}"),
        }
    }

    #[test]
    fn test_header_table_layout() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(vec![row(1, 2)], dir.path());
        let table = builder.header_table();
        assert_eq!(table.rows(), 2);
        assert_eq!(table.cols(), 3);
        assert!(matches!(table.cell(0, 0), Some(Cell::Image(_))));
        assert_eq!(table.cell(0, 1), Some(&Cell::Empty));
        match table.cell(2, 1) {
            Some(Cell::Paragraph(company)) => assert_eq!(company.text(), "ACME"),
            other => panic!("unexpected cell {other:?}"),
        }
        match table.cell(2, 0) {
            Some(Cell::Paragraph(date)) => assert_eq!(date.text(), "2 DE MARZO DE 2020"),
            other => panic!("unexpected cell {other:?}"),
        }
        assert_eq!(table.spans().len(), 1);
    }

    #[test]
    fn test_letter_header() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(vec![row(1, 2)], dir.path());
        let letter = builder.letter_header();
        assert_eq!(letter.len(), 3);
        match &letter[0] {
            Flowable::Paragraph(date) => assert_eq!(date.text(), "Medellín, 20 de marzo de 2020,"),
            other => panic!("unexpected flowable {other}"),
        }
        match &letter[2] {
            Flowable::Paragraph(block) => {
                assert!(block.text().contains("LUIS GÓMEZ"));
                assert!(block.text().ends_with("luis@acme.co"));
            }
            other => panic!("unexpected flowable {other}"),
        }
    }

    #[test]
    fn test_graph_title_upper() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(vec![row(1, 2)], dir.path());
        let table = builder.graph_table("Espectro motor", Path::new("g.png"));
        match table.cell(0, 0) {
            Some(Cell::Paragraph(title)) => assert_eq!(title.text(), "ESPECTRO MOTOR"),
            other => panic!("unexpected cell {other:?}"),
        }
        assert_eq!(table.background_at(0, 0), Some(TABLE_BLUE));
    }

    #[test]
    fn test_story_switches_templates_per_machine() {
        let dir = tempfile::tempdir().unwrap();
        let builder = builder(vec![row(1, 2), row(2, 2)], dir.path());
        let story = builder.measurement_story();
        let breaks = story.iter().filter(|f| matches!(f, Flowable::PageBreak)).count();
        assert_eq!(breaks, 2);
        assert!(matches!(story.last(), Some(Flowable::Table(_))));
    }

    #[test]
    fn test_build_paints_header_and_footer() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = builder(vec![row(1, 2)], dir.path());
        let story = builder.measurement_story();
        builder.extend(story);
        let mut out = Vec::new();
        let summary = builder.build(&mut out).unwrap();
        assert_eq!(summary.page_count(), 2);
        for page in &summary.pages {
            assert!(page.hooks.contains(&PageHook::Footer));
        }
        assert_eq!(summary.pages[0].hooks[0], PageHook::MachineHeader);
        assert_eq!(summary.pages[1].template, TemplateId::Measurement);
        assert_eq!(summary.pages[1].hooks[0], PageHook::MachineHeader);
        assert!(out.starts_with(b"%PDF-"));
    }
}
