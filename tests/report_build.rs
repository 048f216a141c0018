use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use image::{ImageOutputFormat, Rgb, RgbImage};
use tempfile::TempDir;

use vibro_report::{
    BuildSummary, DataError, Dataset, DocumentGeometry, FontLibrary, PageHook, ReportAssets,
    ReportBuilder, ReportContext, ReportError, Requester, TemplateId,
};

fn write_image(path: &Path, format: ImageOutputFormat) {
    let img = RgbImage::from_fn(32, 16, |x, y| Rgb([(x * 8) as u8, (y * 16) as u8, 90]));
    let mut file = File::create(path).unwrap();
    img.write_to(&mut file, format).unwrap();
}

/// Dataset with three machines measured on one session, each with pictures,
/// readings and two graphs of every kind, plus logo and badge files
struct Fixture {
    dir: TempDir,
    second_engineer: bool,
}

impl Fixture {
    fn new(second_engineer: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("media");
        fs::create_dir_all(&media).unwrap();
        for name in ["logo.jpg", "skf.jpg", "machine.jpg", "diagram.jpg"] {
            write_image(&dir.path().join(name), ImageOutputFormat::Jpeg(85));
            write_image(&media.join(name), ImageOutputFormat::Jpeg(85));
        }
        write_image(&media.join("graph.png"), ImageOutputFormat::Png);

        let fixture = Self { dir, second_engineer };
        fs::write(fixture.data_path(), fixture.json()).unwrap();
        fixture
    }

    fn data_path(&self) -> PathBuf {
        self.dir.path().join("data.json")
    }

    fn json(&self) -> String {
        let engineer_two = if self.second_engineer { ", \"engineer_two\": 3" } else { "" };
        let mut measurements = Vec::new();
        let mut points = Vec::new();
        let mut tendencies = Vec::new();
        let mut graphs = Vec::new();
        for machine in 1..=3u32 {
            let id = 10 + machine;
            measurements.push(format!(
                r#"{{"id": {id}, "date": 1, "analysis": "Desbalanceo leve en el rotor.",
                    "recomendation": "Balancear en la próxima parada.", "machine": {machine},
                    "engineer_one": 2{engineer_two}, "severity": "yellow"}}"#
            ));
            for number in 1..=2 {
                let point = machine * 10 + number;
                points.push(format!(
                    r#"{{"id": {point}, "number": {number}, "position": "H", "point_type": "V", "measurement": {id}}}"#
                ));
                tendencies.push(format!(r#"{{"point": {point}, "value": 3.{number}}}"#));
            }
            for kind in ["tendency", "espectra", "time_signal"] {
                for _ in 0..2 {
                    graphs.push(format!(
                        r#"{{"measurement": {id}, "kind": "{kind}", "image": "media/graph.png"}}"#
                    ));
                }
            }
        }

        format!(
            r#"{{
            "cities": [{{"id": 1, "name": "Medellín", "state": "Antioquia"}}],
            "companies": [{{"id": 1, "name": "Acme", "nit": "900123", "city": "Medellín"}}],
            "users": [
                {{"id": 1, "username": "luis", "first_name": "Luis", "last_name": "Gómez",
                  "email": "luis@acme.co", "company": "Acme"}},
                {{"id": 2, "username": "ana", "first_name": "Ana", "last_name": "Pérez",
                  "email": "ana@vibro.co", "user_type": "engineer"}},
                {{"id": 3, "username": "juan", "first_name": "Juan", "last_name": "Ríos",
                  "email": "juan@vibro.co", "user_type": "engineer"}}
            ],
            "profiles": [{{"user": 2, "certifications": "ISO 18436-2 CAT II"}}],
            "machines": [
                {{"id": 1, "name": "Compresor", "machine_type": "Compresor", "company": "Acme"}},
                {{"id": 2, "name": "Bomba", "machine_type": "Bomba", "company": "Acme"}},
                {{"id": 3, "name": "Ventilador", "machine_type": "Ventilador", "company": "Acme"}}
            ],
            "machine_images": [
                {{"machine": 1, "image": "media/machine.jpg", "diagram": "media/diagram.jpg"}},
                {{"machine": 2, "image": "media/machine.jpg", "diagram": "media/diagram.jpg"}}
            ],
            "dates": [
                {{"id": 1, "date": "2020-03-04T08:00:00", "company": "Acme"}},
                {{"id": 2, "date": "2020-06-04T08:00:00", "company": "Acme"}}
            ],
            "measurements": [{}],
            "points": [{}],
            "tendencies": [{}],
            "graphs": [{}]
        }}"#,
            measurements.join(","),
            points.join(","),
            tendencies.join(","),
            graphs.join(",")
        )
    }

    fn dataset(&self) -> Dataset {
        let mut dataset = Dataset::from_path(&self.data_path()).unwrap();
        dataset.resolve_media(self.dir.path());
        dataset
    }

    fn builder(&self, date_id: u32) -> Result<ReportBuilder, ReportError> {
        let dataset = self.dataset();
        let requester = Requester::from(dataset.user_by_username("luis")?);
        let rows = dataset.report_rows("Acme", date_id)?;
        let issued = NaiveDate::from_ymd_opt(2020, 3, 20).unwrap();
        let context = ReportContext::new(rows, requester, issued)?;
        let assets = ReportAssets::new(self.dir.path().join("logo.jpg"), self.dir.path().join("skf.jpg"))?;
        let mut builder = ReportBuilder::new(
            context,
            assets,
            DocumentGeometry::default(),
            Arc::new(FontLibrary::builtin()),
        )?;
        let story = builder.measurement_story();
        builder.extend(story);
        Ok(builder)
    }

    fn render(&self) -> (Vec<u8>, BuildSummary) {
        let builder = self.builder(1).unwrap();
        let mut out = Vec::new();
        let summary = builder.build(&mut out).unwrap();
        (out, summary)
    }
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

#[test]
fn test_every_page_has_header_and_footer() {
    let fixture = Fixture::new(false);
    let (pdf, summary) = fixture.render();

    assert!(summary.page_count() > 4);
    for page in &summary.pages {
        assert_eq!(page.hooks.last(), Some(&PageHook::Footer), "page {}", page.number);
        assert_eq!(page.hooks.len(), 2);
    }
    assert_eq!(count(&pdf, b"(servicios@vibromontajes.com)"), summary.page_count());

    let machine_pages = summary
        .pages
        .iter()
        .filter(|page| page.hooks[0] == PageHook::MachineHeader)
        .count();
    // the letter page plus the first page of every machine
    assert_eq!(machine_pages, 4);
    assert_eq!(count(&pdf, b"(ACME)"), 4);
}

#[test]
fn test_machine_sections_switch_templates() {
    let fixture = Fixture::new(false);
    let (_, summary) = fixture.render();
    let templates = summary.templates();

    assert_eq!(templates[0], TemplateId::Measurement);
    assert_eq!(templates[1], TemplateId::Measurement);
    // sections continue on standard pages until the next machine
    assert_eq!(templates[2], TemplateId::MeasurementTwo);
    let mut previous = TemplateId::Measurement;
    for template in &templates[1..] {
        if *template == TemplateId::MeasurementTwo {
            assert!(matches!(previous, TemplateId::Measurement | TemplateId::MeasurementTwo));
        }
        previous = *template;
    }
    assert!(!templates.contains(&TemplateId::Normal));
}

#[test]
fn test_output_is_deterministic() {
    let fixture = Fixture::new(true);
    let (first, _) = fixture.render();
    let (second, _) = fixture.render();
    assert_eq!(first, second);
    assert!(first.starts_with(b"%PDF-"));
}

#[test]
fn test_second_engineer_signs() {
    let fixture = Fixture::new(true);
    let (pdf, _) = fixture.render();
    assert_eq!(count(&pdf, b"(JUAN)"), 1);

    let single = Fixture::new(false);
    let (pdf, _) = single.render();
    assert_eq!(count(&pdf, b"(JUAN)"), 0);
    assert_eq!(count(&pdf, b"(ANA)"), 1);
}

#[test]
fn test_session_without_measurements_is_empty_dataset() {
    let fixture = Fixture::new(false);
    let result = fixture.builder(2);
    assert!(matches!(result, Err(ReportError::EmptyDataset(_))));
}

#[test]
fn test_build_to_path_writes_file() {
    let fixture = Fixture::new(false);
    let builder = fixture.builder(1).unwrap();
    let out = fixture.dir.path().join("out").join("report.pdf");
    let summary = builder.build_to_path(&out).unwrap();
    let written = fs::read(&out).unwrap();
    assert_eq!(written.len(), summary.bytes_written);
}

#[test]
fn test_missing_graph_image_fails_without_output() {
    let fixture = Fixture::new(false);
    fs::remove_file(fixture.dir.path().join("media").join("graph.png")).unwrap();
    let builder = fixture.builder(1).unwrap();
    let out = fixture.dir.path().join("report.pdf");
    assert!(builder.build_to_path(&out).is_err());
    assert!(!out.exists());
}

#[test]
fn test_invalid_dataset_rejected_on_load() {
    let fixture = Fixture::new(false);
    let json = fixture.json().replace("\"value\": 3.1", "\"value\": 310.0");
    assert!(matches!(
        Dataset::from_json_str(&json),
        Err(DataError::Invalid { .. })
    ));
}
