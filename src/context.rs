//! Immutable inputs of one report build

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{ReportError, ReportResult};
use crate::models::{GraphKind, Machine, MeasurementType, Position, PointType, Severity, User};
use crate::styles::long_date;

/// The user the report is addressed to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Requester {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: Option<String>,
}

impl Requester {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            company: user.company.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Engineer {
    pub first_name: String,
    pub last_name: String,
    pub certifications: String,
}

impl Engineer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachinePictures {
    pub image: PathBuf,
    pub diagram: PathBuf,
}

/// One point of a measurement with its overall value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointReading {
    pub number: i32,
    pub position: Position,
    pub point_type: PointType,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphImage {
    pub kind: GraphKind,
    pub title: Option<String>,
    pub image: PathBuf,
}

impl GraphImage {
    pub fn title(&self) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.clone(),
            _ => match self.kind {
                GraphKind::Tendency => "Tendencia".to_string(),
                GraphKind::Espectra => "Espectro".to_string(),
                GraphKind::TimeSignal => "Señal en el tiempo".to_string(),
            },
        }
    }
}

/// A measurement joined with everything a report page shows about it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRow {
    pub measurement_id: u32,
    pub date: NaiveDateTime,
    pub machine: Machine,
    pub measurement_type: MeasurementType,
    pub severity: Severity,
    pub analysis: String,
    pub recommendation: String,
    pub engineer_one: Option<Engineer>,
    pub engineer_two: Option<Engineer>,
    pub pictures: Option<MachinePictures>,
    pub readings: Vec<PointReading>,
    pub graphs: Vec<GraphImage>,
}

impl MeasurementRow {
    pub fn graphs_of(&self, kind: GraphKind) -> impl Iterator<Item = &GraphImage> {
        self.graphs.iter().filter(move |graph| graph.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    rows: Vec<MeasurementRow>,
    requester: Requester,
    company: String,
    report_date: String,
    issued_on: NaiveDate,
    engineer_one: Engineer,
    engineer_two: Option<Engineer>,
}

impl ReportContext {
    /// Validate the inputs and derive the header fields from the first row
    ///
    /// Rows are stably sorted by date, so rows sharing a date keep the
    /// caller's order. `issued_on` is the date printed in the letter heading.
    pub fn new(
        mut rows: Vec<MeasurementRow>,
        requester: Requester,
        issued_on: NaiveDate,
    ) -> ReportResult<Self> {
        if rows.is_empty() {
            return Err(ReportError::EmptyDataset(
                "no measurement rows to report".to_string(),
            ));
        }
        rows.sort_by_key(|row| row.date);

        let company = requester
            .company
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ReportError::MissingField("company of the requesting user".to_string()))?;

        let first = &rows[0];
        let engineer_one = first
            .engineer_one
            .clone()
            .ok_or_else(|| ReportError::MissingField("engineer_one".to_string()))?;
        let engineer_two = first
            .engineer_two
            .clone()
            .filter(|engineer| !engineer.first_name.trim().is_empty());
        let report_date = long_date(first.date.date()).to_uppercase();

        Ok(Self {
            rows,
            requester,
            company,
            report_date,
            issued_on,
            engineer_one,
            engineer_two,
        })
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        &self.rows
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    /// Date of the first measurement, upper-cased long form
    pub fn report_date(&self) -> &str {
        &self.report_date
    }

    pub fn issued_on(&self) -> NaiveDate {
        self.issued_on
    }

    pub fn engineer_one(&self) -> &Engineer {
        &self.engineer_one
    }

    pub fn engineer_two(&self) -> Option<&Engineer> {
        self.engineer_two.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn engineer(first: &str, last: &str) -> Engineer {
        Engineer {
            first_name: first.to_string(),
            last_name: last.to_string(),
            certifications: "ISO 18436-2 CAT II".to_string(),
        }
    }

    pub(crate) fn requester() -> Requester {
        Requester {
            first_name: "Luis".to_string(),
            last_name: "Gómez".to_string(),
            email: "luis@acme.co".to_string(),
            company: Some("Acme".to_string()),
        }
    }

    pub(crate) fn row(id: u32, day: u32) -> MeasurementRow {
        MeasurementRow {
            measurement_id: id,
            date: NaiveDate::from_ymd_opt(2020, 3, day)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            machine: Machine {
                id,
                identifier: None,
                name: format!("Bomba {id}"),
                machine_type: "Bomba".to_string(),
                code: None,
                transmission: None,
                brand: None,
                power: None,
                rpm: Some(1780),
                company: "Acme".to_string(),
            },
            measurement_type: MeasurementType::Pred,
            severity: Severity::Green,
            analysis: "Niveles de vibración normales.".to_string(),
            recommendation: "Continuar monitoreo.".to_string(),
            engineer_one: Some(engineer("Ana", "Pérez")),
            engineer_two: None,
            pictures: None,
            readings: Vec::new(),
            graphs: Vec::new(),
        }
    }

    fn issued() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 20).unwrap()
    }

    #[test]
    fn test_empty_rows_rejected() {
        let result = ReportContext::new(Vec::new(), requester(), issued());
        assert!(matches!(result, Err(ReportError::EmptyDataset(_))));
    }

    #[test]
    fn test_missing_company_rejected() {
        let mut user = requester();
        user.company = None;
        let result = ReportContext::new(vec![row(1, 2)], user, issued());
        assert!(matches!(result, Err(ReportError::MissingField(_))));
    }

    #[test]
    fn test_missing_first_engineer_rejected() {
        let mut first = row(1, 2);
        first.engineer_one = None;
        let result = ReportContext::new(vec![first], requester(), issued());
        assert!(matches!(result, Err(ReportError::MissingField(_))));
    }

    #[test]
    fn test_fields_come_from_earliest_row() {
        let mut late = row(1, 9);
        late.engineer_two = Some(engineer("Juan", "Ríos"));
        let early = row(2, 4);
        let context = ReportContext::new(vec![late, early], requester(), issued()).unwrap();
        assert_eq!(context.rows()[0].measurement_id, 2);
        assert_eq!(context.report_date(), "4 DE MARZO DE 2020");
        assert_eq!(context.company(), "Acme");
        assert!(context.engineer_two().is_none());
    }

    #[test]
    fn test_blank_second_engineer_is_absent() {
        let mut first = row(1, 2);
        first.engineer_two = Some(engineer("", ""));
        let context = ReportContext::new(vec![first], requester(), issued()).unwrap();
        assert!(context.engineer_two().is_none());
    }

    #[test]
    fn test_graph_default_titles() {
        let graph = GraphImage {
            kind: GraphKind::TimeSignal,
            title: None,
            image: PathBuf::from("g.png"),
        };
        assert_eq!(graph.title(), "Señal en el tiempo");
    }
}
