//! Entities of a measurement dataset
//!
//! Companies, cities and users are referenced by their unique names the way
//! the dataset documents are written; every other reference is by id.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: u32,
    pub name: String,
    pub nit: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rut_address: String,
    #[serde(default)]
    pub pbx: Option<i64>,
    /// City name
    #[serde(default)]
    pub city: Option<String>,
    /// City name
    #[serde(default)]
    pub rut_city: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    Engineer,
    #[default]
    Client,
    Support,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<i64>,
    #[serde(default)]
    pub ext: Option<i64>,
    #[serde(default)]
    pub celphone_one: Option<i64>,
    #[serde(default)]
    pub celphone_two: Option<i64>,
    /// Company name
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

fn default_certifications() -> String {
    "undefined".to_string()
}

fn default_picture() -> PathBuf {
    PathBuf::from("default.jpg")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: u32,
    #[serde(default = "default_certifications")]
    pub certifications: String,
    #[serde(default = "default_picture")]
    pub picture: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: u32,
    #[serde(default)]
    pub identifier: Option<i64>,
    pub name: String,
    pub machine_type: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub rpm: Option<i64>,
    /// Company name
    pub company: String,
}

/// Photo and schematic diagram of a machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineImages {
    pub machine: u32,
    pub image: PathBuf,
    pub diagram: PathBuf,
}

/// A measurement session of one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDate {
    pub id: u32,
    pub date: NaiveDateTime,
    /// Company name
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Red,
    Green,
    Yellow,
    #[default]
    Black,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    #[default]
    Pred,
    Esp,
    Ter,
    Ult,
    Air,
}

impl MeasurementType {
    pub fn label(self) -> &'static str {
        match self {
            MeasurementType::Pred => "Predictivo",
            MeasurementType::Esp => "Especial",
            MeasurementType::Ter => "Termografía",
            MeasurementType::Ult => "Ultrasonido",
            MeasurementType::Air => "Aire y Caudal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: u32,
    #[serde(default)]
    pub severity: Severity,
    /// MeasurementDate id
    #[serde(default)]
    pub date: Option<u32>,
    pub analysis: String,
    #[serde(alias = "recomendation")]
    pub recommendation: String,
    #[serde(default)]
    pub revised: bool,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub measurement_type: MeasurementType,
    /// Machine id
    pub machine: u32,
    /// User id
    #[serde(default)]
    pub engineer_one: Option<u32>,
    /// User id
    #[serde(default)]
    pub engineer_two: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalImageType {
    #[default]
    Normal,
    Termal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalImage {
    pub id: u32,
    pub measurement: u32,
    #[serde(default)]
    pub image_type: ThermalImageType,
    #[serde(default)]
    pub description: Option<String>,
    pub image: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "V")]
    Vertical,
    #[serde(rename = "H")]
    Horizontal,
    #[serde(rename = "A")]
    Axial,
}

impl Position {
    pub fn code(self) -> &'static str {
        match self {
            Position::Vertical => "V",
            Position::Horizontal => "H",
            Position::Axial => "A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointType {
    #[serde(rename = "V")]
    Velocity,
    #[serde(rename = "A")]
    Acceleration,
    #[serde(rename = "D")]
    Displacement,
    #[serde(rename = "E")]
    Envelope,
    #[serde(rename = "H")]
    Hfd,
}

impl PointType {
    pub fn code(self) -> &'static str {
        match self {
            PointType::Velocity => "V",
            PointType::Acceleration => "A",
            PointType::Displacement => "D",
            PointType::Envelope => "E",
            PointType::Hfd => "H",
        }
    }
}

/// Measuring point on a machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: u32,
    pub number: i32,
    pub position: Position,
    pub point_type: PointType,
    pub measurement: u32,
}

/// Overall value of a point, two decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tendency {
    pub point: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Espectra {
    pub identifier: i32,
    pub point: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSignal {
    pub identifier: i32,
    pub point: u32,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    Tendency,
    Espectra,
    TimeSignal,
}

/// Pre-rendered graph of a measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementGraph {
    pub measurement: u32,
    pub kind: GraphKind,
    #[serde(default)]
    pub title: Option<String>,
    pub image: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_defaults() {
        let json = r#"{"id": 1, "analysis": "ok", "recomendation": "none", "machine": 3}"#;
        let measurement: Measurement = serde_json::from_str(json).unwrap();
        assert_eq!(measurement.severity, Severity::Black);
        assert_eq!(measurement.measurement_type, MeasurementType::Pred);
        assert_eq!(measurement.recommendation, "none");
        assert!(measurement.engineer_two.is_none());
        assert!(!measurement.revised);
    }

    #[test]
    fn test_profile_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"user": 4}"#).unwrap();
        assert_eq!(profile.certifications, "undefined");
        assert_eq!(profile.picture, PathBuf::from("default.jpg"));
    }

    #[test]
    fn test_point_codes() {
        let point: Point = serde_json::from_str(
            r#"{"id": 1, "number": 2, "position": "H", "point_type": "E", "measurement": 1}"#,
        )
        .unwrap();
        assert_eq!(point.position, Position::Horizontal);
        assert_eq!(point.point_type, PointType::Envelope);
        assert_eq!(point.point_type.code(), "E");
    }

    #[test]
    fn test_user_type_and_name() {
        let user: User = serde_json::from_str(
            r#"{"id": 1, "username": "ana", "first_name": "Ana", "last_name": "Pérez",
                "email": "ana@example.com", "user_type": "engineer"}"#,
        )
        .unwrap();
        assert_eq!(user.user_type, UserType::Engineer);
        assert_eq!(user.full_name(), "Ana Pérez");
        assert!(user.company.is_none());
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let json = r#"{"id": 1, "severity": "blue", "analysis": "", "recommendation": "", "machine": 3}"#;
        assert!(serde_json::from_str::<Measurement>(json).is_err());
    }
}
