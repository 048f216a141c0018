//! Vibration analysis reports
//!
//! Data model of a predictive maintenance service (companies, machines,
//! measurements, point readings, graphs) and a PDF renderer that lays out
//! the client report: a cover letter with the severity chart and
//! signatures, then one section per measured machine, with the logo header
//! and contact footer painted on every page.
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use vibro_report::{Dataset, ReportAssets, ReportBuilder, ReportConfig, ReportContext, Requester};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReportConfig::from_file(Path::new("report.toml"))?;
//! let dataset = Dataset::from_path(Path::new("data.json"))?;
//! let user = dataset.user_by_username("luis")?;
//! let rows = dataset.report_rows("Acme", 1)?;
//! let issued = NaiveDate::from_ymd_opt(2020, 3, 20).ok_or("bad date")?;
//! let context = ReportContext::new(rows, Requester::from(user), issued)?;
//!
//! let mut builder = ReportBuilder::new(
//!     context,
//!     ReportAssets::from_config(&config)?,
//!     config.geometry,
//!     Arc::new(config.font_library()?),
//! )?;
//! let story = builder.measurement_story();
//! builder.extend(story);
//! builder.build_to_path(Path::new("report.pdf"))?;
//! # Ok(())
//! # }
//! ```

mod canvas;
pub mod config;
pub mod context;
pub mod dataset;
pub mod document;
pub mod error;
pub mod flowable;
pub mod font_registry;
mod font_utils;
pub mod geometry;
mod image_registry;
mod image_utils;
pub mod models;
pub mod paragraph;
pub mod renderer;
pub mod report;
pub mod severity;
pub mod styles;
pub mod table;
pub mod template;
pub mod types;
mod unicode_utils;

pub use config::ReportConfig;
pub use context::{Engineer, ReportContext, Requester};
pub use dataset::Dataset;
pub use document::{BuildSummary, DocTemplate, NoDecoration, PageDecorator, PageInfo};
pub use error::{DataError, ReportError, ReportResult};
pub use flowable::{Flowable, ImageBox};
pub use font_registry::FontLibrary;
pub use geometry::DocumentGeometry;
pub use paragraph::{Inline, Paragraph};
pub use report::{ReportAssets, ReportBuilder};
pub use severity::{severity, MachineClass, SeverityBand};
pub use table::{Cell, Table, TableCommand};
pub use template::{PageHook, PageTemplate, TemplateId};
