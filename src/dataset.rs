//! Dataset documents: loading, validation and report row extraction
//!
//! A dataset is one JSON object holding an array per entity. Loading always
//! validates uniqueness and references, so a `Dataset` obtained through the
//! `from_json_*` constructors is internally consistent.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Display};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::context::{Engineer, GraphImage, MachinePictures, MeasurementRow, PointReading};
use crate::error::{DataError, DataResult};
use crate::models::{
    City, Company, Espectra, Machine, MachineImages, Measurement, MeasurementDate,
    MeasurementGraph, Point, Profile, Tendency, ThermalImage, TimeSignal, User,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub cities: Vec<City>,
    pub companies: Vec<Company>,
    pub users: Vec<User>,
    pub profiles: Vec<Profile>,
    pub machines: Vec<Machine>,
    pub machine_images: Vec<MachineImages>,
    pub dates: Vec<MeasurementDate>,
    pub measurements: Vec<Measurement>,
    pub thermal_images: Vec<ThermalImage>,
    pub points: Vec<Point>,
    pub tendencies: Vec<Tendency>,
    pub espectra: Vec<Espectra>,
    pub time_signals: Vec<TimeSignal>,
    pub graphs: Vec<MeasurementGraph>,
}

fn collect_unique<K: Ord>(
    entity: &'static str,
    keys: impl IntoIterator<Item = K>,
    describe: impl Fn(&K) -> String,
) -> DataResult<BTreeSet<K>> {
    let mut seen = BTreeSet::new();
    for key in keys {
        if seen.contains(&key) {
            return Err(DataError::Duplicate {
                entity,
                key: describe(&key),
            });
        }
        seen.insert(key);
    }
    Ok(seen)
}

/// Collect keys, failing on the first repeated one
fn unique<K: Ord + Display>(
    entity: &'static str,
    keys: impl IntoIterator<Item = K>,
) -> DataResult<BTreeSet<K>> {
    collect_unique(entity, keys, |key| key.to_string())
}

/// Uniqueness of a multi-field key
fn unique_together<K: Ord + Debug>(
    entity: &'static str,
    keys: impl IntoIterator<Item = K>,
) -> DataResult<()> {
    collect_unique(entity, keys, |key| format!("{key:?}")).map(|_| ())
}

fn reference<K: Ord + Display>(
    entity: &'static str,
    target: &'static str,
    known: &BTreeSet<K>,
    key: &K,
) -> DataResult<()> {
    if known.contains(key) {
        Ok(())
    } else {
        Err(DataError::MissingReference {
            entity,
            target,
            key: key.to_string(),
        })
    }
}

/// Values are stored with two decimals and at most four digits
fn decimal(entity: &'static str, key: impl Display, value: f64) -> DataResult<()> {
    if value.is_finite() && value.abs() < 100.0 {
        Ok(())
    } else {
        Err(DataError::Invalid {
            entity,
            key: key.to_string(),
            reason: format!("{value} does not fit 4 digits with 2 decimals"),
        })
    }
}

impl Dataset {
    pub fn from_json_str(json: &str) -> DataResult<Self> {
        let dataset: Dataset = serde_json::from_str(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> DataResult<Self> {
        let dataset: Dataset = serde_json::from_reader(reader)?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn from_path(path: &Path) -> DataResult<Self> {
        let file = File::open(path)?;
        let dataset = Self::from_reader(BufReader::new(file))?;
        info!(
            "Loaded dataset {}: {} companies, {} machines, {} measurements",
            path.display(),
            dataset.companies.len(),
            dataset.machines.len(),
            dataset.measurements.len()
        );
        Ok(dataset)
    }

    /// Check uniqueness and references; the first violation is reported
    pub fn validate(&self) -> DataResult<()> {
        let city_names = unique("city", self.cities.iter().map(|c| c.name.clone()))?;
        unique("city id", self.cities.iter().map(|c| c.id))?;
        unique_together(
            "city name/state",
            self.cities.iter().map(|c| (c.name.as_str(), c.state.as_deref())),
        )?;

        let company_names = unique("company", self.companies.iter().map(|c| c.name.clone()))?;
        unique("company id", self.companies.iter().map(|c| c.id))?;
        unique("company nit", self.companies.iter().map(|c| c.nit.clone()))?;
        for company in &self.companies {
            for city in [&company.city, &company.rut_city].into_iter().flatten() {
                reference("company", "city", &city_names, city)?;
            }
        }

        let user_ids = unique("user id", self.users.iter().map(|u| u.id))?;
        unique("username", self.users.iter().map(|u| u.username.clone()))?;
        unique("user email", self.users.iter().map(|u| u.email.clone()))?;
        for user in &self.users {
            if let Some(company) = &user.company {
                reference("user", "company", &company_names, company)?;
            }
        }

        unique("profile", self.profiles.iter().map(|p| p.user))?;
        for profile in &self.profiles {
            reference("profile", "user", &user_ids, &profile.user)?;
        }

        let machine_ids = unique("machine id", self.machines.iter().map(|m| m.id))?;
        unique_together(
            "machine",
            self.machines
                .iter()
                .map(|m| (m.name.as_str(), m.machine_type.as_str(), m.company.as_str())),
        )?;
        for machine in &self.machines {
            reference("machine", "company", &company_names, &machine.company)?;
        }

        unique("machine images", self.machine_images.iter().map(|i| i.machine))?;
        for images in &self.machine_images {
            reference("machine images", "machine", &machine_ids, &images.machine)?;
        }

        let date_ids = unique("measurement date id", self.dates.iter().map(|d| d.id))?;
        unique_together(
            "measurement date",
            self.dates.iter().map(|d| (d.company.as_deref(), d.date)),
        )?;
        for date in &self.dates {
            if let Some(company) = &date.company {
                reference("measurement date", "company", &company_names, company)?;
            }
        }

        let measurement_ids = unique("measurement id", self.measurements.iter().map(|m| m.id))?;
        unique_together(
            "measurement",
            self.measurements
                .iter()
                .map(|m| (m.measurement_type, m.date, m.machine)),
        )?;
        for measurement in &self.measurements {
            reference("measurement", "machine", &machine_ids, &measurement.machine)?;
            if let Some(date) = &measurement.date {
                reference("measurement", "measurement date", &date_ids, date)?;
            }
            for engineer in [&measurement.engineer_one, &measurement.engineer_two]
                .into_iter()
                .flatten()
            {
                reference("measurement", "user", &user_ids, engineer)?;
            }
        }

        unique("thermal image id", self.thermal_images.iter().map(|t| t.id))?;
        for image in &self.thermal_images {
            reference("thermal image", "measurement", &measurement_ids, &image.measurement)?;
        }

        let point_ids = unique("point id", self.points.iter().map(|p| p.id))?;
        for point in &self.points {
            reference("point", "measurement", &measurement_ids, &point.measurement)?;
        }

        unique("tendency", self.tendencies.iter().map(|t| t.point))?;
        for tendency in &self.tendencies {
            reference("tendency", "point", &point_ids, &tendency.point)?;
            decimal("tendency", tendency.point, tendency.value)?;
        }
        for sample in &self.espectra {
            reference("espectra", "point", &point_ids, &sample.point)?;
            decimal("espectra", sample.identifier, sample.value)?;
        }
        for sample in &self.time_signals {
            reference("time signal", "point", &point_ids, &sample.point)?;
            decimal("time signal", sample.identifier, sample.value)?;
        }

        for graph in &self.graphs {
            reference("graph", "measurement", &measurement_ids, &graph.measurement)?;
        }

        debug!("Dataset validated");
        Ok(())
    }

    pub fn user_by_username(&self, username: &str) -> DataResult<&User> {
        self.users
            .iter()
            .find(|user| user.username == username)
            .ok_or_else(|| DataError::NotFound(format!("user {username}")))
    }

    pub fn company(&self, name: &str) -> DataResult<&Company> {
        self.companies
            .iter()
            .find(|company| company.name == name)
            .ok_or_else(|| DataError::NotFound(format!("company {name}")))
    }

    pub fn profile(&self, user_id: u32) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.user == user_id)
    }

    fn engineer(&self, user_id: Option<u32>) -> Option<Engineer> {
        let user = self.users.iter().find(|user| Some(user.id) == user_id)?;
        let certifications = self
            .profile(user.id)
            .map(|profile| profile.certifications.clone())
            .unwrap_or_else(|| "undefined".to_string());
        Some(Engineer {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            certifications,
        })
    }

    /// Rows of one measurement session of a company, ordered by date,
    /// machine name and measurement id
    pub fn report_rows(&self, company: &str, date_id: u32) -> DataResult<Vec<MeasurementRow>> {
        self.company(company)?;
        let session = self
            .dates
            .iter()
            .find(|date| date.id == date_id)
            .ok_or_else(|| DataError::NotFound(format!("measurement date {date_id}")))?;

        let machines: BTreeMap<u32, &Machine> = self
            .machines
            .iter()
            .filter(|machine| machine.company == company)
            .map(|machine| (machine.id, machine))
            .collect();
        let tendencies: BTreeMap<u32, f64> = self
            .tendencies
            .iter()
            .map(|tendency| (tendency.point, tendency.value))
            .collect();

        let mut rows = Vec::new();
        for measurement in &self.measurements {
            if measurement.date != Some(date_id) {
                continue;
            }
            let Some(machine) = machines.get(&measurement.machine) else {
                continue;
            };

            let pictures = self
                .machine_images
                .iter()
                .find(|images| images.machine == machine.id)
                .map(|images| MachinePictures {
                    image: images.image.clone(),
                    diagram: images.diagram.clone(),
                });

            let mut points: Vec<&Point> = self
                .points
                .iter()
                .filter(|point| point.measurement == measurement.id)
                .collect();
            points.sort_by_key(|point| (point.number, point.id));
            let readings = points
                .into_iter()
                .map(|point| PointReading {
                    number: point.number,
                    position: point.position,
                    point_type: point.point_type,
                    value: tendencies.get(&point.id).copied(),
                })
                .collect();

            let mut graphs: Vec<GraphImage> = self
                .graphs
                .iter()
                .filter(|graph| graph.measurement == measurement.id)
                .map(|graph| GraphImage {
                    kind: graph.kind,
                    title: graph.title.clone(),
                    image: graph.image.clone(),
                })
                .collect();
            graphs.sort_by_key(|graph| graph.kind);

            rows.push(MeasurementRow {
                measurement_id: measurement.id,
                date: session.date,
                machine: (*machine).clone(),
                measurement_type: measurement.measurement_type,
                severity: measurement.severity,
                analysis: measurement.analysis.clone(),
                recommendation: measurement.recommendation.clone(),
                engineer_one: self.engineer(measurement.engineer_one),
                engineer_two: self.engineer(measurement.engineer_two),
                pictures,
                readings,
                graphs,
            });
        }

        rows.sort_by(|a, b| {
            (a.date, &a.machine.name, a.measurement_id).cmp(&(b.date, &b.machine.name, b.measurement_id))
        });
        debug!("{} rows for {} on session {}", rows.len(), company, date_id);
        Ok(rows)
    }

    /// Join relative media paths onto `root`
    pub fn resolve_media(&mut self, root: &Path) {
        let join = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        };
        for images in &mut self.machine_images {
            join(&mut images.image);
            join(&mut images.diagram);
        }
        for image in &mut self.thermal_images {
            join(&mut image.image);
        }
        for graph in &mut self.graphs {
            join(&mut graph.image);
        }
        for profile in &mut self.profiles {
            join(&mut profile.picture);
        }
    }
}
