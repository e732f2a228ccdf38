//! The point-of-sale registry: loaded once from a CSV export of the
//! spreadsheet, immutable afterwards.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Area;
use crate::columns::{ColumnError, ColumnMapping, Field, ResolvedColumns};
use crate::coordinate::Coordinate;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpeningHours {
    pub weekdays: String,
    pub saturday: String,
    pub sunday: String,
    pub holidays: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfSale {
    pub name: String,
    /// Raw value of the hub column. Any non-empty value marks a hub.
    pub hub: Option<String>,
    pub coordinate: Coordinate,
    pub province: String,
    pub canton: String,
    pub parish: String,
    pub address: String,
    pub phone: String,
    pub extension: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub hours: OpeningHours,
    pub status: String,
}

impl PointOfSale {
    #[must_use]
    pub fn is_hub(&self) -> bool {
        self.hub.is_some()
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to open registry {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read registry: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Column(#[from] ColumnError),

    #[error("line {line}: {field} value '{value}' is not a number")]
    InvalidCoordinate {
        line: u64,
        field: Field,
        value: String,
    },

    #[error("line {line}: point-of-sale name is empty")]
    EmptyName { line: u64 },

    #[error("duplicate point-of-sale name: '{0}'")]
    DuplicateName(String),
}

/// All points of sale, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: Vec<PointOfSale>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Build a registry from already-parsed records.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if two records share a name.
    pub fn from_records(records: Vec<PointOfSale>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if by_name.insert(record.name.clone(), i).is_some() {
                return Err(RegistryError::DuplicateName(record.name.clone()));
            }
        }
        Ok(Self { records, by_name })
    }

    /// Parse CSV data using the given column mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on malformed CSV, unresolved columns,
    /// non-numeric coordinates, empty or duplicate names.
    pub fn from_reader<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<Self, RegistryError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = mapping.resolve(reader.headers()?.iter())?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.push(parse_row(&row, &columns)?);
        }

        Self::from_records(records)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointOfSale> {
        self.records.iter()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PointOfSale> {
        self.by_name.get(name).map(|&i| &self.records[i])
    }

    pub fn hubs(&self) -> impl Iterator<Item = &PointOfSale> {
        self.records.iter().filter(|p| p.is_hub())
    }

    /// Hub names in ascending order; these are the selectable origins.
    #[must_use]
    pub fn hub_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hubs().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Records of one province–canton, in registry order.
    pub fn in_area(&self, area: Area) -> impl Iterator<Item = &PointOfSale> + '_ {
        self.records
            .iter()
            .filter(move |p| area.contains(&p.province, &p.canton))
    }

    /// Names in one province–canton in ascending order; these are the
    /// selectable transfer stops.
    #[must_use]
    pub fn names_in_area(&self, area: &Area) -> Vec<&str> {
        let mut names: Vec<&str> = self.in_area(*area).map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Record counts per `(province, canton)`.
    #[must_use]
    pub fn counts_by_area(&self) -> BTreeMap<(String, String), usize> {
        let mut counts = BTreeMap::new();
        for p in &self.records {
            *counts
                .entry((p.province.clone(), p.canton.clone()))
                .or_insert(0) += 1;
        }
        counts
    }
}

/// Load the registry from a CSV file.
///
/// # Errors
///
/// Returns [`RegistryError::Open`] if the file cannot be opened, otherwise
/// the errors of [`Registry::from_reader`].
pub fn load_registry(path: &Path, mapping: &ColumnMapping) -> Result<Registry, RegistryError> {
    let file = std::fs::File::open(path).map_err(|e| RegistryError::Open {
        path: path.display().to_string(),
        source: csv::Error::from(e),
    })?;
    let registry = Registry::from_reader(std::io::BufReader::new(file), mapping)?;
    tracing::info!(
        path = %path.display(),
        records = registry.len(),
        hubs = registry.hubs().count(),
        "loaded point-of-sale registry"
    );
    Ok(registry)
}

fn parse_row(row: &csv::StringRecord, columns: &ResolvedColumns) -> Result<PointOfSale, RegistryError> {
    let line = row.position().map_or(0, csv::Position::line);
    let cell = |field: Field| -> String {
        columns
            .position(field)
            .and_then(|i| row.get(i))
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };
    let number = |field: Field| -> Result<f64, RegistryError> {
        let raw = cell(field);
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(RegistryError::InvalidCoordinate {
                line,
                field,
                value: raw,
            })
    };

    let name = cell(Field::Name);
    if name.is_empty() {
        return Err(RegistryError::EmptyName { line });
    }

    let hub = Some(cell(Field::Hub)).filter(|h| !h.is_empty());

    Ok(PointOfSale {
        name,
        hub,
        coordinate: Coordinate::new(number(Field::Latitude)?, number(Field::Longitude)?),
        province: title_case(&cell(Field::Province)),
        canton: title_case(&cell(Field::Canton)),
        parish: cell(Field::Parish),
        address: cell(Field::Address),
        phone: cell(Field::Phone),
        extension: cell(Field::Extension),
        kind: cell(Field::Kind),
        hours: OpeningHours {
            weekdays: cell(Field::HoursWeekdays),
            saturday: cell(Field::HoursSaturday),
            sunday: cell(Field::HoursSunday),
            holidays: cell(Field::HoursHolidays),
        },
        status: cell(Field::Status),
    })
}

/// Upper-cases the first letter of every word and lower-cases the rest. A
/// word starts after any non-alphabetic character.
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
