//! Explicit mapping from registry fields to spreadsheet headers.
//!
//! Headers are compared after trimming and lower-casing. Every required field
//! must resolve to exactly one header; optional fields may be absent from the
//! sheet and load as empty strings.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnMapping {
    pub name: String,
    pub hub: String,
    pub latitude: String,
    pub longitude: String,
    pub province: String,
    pub canton: String,
    pub parish: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub extension: Option<String>,
    pub kind: Option<String>,
    pub hours_weekdays: Option<String>,
    pub hours_saturday: Option<String>,
    pub hours_sunday: Option<String>,
    pub hours_holidays: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ColumnsFile {
    columns: ColumnMapping,
}

/// Field identifiers used in diagnostics and as keys into a resolved header
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Hub,
    Latitude,
    Longitude,
    Province,
    Canton,
    Parish,
    Address,
    Phone,
    Extension,
    Kind,
    HoursWeekdays,
    HoursSaturday,
    HoursSunday,
    HoursHolidays,
    Status,
}

impl Field {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Hub => "hub",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::Province => "province",
            Field::Canton => "canton",
            Field::Parish => "parish",
            Field::Address => "address",
            Field::Phone => "phone",
            Field::Extension => "extension",
            Field::Kind => "kind",
            Field::HoursWeekdays => "hours_weekdays",
            Field::HoursSaturday => "hours_saturday",
            Field::HoursSunday => "hours_sunday",
            Field::HoursHolidays => "hours_holidays",
            Field::Status => "status",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column positions for a concrete header row.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    positions: HashMap<Field, usize>,
}

impl ResolvedColumns {
    #[must_use]
    pub fn position(&self, field: Field) -> Option<usize> {
        self.positions.get(&field).copied()
    }
}

/// Errors raised while matching a header row against a [`ColumnMapping`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnError {
    #[error("required column '{header}' for field '{field}' not found in registry header")]
    Missing { field: Field, header: String },

    #[error("column '{header}' for field '{field}' appears {count} times in registry header")]
    Ambiguous {
        field: Field,
        header: String,
        count: usize,
    },
}

/// Trim and lower-case a header for comparison.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl ColumnMapping {
    fn required(&self) -> [(Field, &str); 6] {
        [
            (Field::Name, self.name.as_str()),
            (Field::Hub, self.hub.as_str()),
            (Field::Latitude, self.latitude.as_str()),
            (Field::Longitude, self.longitude.as_str()),
            (Field::Province, self.province.as_str()),
            (Field::Canton, self.canton.as_str()),
        ]
    }

    fn optional(&self) -> [(Field, Option<&str>); 10] {
        [
            (Field::Parish, self.parish.as_deref()),
            (Field::Address, self.address.as_deref()),
            (Field::Phone, self.phone.as_deref()),
            (Field::Extension, self.extension.as_deref()),
            (Field::Kind, self.kind.as_deref()),
            (Field::HoursWeekdays, self.hours_weekdays.as_deref()),
            (Field::HoursSaturday, self.hours_saturday.as_deref()),
            (Field::HoursSunday, self.hours_sunday.as_deref()),
            (Field::HoursHolidays, self.hours_holidays.as_deref()),
            (Field::Status, self.status.as_deref()),
        ]
    }

    /// Match this mapping against a header row.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::Missing`] for the first required field whose
    /// header is absent and [`ColumnError::Ambiguous`] for any mapped header
    /// that occurs more than once.
    pub fn resolve<'a, I>(&self, headers: I) -> Result<ResolvedColumns, ColumnError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let headers: Vec<String> = headers.into_iter().map(normalize_header).collect();
        let locate = |field: Field, wanted: &str| -> Result<Option<usize>, ColumnError> {
            let wanted = normalize_header(wanted);
            let hits: Vec<usize> = headers
                .iter()
                .enumerate()
                .filter(|(_, h)| **h == wanted)
                .map(|(i, _)| i)
                .collect();
            match hits.as_slice() {
                [] => Ok(None),
                [only] => Ok(Some(*only)),
                _ => Err(ColumnError::Ambiguous {
                    field,
                    header: wanted,
                    count: hits.len(),
                }),
            }
        };

        let mut positions = HashMap::new();

        for (field, header) in self.required() {
            let pos = locate(field, header)?.ok_or_else(|| ColumnError::Missing {
                field,
                header: normalize_header(header),
            })?;
            positions.insert(field, pos);
        }

        for (field, header) in self.optional() {
            let Some(header) = header else { continue };
            match locate(field, header)? {
                Some(pos) => {
                    positions.insert(field, pos);
                }
                None => {
                    tracing::warn!(field = %field, header, "optional registry column not found");
                }
            }
        }

        Ok(ResolvedColumns { positions })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, header) in self.required() {
            if header.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "header for required field '{field}' must be non-empty"
                )));
            }
        }
        Ok(())
    }
}

/// Load and validate the column mapping from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or names an
/// empty header for a required field.
pub fn load_column_mapping(path: &Path) -> Result<ColumnMapping, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_column_mapping(&content)
}

/// Parse and validate a column mapping document.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_column_mapping(content: &str) -> Result<ColumnMapping, ConfigError> {
    let file: ColumnsFile = serde_yaml::from_str(content)?;
    file.columns.validate()?;
    Ok(file.columns)
}
