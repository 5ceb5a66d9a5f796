use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::geojson::{Crs, Feature, FeatureCollection};
use crate::table::{CellValue, RowTable};

/// Column name -> value, for one sub-subject of one zone
pub type ColumnValues = BTreeMap<String, CellValue>;

/// Sub-subject -> columns, for one zone
pub type SubjectEntry = BTreeMap<String, ColumnValues>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignmentError {
    #[error("Id column '{0}' is missing or empty")]
    MissingIdColumn(String),
    #[error("Subject '{subject}' has {actual} rows but {expected} zones are known")]
    RowCount {
        subject: String,
        expected: usize,
        actual: usize,
    },
    #[error("No geometry found for zones: {}", .names.join(", "))]
    UnmatchedZones { names: Vec<String> },
}

/// What to do when rows or geometries do not line up with the zone list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentPolicy {
    /// Misalignment is an error
    #[default]
    Strict,
    /// Misalignment is logged and the shorter sequences are kept as they are
    Lenient,
}

impl FromStr for AlignmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(AlignmentPolicy::Strict),
            "lenient" => Ok(AlignmentPolicy::Lenient),
            other => Err(format!("unknown alignment policy '{other}'")),
        }
    }
}

impl fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentPolicy::Strict => write!(f, "strict"),
            AlignmentPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// Per-zone properties accumulated from several sheet tables.
///
/// Position `i` in every sequence refers to the same zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    id_columns: BTreeMap<String, Vec<CellValue>>,
    subjects: BTreeMap<String, Vec<SubjectEntry>>,
    geometry: Vec<Value>,
    /// Tables whose row count differed from the zone count when merged
    short_tables: Vec<AlignmentError>,
}

impl PropertyMap {
    /// Start an empty map with the given pass-through id columns
    pub fn new<I, S>(id_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id_columns: id_columns
                .into_iter()
                .map(|name| (name.into(), Vec::new()))
                .collect(),
            subjects: BTreeMap::new(),
            geometry: Vec::new(),
            short_tables: Vec::new(),
        }
    }

    /// Pre-declare subjects so they appear even when no rows are merged into them
    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for subject in subjects {
            self.subjects.entry(subject.into()).or_default();
        }
        self
    }

    pub fn id_column(&self, name: &str) -> Option<&[CellValue]> {
        self.id_columns.get(name).map(Vec::as_slice)
    }

    pub fn subject(&self, name: &str) -> Option<&[SubjectEntry]> {
        self.subjects.get(name).map(Vec::as_slice)
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.subjects.keys().map(String::as_str)
    }

    pub fn geometry(&self) -> &[Value] {
        &self.geometry
    }

    /// Number of zones, taken from the longest id column
    pub fn zone_count(&self) -> usize {
        self.id_columns.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Fold one sheet table into the map under `subject` / `sub_subject`.
    ///
    /// Id columns are filled only by the first table that supplies them. Other
    /// columns are kept when `retained` is empty or names them, and land at the
    /// row's index in the subject sequence. The sequence grows to cover every
    /// row; gaps are filled with empty entries. Sub-subjects already present at
    /// an index are left untouched. A table whose row count differs from the
    /// known zone count is recorded for the row alignment check.
    #[instrument(skip(self, table, retained), fields(rows = table.row_count()))]
    pub fn merge_table(
        mut self,
        table: &RowTable,
        subject: &str,
        sub_subject: &str,
        retained: &[String],
    ) -> Self {
        let mut rows: BTreeMap<usize, ColumnValues> = BTreeMap::new();

        for column in table.columns() {
            if let Some(existing) = self.id_columns.get_mut(&column.name) {
                if existing.is_empty() {
                    debug!("Populating id column '{}' with {} values", column.name, column.values.len());
                    *existing = column.values.clone();
                } else if *existing != column.values {
                    debug!("Id column '{}' already populated, ignoring differing values", column.name);
                }
                continue;
            }

            if !retained.is_empty() && !retained.contains(&column.name) {
                debug!("Dropping column '{}'", column.name);
                continue;
            }

            for (idx, value) in column.values.iter().enumerate() {
                rows.entry(idx)
                    .or_default()
                    .insert(column.name.clone(), value.clone());
            }
        }

        let expected = self.zone_count();
        if expected > 0 && table.row_count() != expected {
            debug!(
                "Table for {}/{} has {} rows, expected {}",
                subject,
                sub_subject,
                table.row_count(),
                expected
            );
            self.short_tables.push(AlignmentError::RowCount {
                subject: format!("{subject}/{sub_subject}"),
                expected,
                actual: table.row_count(),
            });
        }

        let entries = self.subjects.entry(subject.to_string()).or_default();
        if let Some((&last_idx, _)) = rows.last_key_value() {
            if entries.len() <= last_idx {
                entries.resize_with(last_idx + 1, SubjectEntry::new);
            }
        }
        for (idx, columns) in rows {
            entries[idx]
                .entry(sub_subject.to_string())
                .or_default()
                .extend(columns);
        }

        self
    }

    /// Every subject sequence must be as long as the id columns, and every
    /// merged table must have had one row per zone.
    pub fn check_row_alignment(&self) -> Result<(), AlignmentError> {
        match self.row_alignment_errors().into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn row_alignment_errors(&self) -> Vec<AlignmentError> {
        let expected = self.zone_count();
        let id_errors = self
            .id_columns
            .iter()
            .filter(|(_, values)| values.len() != expected)
            .map(|(name, values)| AlignmentError::RowCount {
                subject: name.clone(),
                expected,
                actual: values.len(),
            });
        let subject_errors = self
            .subjects
            .iter()
            .filter(|(_, entries)| entries.len() != expected)
            .map(|(subject, entries)| AlignmentError::RowCount {
                subject: subject.clone(),
                expected,
                actual: entries.len(),
            });

        id_errors
            .chain(subject_errors)
            .chain(self.short_tables.iter().cloned())
            .collect()
    }

    /// Apply `policy` to the row alignment check
    pub fn enforce_row_alignment(self, policy: AlignmentPolicy) -> Result<Self, AlignmentError> {
        let errors = self.row_alignment_errors();
        match policy {
            AlignmentPolicy::Strict => match errors.into_iter().next() {
                Some(e) => Err(e),
                None => Ok(self),
            },
            AlignmentPolicy::Lenient => {
                for e in &errors {
                    warn!("Keeping misaligned rows: {}", e);
                }
                Ok(self)
            }
        }
    }

    pub fn with_geometry(mut self, geometry: Vec<Value>) -> Self {
        self.geometry = geometry;
        self
    }

    /// Package as one feature per zone. Missing values become null.
    pub fn into_feature_collection(self, crs: Option<Crs>) -> FeatureCollection {
        let zone_count = self
            .zone_count()
            .max(self.subjects.values().map(Vec::len).max().unwrap_or(0));

        let mut geometry = self.geometry.into_iter();
        let features = (0..zone_count)
            .map(|idx| {
                let mut properties = Map::new();
                for (name, values) in &self.id_columns {
                    let value = values.get(idx).cloned().unwrap_or(CellValue::Null);
                    properties.insert(name.clone(), value.into());
                }
                for (subject, entries) in &self.subjects {
                    let value = entries
                        .get(idx)
                        .map(subject_entry_to_json)
                        .unwrap_or(Value::Null);
                    properties.insert(subject.clone(), value);
                }
                Feature::new(properties, geometry.next())
            })
            .collect();

        FeatureCollection::new(features, crs)
    }
}

fn subject_entry_to_json(entry: &SubjectEntry) -> Value {
    let map: Map<String, Value> = entry
        .iter()
        .map(|(sub_subject, columns)| {
            let columns: Map<String, Value> = columns
                .iter()
                .map(|(name, value)| (name.clone(), value.clone().into()))
                .collect();
            (sub_subject.clone(), Value::Object(columns))
        })
        .collect();
    Value::Object(map)
}
