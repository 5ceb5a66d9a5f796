use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::converters::Converter;

pub const POPULATION_KEY: &str = "120UjUkUfX5is20D_SX3z99vfuCHOVuN8RI1yE3-L4OM";
pub const HOUSING_KEY: &str = "1pU_p7FToI3VerocJXSp1-zMtWNk9SsKL_Tv7nImiXF8";
pub const NEIGHBOURHOOD_KEY: &str = "1s51rcfCGPpjc1hx-6B7IqC6IfBjgSR2JAwOsW9ykI3U";

/// Boundary files per age bracket. Only the first one is used for geometry.
pub const AGE_BRACKET_GEOMETRY_URLS: [&str; 4] = [
    "https://kart.trondheim.kommune.no/levekar2020/personer0_17/2018.js",
    "https://kart.trondheim.kommune.no/levekar2020/personer18_34/2018.js",
    "https://kart.trondheim.kommune.no/levekar2020/personer35_66/2018.js",
    "https://kart.trondheim.kommune.no/levekar2020/personer67/2018.js",
];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rectangular cell range such as `A9:G69`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub start_column: char,
    pub start_line: u32,
    pub end_column: char,
    pub end_line: u32,
}

impl CellRange {
    pub const fn new(start_column: char, start_line: u32, end_column: char, end_line: u32) -> Self {
        Self {
            start_column,
            start_line,
            end_column,
            end_line,
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            self.start_column, self.start_line, self.end_column, self.end_line
        )
    }
}

/// How a subject's values are meant to be read. Descriptive only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    Quantity,
    Proportion,
    Average,
    Median,
    Quintiles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputWidget {
    Slider,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSheet {
    pub sub_subject: String,
    pub sheet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSpec {
    pub name: String,
    pub key: String,
    pub sub_sheets: Vec<SubSheet>,
    pub distribution: Distribution,
    pub input_for_values: InputWidget,
    pub input_selection_values: Option<InputWidget>,
    pub column_name: String,
}

/// Everything needed to rebuild the zone dataset from the published sheets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub range: CellRange,
    /// Pass-through columns filled once, from the first table that has them
    pub id_columns: Vec<String>,
    /// Columns kept under each sub-subject; empty keeps everything
    pub retained_columns: Vec<String>,
    pub converters: BTreeMap<String, Converter>,
    /// Id column holding the zone name
    pub id_property: String,
    /// Property of the boundary features matched against `id_property`
    pub id_geo: String,
    pub subjects: Vec<SubjectSpec>,
}

impl Catalog {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn subject_names(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(|s| s.name.as_str())
    }
}

fn sub_sheets(pairs: &[(&str, &str)]) -> Vec<SubSheet> {
    let mut sheets: Vec<SubSheet> = Vec::with_capacity(pairs.len());
    for (sub_subject, sheet) in pairs {
        if sheets.iter().any(|s| s.sub_subject == *sub_subject) {
            continue;
        }
        sheets.push(SubSheet {
            sub_subject: sub_subject.to_string(),
            sheet: sheet.to_string(),
        });
    }
    sheets
}

impl Default for Catalog {
    fn default() -> Self {
        let subjects = vec![
            SubjectSpec {
                name: "Ages".to_string(),
                key: POPULATION_KEY.to_string(),
                sub_sheets: sub_sheets(&[
                    ("underage (0-17)", "1-10"),
                    ("young adult (18-34)", "1-40"),
                    ("adult (35-66)", "1-70"),
                    ("senior (67+)", "1-100"),
                ]),
                distribution: Distribution::Proportion,
                input_for_values: InputWidget::Slider,
                input_selection_values: None,
                column_name: "Andel".to_string(),
            },
            SubjectSpec {
                name: "Price".to_string(),
                key: HOUSING_KEY.to_string(),
                sub_sheets: sub_sheets(&[
                    ("small", "2-220"),
                    ("medium", "2-240"),
                    ("large", "2-260"),
                ]),
                distribution: Distribution::Average,
                input_for_values: InputWidget::Slider,
                input_selection_values: Some(InputWidget::Checkbox),
                column_name: "Gjennomsnittspris".to_string(),
            },
            SubjectSpec {
                name: "Nærmiljø".to_string(),
                key: NEIGHBOURHOOD_KEY.to_string(),
                sub_sheets: sub_sheets(&[
                    ("trivsel-kvinner", "10-10"),
                    ("trivsel-menn", "10-20"),
                    ("trygghet-kvinner", "10-30"),
                    ("trygghet-menn", "10-40"),
                    ("tilgjengelighet kultur-kvinner", "10-50"),
                    ("tilgjengelighet kultur-menn", "10-60"),
                    ("tilgjengelighet friluftsområder-kvinner", "10-90"),
                    ("tilgjengelighet friluftsområder-menn", "10-100"),
                    ("tilgjengelighet offentlig transport-kvinner", "10-110"),
                    ("tilgjengelighet offentlig transport-menn", "10-120"),
                    ("tilgjengelighet butikker-kvinner", "10-130"),
                    ("tilgjengelighet butiker-menn", "10-140"),
                    ("tilgjengelighet gang og sykkelvei-kvinner", "10-150"),
                    ("tilgjengelighet gang og sykkelvei-menn", "10-160"),
                    ("plaget av trafikk støy-kvinner", "10-170"),
                    ("plaget av trafikk støy-menn", "10-180"),
                    ("plaget av annen støy-kvinner", "10-190"),
                    ("plaget av annen støy-menn", "10-200"),
                ]),
                distribution: Distribution::Proportion,
                input_for_values: InputWidget::Slider,
                input_selection_values: None,
                column_name: "Andel".to_string(),
            },
        ];

        Self {
            range: CellRange::new('A', 9, 'G', 69),
            id_columns: vec!["Levekårsone-nummer".to_string(), "Levekårsnavn".to_string()],
            retained_columns: vec![
                "Andel".to_string(),
                "Antall".to_string(),
                "Gjennomsnittspris".to_string(),
            ],
            converters: BTreeMap::from([
                ("Andel".to_string(), Converter::PercentToFraction),
                ("Gjennomsnittspris".to_string(), Converter::ThousandsToInt),
            ]),
            id_property: "Levekårsnavn".to_string(),
            id_geo: "levekårsone".to_string(),
            subjects,
        }
    }
}
