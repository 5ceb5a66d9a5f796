#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use mockito::{Matcher, Mock, ServerGuard};
use zone_atlas_service::catalog::{
    Catalog, Distribution, InputWidget, SubSheet, SubjectSpec,
};
use zone_atlas_service::geometry::{GeometryLoader, GeometrySource};
use zone_atlas_service::merge::AlignmentPolicy;
use zone_atlas_service::services::DatasetService;
use zone_atlas_service::sheet_fetcher::SheetFetcher;
use zone_atlas_service::store::GeoJsonStore;

pub const AGES_KEY: &str = "AGES_KEY";
pub const PRICE_KEY: &str = "PRICE_KEY";

pub const YOUNG_CSV: &str = "\"Levekårsone-\nnummer\",\"Levekårsnavn\",\"Andel\",\"Antall\",\"Konfidensintervall\"\n\
\"1\",\"Sentrum\",\"10%\",\"120\",\"±2\"\n\
\"2\",\"Lerkendal\",\"20%\",\"80\",\"±3\"\n";

pub const SENIOR_CSV: &str = "\"Levekårsone-\nnummer\",\"Levekårsnavn\",\"Andel\",\"Antall\",\"Konfidensintervall\"\n\
\"1\",\"Sentrum\",\"30%\",\"60\",\"±2\"\n\
\"2\",\"Lerkendal\",\"40%\",\"50\",\"±3\"\n";

/// Same zones as the age sheets but spelled differently; the first table's names must win
pub const SMALL_PRICE_CSV: &str = "\"Levekårsone-\nnummer\",\"Levekårsnavn\",\"Gjennomsnittspris\"\n\
\"1\",\"Sentrum sone\",\"3\u{a0}100\u{a0}000\"\n\
\"2\",\"Lerkendal sone\",\"..\"\n";

pub const BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"levekårsone": "Lerkendal"},
     "geometry": {"type": "Polygon", "coordinates": [[[10.39, 63.41], [10.40, 63.41], [10.40, 63.42], [10.39, 63.41]]]}},
    {"type": "Feature", "properties": {"levekårsone": "Sentrum"},
     "geometry": {"type": "Polygon", "coordinates": [[[10.39, 63.43], [10.40, 63.43], [10.40, 63.44], [10.39, 63.43]]]}}
  ]
}"#;

pub const SENTRUM_ONLY_BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {"type": "Feature", "properties": {"levekårsone": "Sentrum"},
     "geometry": {"type": "Point", "coordinates": [10.39, 63.43]}}
  ]
}"#;

/// Two subjects: Ages (young, senior) and Price (small)
pub fn test_catalog() -> Catalog {
    Catalog {
        subjects: vec![
            SubjectSpec {
                name: "Ages".to_string(),
                key: AGES_KEY.to_string(),
                sub_sheets: vec![
                    SubSheet {
                        sub_subject: "young adult (18-34)".to_string(),
                        sheet: "1-40".to_string(),
                    },
                    SubSheet {
                        sub_subject: "senior (67+)".to_string(),
                        sheet: "1-100".to_string(),
                    },
                ],
                distribution: Distribution::Proportion,
                input_for_values: InputWidget::Slider,
                input_selection_values: None,
                column_name: "Andel".to_string(),
            },
            SubjectSpec {
                name: "Price".to_string(),
                key: PRICE_KEY.to_string(),
                sub_sheets: vec![SubSheet {
                    sub_subject: "small".to_string(),
                    sheet: "2-220".to_string(),
                }],
                distribution: Distribution::Average,
                input_for_values: InputWidget::Slider,
                input_selection_values: Some(InputWidget::Checkbox),
                column_name: "Gjennomsnittspris".to_string(),
            },
        ],
        ..Catalog::default()
    }
}

/// Mock one published sheet range
pub async fn mock_sheet(server: &mut ServerGuard, key: &str, sheet: &str, body: &str) -> Mock {
    server
        .mock("GET", format!("/{key}/gviz/tq").as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("tqx".into(), "out:csv".into()),
            Matcher::UrlEncoded("range".into(), "A9:G69".into()),
            Matcher::UrlEncoded("sheet".into(), sheet.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/csv; charset=utf-8")
        .with_body(body)
        .create_async()
        .await
}

/// Mock every sheet of [`test_catalog`]
pub async fn mock_all_sheets(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        mock_sheet(server, AGES_KEY, "1-40", YOUNG_CSV).await,
        mock_sheet(server, AGES_KEY, "1-100", SENIOR_CSV).await,
        mock_sheet(server, PRICE_KEY, "2-220", SMALL_PRICE_CSV).await,
    ]
}

pub fn write_boundaries(dir: &Path, body: &str) -> String {
    let path = dir.join("boundaries.geojson");
    std::fs::write(&path, body).expect("Failed to write boundary fixture");
    path.display().to_string()
}

pub fn dataset_service(
    sheets_base_url: String,
    geometry_source: &str,
    output_path: &Path,
    policy: AlignmentPolicy,
) -> DatasetService {
    DatasetService::new(
        SheetFetcher::new(sheets_base_url),
        GeometryLoader::new(GeometrySource::parse(geometry_source)),
        Arc::new(test_catalog()),
        GeoJsonStore::new(output_path),
        policy,
    )
}
