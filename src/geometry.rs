use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::fetch_error::FetchError;
use crate::geojson::FeatureCollection;
use crate::merge::{AlignmentError, AlignmentPolicy, PropertyMap};

/// Where zone boundaries come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    Remote(String),
    Local(PathBuf),
}

impl GeometrySource {
    /// `http(s)://` locations are fetched, anything else is a file path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            GeometrySource::Remote(location.to_string())
        } else {
            GeometrySource::Local(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for GeometrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometrySource::Remote(url) => write!(f, "{url}"),
            GeometrySource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone)]
pub struct GeometryLoader {
    client: reqwest::Client,
    source: GeometrySource,
}

impl GeometryLoader {
    pub fn new(source: GeometrySource) -> Self {
        Self {
            client: reqwest::Client::new(),
            source,
        }
    }

    #[instrument(skip(self), fields(source = %self.source))]
    pub async fn load(&self) -> Result<GeometryDataset, FetchError> {
        let text = match &self.source {
            GeometrySource::Remote(url) => {
                debug!("Sending HTTP request for boundaries");
                let response = self.client.get(url).send().await?;
                let status = response.status();
                debug!("Received HTTP response with status: {}", status);
                if !status.is_success() {
                    return Err(FetchError::Status {
                        status,
                        url: url.clone(),
                    });
                }
                response.text().await?
            }
            GeometrySource::Local(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| FetchError::GeometryFile {
                    path: path.display().to_string(),
                    source,
                })?,
        };
        debug!("Retrieved boundary content, size: {} bytes", text.len());

        let dataset = GeometryDataset::from_json(&text)?;
        info!("Loaded {} boundary features", dataset.len());
        Ok(dataset)
    }
}

/// Boundary features, looked up by a name-like property
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDataset {
    collection: FeatureCollection,
}

impl GeometryDataset {
    pub fn new(collection: FeatureCollection) -> Self {
        Self { collection }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(FeatureCollection::from_json(text)?))
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Geometry of the first feature whose `id_geo` property equals `name`.
    ///
    /// Linear scan; boundary sets are a few dozen zones.
    pub fn find(&self, id_geo: &str, name: &str) -> Option<Value> {
        self.collection
            .features
            .iter()
            .find(|feature| {
                feature
                    .property(id_geo)
                    .is_some_and(|value| property_matches(value, name))
            })
            .map(|feature| feature.geometry.clone().unwrap_or(Value::Null))
    }
}

fn property_matches(value: &Value, name: &str) -> bool {
    match value {
        Value::String(s) => s == name,
        Value::Number(n) => n.to_string() == name,
        _ => false,
    }
}

/// Match result for one zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMatch {
    pub name: Option<String>,
    pub geometry: Option<Value>,
}

/// Look up the geometry of every zone, in zone order.
pub fn match_zones(
    properties: &PropertyMap,
    dataset: &GeometryDataset,
    id_property: &str,
    id_geo: &str,
) -> Result<Vec<ZoneMatch>, AlignmentError> {
    let names = properties
        .id_column(id_property)
        .filter(|names| !names.is_empty())
        .ok_or_else(|| AlignmentError::MissingIdColumn(id_property.to_string()))?;

    Ok(names
        .iter()
        .map(|cell| {
            let name = cell.as_match_key();
            let geometry = name.as_deref().and_then(|n| dataset.find(id_geo, n));
            ZoneMatch { name, geometry }
        })
        .collect())
}

/// Fill the geometry sequence of `properties` from `dataset`.
///
/// Strict: any zone without a boundary is an error. Lenient: unmatched zones
/// are skipped, so the geometry sequence can end up shorter than the zone list.
#[instrument(skip(properties, dataset), fields(zones = properties.zone_count(), boundaries = dataset.len()))]
pub fn attach_geometry(
    properties: PropertyMap,
    dataset: &GeometryDataset,
    id_property: &str,
    id_geo: &str,
    policy: AlignmentPolicy,
) -> Result<PropertyMap, AlignmentError> {
    let matches = match_zones(&properties, dataset, id_property, id_geo)?;

    let unmatched: Vec<String> = matches
        .iter()
        .filter(|m| m.geometry.is_none())
        .map(|m| m.name.clone().unwrap_or_else(|| "<null>".to_string()))
        .collect();

    if !unmatched.is_empty() {
        let err = AlignmentError::UnmatchedZones { names: unmatched };
        match policy {
            AlignmentPolicy::Strict => return Err(err),
            AlignmentPolicy::Lenient => warn!("Skipping zones: {}", err),
        }
    }

    let geometry: Vec<Value> = matches.into_iter().filter_map(|m| m.geometry).collect();
    debug!("Attached {} geometries", geometry.len());
    Ok(properties.with_geometry(geometry))
}
