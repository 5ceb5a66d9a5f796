use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CRS84: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsProperties {
    pub name: String,
}

/// Named CRS member as written by common GIS tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: CrsProperties,
}

impl Crs {
    pub fn named(name: &str) -> Self {
        Self {
            kind: "name".to_string(),
            properties: CrsProperties {
                name: name.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Value>,
}

impl Feature {
    pub fn new(properties: Map<String, Value>, geometry: Option<Value>) -> Self {
        Self {
            kind: "Feature".to_string(),
            id: None,
            properties: Some(properties),
            geometry,
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Crs>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>, crs: Option<Crs>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            crs,
            features,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_geometry_is_serialized() {
        let feature = Feature::new(Map::new(), None);
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(
            value,
            json!({"type": "Feature", "properties": {}, "geometry": null})
        );
    }

    #[test]
    fn test_collection_with_crs() {
        let collection = FeatureCollection::new(vec![], Some(Crs::named(CRS84)));
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["crs"]["properties"]["name"], CRS84);
        assert_eq!(value["type"], "FeatureCollection");
    }

    #[test]
    fn test_parse_collection_without_crs_or_geometry() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"levekårsone":"Sentrum"}}]}"#;
        let collection = FeatureCollection::from_json(text).unwrap();

        assert_eq!(collection.len(), 1);
        assert!(collection.crs.is_none());
        assert!(collection.features[0].geometry.is_none());
        assert_eq!(
            collection.features[0].property("levekårsone"),
            Some(&json!("Sentrum"))
        );
    }
}
