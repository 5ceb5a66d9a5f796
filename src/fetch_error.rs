#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("Failed to parse delimited data: {0}")]
    Csv(#[from] csv::Error),
    #[error("Sheet returned no header row")]
    MissingHeader,
    #[error("Failed to parse GeoJSON: {0}")]
    GeoJson(#[from] serde_json::Error),
    #[error("Failed to read geometry file {path}: {source}")]
    GeometryFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
