//! Two-tier dataset retrieval: remote BMRS endpoint first, local files second.
//!
//! Sources are tried in order and the first one that yields at least one row
//! wins. A failed attempt is logged and recovered by moving on; only when every
//! source has failed does the caller see `DataUnavailable`.
//!
//! Decoding is row-tolerant: a row that does not deserialize is counted and
//! skipped rather than failing the whole payload.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::AppError;
use crate::models::Dataset;
use crate::services::elexon::ElexonClient;

/// A raw row type tied to the dataset it is decoded from.
pub trait RawRow: DeserializeOwned {
    const DATASET: Dataset;
}

/// One FUELINST row as published (JSON camelCase) or exported (PascalCase CSV).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawFuelRow {
    #[serde(rename = "startTime", alias = "StartTime", default)]
    pub start_time: Option<String>,
    #[serde(rename = "fuelType", alias = "FuelType", default)]
    pub fuel_type: Option<String>,
    #[serde(alias = "Generation", default)]
    pub generation: Option<f64>,
}

impl RawRow for RawFuelRow {
    const DATASET: Dataset = Dataset::Fuelinst;
}

/// One TSDF row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDemandRow {
    #[serde(rename = "startTime", alias = "StartTime", default)]
    pub start_time: Option<String>,
    #[serde(rename = "publishTime", alias = "PublishTime", default)]
    pub publish_time: Option<String>,
    #[serde(alias = "Demand", default)]
    pub demand: Option<f64>,
    #[serde(alias = "Boundary", default)]
    pub boundary: Option<String>,
}

impl RawRow for RawDemandRow {
    const DATASET: Dataset = Dataset::Tsdf;
}

/// Rows decoded from a single source, with provenance.
#[derive(Debug, Clone)]
pub struct FetchedRows<R> {
    pub dataset: Dataset,
    /// Human-readable description of the source that served the rows.
    pub source: String,
    /// True when the rows came from a local fallback file.
    pub fallback: bool,
    pub rows: Vec<R>,
    /// Rows present in the payload that could not be decoded.
    pub undecodable: usize,
}

/// Where a dataset can be loaded from.
#[derive(Debug, Clone)]
pub enum DataSource {
    Remote(ElexonClient),
    /// Directory holding `FUELINST.*` / `TSDF.*` fallback files.
    LocalDir(PathBuf),
}

impl DataSource {
    pub fn describe(&self, dataset: Dataset) -> String {
        match self {
            DataSource::Remote(client) => format!("remote {}", client.dataset_url(dataset)),
            DataSource::LocalDir(dir) => format!("local dir {}", dir.display()),
        }
    }

    async fn fetch<R: RawRow>(&self) -> Result<FetchedRows<R>, AppError> {
        match self {
            DataSource::Remote(client) => {
                let source = self.describe(R::DATASET);
                let body = client.fetch_dataset_body(R::DATASET).await?;
                let decoded = decode_json_rows::<R>(&body)
                    .map_err(|e| AppError::retrieval(&source, e))?;
                into_fetched(source, false, decoded)
            }
            DataSource::LocalDir(dir) => fetch_from_dir::<R>(dir),
        }
    }
}

/// Load a dataset from the first source that succeeds.
pub async fn fetch_dataset<R: RawRow>(sources: &[DataSource]) -> Result<FetchedRows<R>, AppError> {
    let mut failures = Vec::new();

    for source in sources {
        match source.fetch::<R>().await {
            Ok(fetched) => {
                tracing::info!(
                    "Loaded {} rows of {} from {} ({} undecodable)",
                    fetched.rows.len(),
                    R::DATASET,
                    fetched.source,
                    fetched.undecodable
                );
                return Ok(fetched);
            }
            Err(e) => {
                tracing::warn!("{}: {}", R::DATASET, e);
                failures.push(e.to_string());
            }
        }
    }

    let message = if failures.is_empty() {
        "no data sources configured".to_string()
    } else {
        failures.join("; ")
    };
    Err(AppError::DataUnavailable {
        dataset: R::DATASET,
        message,
    })
}

struct Decoded<R> {
    rows: Vec<R>,
    undecodable: usize,
}

fn into_fetched<R: RawRow>(
    source: String,
    fallback: bool,
    decoded: Decoded<R>,
) -> Result<FetchedRows<R>, AppError> {
    if decoded.rows.is_empty() {
        return Err(AppError::retrieval(
            &source,
            format!(
                "no usable {} rows ({} undecodable)",
                R::DATASET,
                decoded.undecodable
            ),
        ));
    }
    Ok(FetchedRows {
        dataset: R::DATASET,
        source,
        fallback,
        rows: decoded.rows,
        undecodable: decoded.undecodable,
    })
}

fn fetch_from_dir<R: RawRow>(dir: &Path) -> Result<FetchedRows<R>, AppError> {
    let mut tried = Vec::new();

    for name in R::DATASET.fallback_files() {
        let path = dir.join(name);
        if !path.is_file() {
            tried.push(format!("{} (missing)", name));
            continue;
        }

        let source = format!("file {}", path.display());
        let result = std::fs::read(&path)
            .map_err(|e| format!("read failed: {}", e))
            .and_then(|bytes| {
                if is_csv(&path) {
                    decode_csv_rows::<R>(&bytes)
                } else {
                    decode_json_rows::<R>(&bytes)
                }
            })
            .map_err(|e| AppError::retrieval(&source, e))
            .and_then(|decoded| into_fetched(source.clone(), true, decoded));

        match result {
            Ok(fetched) => return Ok(fetched),
            Err(e) => {
                tracing::debug!("{}: {}", R::DATASET, e);
                tried.push(format!("{} ({})", name, e));
            }
        }
    }

    Err(AppError::retrieval(
        format!("local dir {}", dir.display()),
        format!("no usable fallback file, tried {}", tried.join(", ")),
    ))
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Decode a BMRS JSON payload: either `{"data": [...]}` or a bare array.
fn decode_json_rows<R: RawRow>(bytes: &[u8]) -> Result<Decoded<R>, String> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON: {}", e))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("data") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err("JSON object has no 'data' array".to_string()),
        },
        _ => return Err("JSON payload is neither an array nor an object".to_string()),
    };

    let mut rows = Vec::with_capacity(items.len());
    let mut undecodable = 0;
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<R>(item) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::debug!("{} JSON row {} skipped: {}", R::DATASET, i, e);
                undecodable += 1;
            }
        }
    }

    Ok(Decoded { rows, undecodable })
}

/// Decode a headed CSV export.
fn decode_csv_rows<R: RawRow>(bytes: &[u8]) -> Result<Decoded<R>, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    rdr.headers()
        .map_err(|e| format!("failed to read CSV headers: {}", e))?;

    let mut rows = Vec::new();
    let mut undecodable = 0;
    for (i, result) in rdr.deserialize::<R>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::debug!("{} CSV record {} skipped: {}", R::DATASET, i + 1, e);
                undecodable += 1;
            }
        }
    }

    Ok(Decoded { rows, undecodable })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalize::{normalize_demand, normalize_generation};
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FUELINST_JSON: &str = r#"{
        "data": [
            {"dataset": "FUELINST", "publishTime": "2025-01-15T00:05:00Z", "startTime": "2025-01-15T00:00:00Z",
             "settlementDate": "2025-01-15", "settlementPeriod": 1, "fuelType": "CCGT", "generation": 100},
            {"dataset": "FUELINST", "publishTime": "2025-01-15T00:05:00Z", "startTime": "2025-01-15T00:00:00Z",
             "settlementDate": "2025-01-15", "settlementPeriod": 1, "fuelType": "WIND", "generation": 50},
            {"dataset": "FUELINST", "publishTime": "2025-01-15T00:35:00Z", "startTime": "2025-01-15T00:30:00Z",
             "settlementDate": "2025-01-15", "settlementPeriod": 2, "fuelType": "PS", "generation": -20}
        ]
    }"#;

    const FUELINST_CSV: &str = "\
dataset,publishTime,startTime,settlementDate,settlementPeriod,fuelType,generation
FUELINST,2025-01-15T00:05:00Z,2025-01-15T00:00:00Z,2025-01-15,1,CCGT,100
FUELINST,2025-01-15T00:05:00Z,2025-01-15T00:00:00Z,2025-01-15,1,WIND,50
FUELINST,2025-01-15T00:35:00Z,2025-01-15T00:30:00Z,2025-01-15,2,PS,-20
";

    const TSDF_JSON: &str = r#"[
        {"dataset": "TSDF", "demand": 26000, "publishTime": "2025-01-14T23:00:00Z",
         "startTime": "2025-01-15T00:00:00Z", "settlementDate": "2025-01-15", "settlementPeriod": 1, "boundary": "N"}
    ]"#;

    fn remote(uri: &str) -> DataSource {
        DataSource::Remote(ElexonClient::new(uri, "test", Duration::from_secs(5)).unwrap())
    }

    async fn failing_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_remote_success_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/FUELINST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FUELINST_JSON))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("FUELINST.csv"), "startTime,fuelType,generation\n").unwrap();

        let sources = [remote(&server.uri()), DataSource::LocalDir(dir.path().to_path_buf())];
        let fetched = fetch_dataset::<RawFuelRow>(&sources).await.unwrap();

        assert_eq!(fetched.dataset, Dataset::Fuelinst);
        assert_eq!(fetched.rows.len(), 3);
        assert!(fetched.source.starts_with("remote "), "source: {}", fetched.source);
        assert!(!fetched.fallback);
    }

    #[tokio::test]
    async fn test_fallback_matches_remote_after_normalization() {
        let ok_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/FUELINST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FUELINST_JSON))
            .mount(&ok_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/TSDF"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TSDF_JSON))
            .mount(&ok_server)
            .await;
        let bad_server = failing_server().await;

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("FUELINST.csv"), FUELINST_CSV).unwrap();
        std::fs::write(dir.path().join("TSDF.json"), TSDF_JSON).unwrap();
        let local = DataSource::LocalDir(dir.path().to_path_buf());

        let from_remote = fetch_dataset::<RawFuelRow>(&[remote(&ok_server.uri())])
            .await
            .unwrap();
        let from_file = fetch_dataset::<RawFuelRow>(&[remote(&bad_server.uri()), local.clone()])
            .await
            .unwrap();
        assert!(from_file.source.starts_with("file "), "source: {}", from_file.source);
        assert!(from_file.fallback);
        assert_eq!(
            normalize_generation(&from_remote.rows),
            normalize_generation(&from_file.rows)
        );

        let demand_remote = fetch_dataset::<RawDemandRow>(&[remote(&ok_server.uri())])
            .await
            .unwrap();
        let demand_file = fetch_dataset::<RawDemandRow>(&[remote(&bad_server.uri()), local])
            .await
            .unwrap();
        assert_eq!(
            normalize_demand(&demand_remote.rows),
            normalize_demand(&demand_file.rows)
        );
    }

    #[tokio::test]
    async fn test_no_fallback_is_data_unavailable_fuelinst() {
        let server = failing_server().await;
        let dir = TempDir::new().unwrap();
        let sources = [remote(&server.uri()), DataSource::LocalDir(dir.path().to_path_buf())];

        let err = fetch_dataset::<RawFuelRow>(&sources).await.unwrap_err();
        match err {
            AppError::DataUnavailable { dataset, message } => {
                assert_eq!(dataset, Dataset::Fuelinst);
                assert!(message.contains("FUELINST.csv"), "message: {}", message);
            }
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_fallback_is_data_unavailable_tsdf() {
        let dir = TempDir::new().unwrap();
        let sources = [
            remote("http://127.0.0.1:9"),
            DataSource::LocalDir(dir.path().to_path_buf()),
        ];

        let err = fetch_dataset::<RawDemandRow>(&sources).await.unwrap_err();
        assert!(
            matches!(err, AppError::DataUnavailable { dataset: Dataset::Tsdf, .. }),
            "got {:?}",
            err
        );
        assert!(err.to_string().contains("TSDF"));
    }

    #[tokio::test]
    async fn test_no_sources_configured() {
        let err = fetch_dataset::<RawFuelRow>(&[]).await.unwrap_err();
        assert!(err.to_string().contains("no data sources configured"));
    }

    #[tokio::test]
    async fn test_empty_remote_data_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/datasets/TSDF"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": []}"#))
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("TSDF.json"), TSDF_JSON).unwrap();

        let sources = [remote(&server.uri()), DataSource::LocalDir(dir.path().to_path_buf())];
        let fetched = fetch_dataset::<RawDemandRow>(&sources).await.unwrap();

        assert!(fetched.source.ends_with("TSDF.json"), "source: {}", fetched.source);
        assert_eq!(fetched.rows.len(), 1);
    }

    #[test]
    fn test_second_fallback_file_used_when_first_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("FUELINST.json"), FUELINST_JSON).unwrap();

        let fetched = fetch_from_dir::<RawFuelRow>(dir.path()).unwrap();
        assert!(fetched.source.ends_with("FUELINST.json"));
        assert_eq!(fetched.rows.len(), 3);
    }

    #[test]
    fn test_unusable_fallback_files_reported_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("TSDF.json"), "not json").unwrap();

        let err = fetch_from_dir::<RawDemandRow>(dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("TSDF.json ("), "message: {}", message);
        assert!(message.contains("invalid JSON"), "message: {}", message);
        assert!(message.contains("TSDF.csv (missing)"), "message: {}", message);
    }

    #[test]
    fn test_json_bad_row_is_skipped_not_fatal() {
        let body = r#"{"data": [
            {"startTime": "2025-01-15T00:00:00Z", "fuelType": "CCGT", "generation": 100},
            {"startTime": "2025-01-15T00:00:00Z", "fuelType": "WIND", "generation": "lots"},
            "not even an object"
        ]}"#;
        let decoded = decode_json_rows::<RawFuelRow>(body.as_bytes()).unwrap();
        assert_eq!(decoded.rows.len(), 1);
        assert_eq!(decoded.undecodable, 2);
    }

    #[test]
    fn test_json_object_without_data_rejected() {
        let result = decode_json_rows::<RawFuelRow>(br#"{"error": "nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_pascal_case_headers() {
        let csv = "StartTime,FuelType,Generation\n2025-01-15 00:00:00+00:00,NUCLEAR,4500\n";
        let decoded = decode_csv_rows::<RawFuelRow>(csv.as_bytes()).unwrap();
        assert_eq!(decoded.rows.len(), 1);
        assert_eq!(decoded.rows[0].fuel_type.as_deref(), Some("NUCLEAR"));
        assert_eq!(decoded.rows[0].generation, Some(4500.0));
    }

    #[test]
    fn test_csv_bad_number_is_skipped() {
        let csv = "startTime,fuelType,generation\n\
                   2025-01-15T00:00:00Z,CCGT,100\n\
                   2025-01-15T00:00:00Z,WIND,n/a\n";
        let decoded = decode_csv_rows::<RawFuelRow>(csv.as_bytes()).unwrap();
        assert_eq!(decoded.rows.len(), 1);
        assert_eq!(decoded.undecodable, 1);
    }
}
