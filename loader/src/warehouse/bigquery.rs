//! BigQuery REST client.
//!
//! | Call           | Endpoint                                                     |
//! |----------------|--------------------------------------------------------------|
//! | dataset exists | `GET  projects/{p}/datasets/{d}`                             |
//! | table exists   | `GET  projects/{p}/datasets/{d}/tables/{t}`                  |
//! | insert rows    | `POST projects/{p}/datasets/{d}/tables/{t}/insertAll`        |

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AccessToken, RowInsertError, TableRef, Warehouse};
use crate::error::{WarehouseError, WarehouseResult};

pub const DEFAULT_API_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Google API error envelope.
#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// `tabledata.insertAll` response.
#[derive(Debug, Deserialize)]
struct InsertAllResponse {
    #[serde(default, rename = "insertErrors")]
    insert_errors: Vec<RowInsertError>,
}

#[derive(Clone)]
pub struct BigQueryClient {
    http: Client,
    base_url: Url,
    token: AccessToken,
}

impl BigQueryClient {
    /// Client over `http`, which carries the request timeout.
    pub fn new(http: Client, token: AccessToken, base_url: &str) -> WarehouseResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| WarehouseError::Request(format!("invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(WarehouseError::Request(format!("invalid API URL '{}'", base_url)));
        }

        Ok(Self { http, base_url, token })
    }

    fn dataset_url(&self, project: &str, dataset: &str) -> Url {
        self.url(&["projects", project, "datasets", dataset])
    }

    fn table_url(&self, table: &TableRef) -> Url {
        self.url(&[
            "projects",
            &table.project,
            "datasets",
            &table.dataset,
            "tables",
            &table.table,
        ])
    }

    fn insert_url(&self, table: &TableRef) -> Url {
        let mut url = self.table_url(table);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("insertAll");
        }
        url
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn resource_exists(&self, url: Url) -> WarehouseResult<bool> {
        let response = self
            .http
            .get(url)
            .bearer_auth(self.token.secret())
            .send()
            .await
            .map_err(|e| WarehouseError::Request(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(api_error(status, &body))
            }
        }
    }
}

impl Warehouse for BigQueryClient {
    async fn dataset_exists(&self, project: &str, dataset: &str) -> WarehouseResult<bool> {
        self.resource_exists(self.dataset_url(project, dataset)).await
    }

    async fn table_exists(&self, table: &TableRef) -> WarehouseResult<bool> {
        self.resource_exists(self.table_url(table)).await
    }

    async fn insert_rows(&self, table: &TableRef, rows: &[Value]) -> WarehouseResult<Vec<RowInsertError>> {
        let body = insert_all_body(rows);

        let response = self
            .http
            .post(self.insert_url(table))
            .bearer_auth(self.token.secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| WarehouseError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| WarehouseError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(api_error(status, &text));
        }

        parse_insert_response(&text)
    }
}

fn insert_all_body(rows: &[Value]) -> Value {
    json!({
        "kind": "bigquery#tableDataInsertAllRequest",
        "skipInvalidRows": false,
        "ignoreUnknownValues": false,
        "rows": rows.iter().map(|row| json!({ "json": row })).collect::<Vec<_>>(),
    })
}

fn parse_insert_response(text: &str) -> WarehouseResult<Vec<RowInsertError>> {
    let response: InsertAllResponse =
        serde_json::from_str(text).map_err(|e| WarehouseError::InvalidResponse(e.to_string()))?;
    Ok(response.insert_errors)
}

fn api_error(status: StatusCode, body: &str) -> WarehouseError {
    let message = match serde_json::from_str::<GoogleError>(body) {
        Ok(GoogleError { error }) => match error.status {
            Some(code) => format!("{} ({})", error.message, code),
            None => error.message,
        },
        Err(_) => body.trim().to_string(),
    };
    WarehouseError::Api {
        status: status.as_u16(),
        message,
    }
}
