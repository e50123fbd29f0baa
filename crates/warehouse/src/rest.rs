//! REST client for the warehouse boundary: table listing, schema fetch and
//! token-paged query results.

use crate::{
    api::{RowPages, TableRef, Warehouse},
    auth::Credentials,
    decode::decode_row,
    error::WarehouseError,
};
use async_trait::async_trait;
use model::{
    core::data_type::RemoteType,
    records::page::Page,
    schema::field::{ColumnDef, FieldDescriptor},
};
use serde::{Deserialize, de::DeserializeOwned};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

#[derive(Clone)]
struct RestContext {
    http: reqwest::Client,
    base_url: String,
    project: String,
    token: String,
}

impl RestContext {
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        params: &[(&str, String)],
    ) -> Result<T, WarehouseError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: String,
        body: &serde_json::Value,
    ) -> Result<T, WarehouseError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn results_page(
        &self,
        job_id: &str,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<QueryResponse, WarehouseError> {
        let url = format!("{}/projects/{}/queries/{job_id}", self.base_url, self.project);
        let mut params = vec![("maxResults", page_size.to_string())];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get_json(url, &params).await
    }
}

/// A [`Warehouse`] talking to the remote REST API with a bearer token.
pub struct RestWarehouse {
    ctx: RestContext,
}

impl RestWarehouse {
    pub fn new(credentials: &Credentials) -> Result<Self, WarehouseError> {
        Ok(RestWarehouse {
            ctx: RestContext {
                http: reqwest::Client::new(),
                base_url: DEFAULT_BASE_URL.to_string(),
                project: credentials.project_id.clone(),
                token: credentials.bearer_token()?,
            },
        })
    }

    /// Target a dataset owned by a different project than the credentials'.
    pub fn with_project(mut self, project: &str) -> Self {
        self.ctx.project = project.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.ctx.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Warehouse for RestWarehouse {
    async fn list_tables(&self, dataset: &str) -> Result<Vec<String>, WarehouseError> {
        let url = format!(
            "{}/projects/{}/datasets/{dataset}/tables",
            self.ctx.base_url, self.ctx.project
        );

        let mut tables = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut params = Vec::new();
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }
            let list: TableList = self.ctx.get_json(url.clone(), &params).await?;
            tables.extend(list.tables.into_iter().map(|t| t.table_reference.table_id));
            page_token = list.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        debug!(dataset, count = tables.len(), "Enumerated dataset tables");
        Ok(tables)
    }

    async fn table_schema(
        &self,
        table: &TableRef,
    ) -> Result<Vec<FieldDescriptor>, WarehouseError> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.ctx.base_url, self.ctx.project, table.dataset, table.table
        );
        let info: TableInfo = self.ctx.get_json(url, &[]).await?;
        info.schema
            .fields
            .into_iter()
            .map(|field| field_from_rest(&table.table, field))
            .collect()
    }

    async fn query(
        &self,
        sql: &str,
        columns: &[ColumnDef],
        page_size: usize,
    ) -> Result<Box<dyn RowPages>, WarehouseError> {
        let url = format!("{}/projects/{}/queries", self.ctx.base_url, self.ctx.project);
        let body = serde_json::json!({
            "query": sql,
            "useLegacySql": false,
            "maxResults": page_size,
        });

        let mut response: QueryResponse = self.ctx.post_json(url, &body).await?;
        let job_id = response.job_reference.job_id.clone();

        // the first page may arrive before the job finishes; poll until it does
        while !response.job_complete {
            response = self.ctx.results_page(&job_id, None, page_size).await?;
        }
        check_job_errors(&job_id, &response)?;
        debug!(%job_id, "Query accepted");

        Ok(Box::new(RestPages {
            ctx: self.ctx.clone(),
            columns: columns.to_vec(),
            page_size,
            job_id,
            pending: Some(response),
            next_token: None,
            number: 0,
        }))
    }
}

/// Token-paged consumption of one query's result set.
struct RestPages {
    ctx: RestContext,
    columns: Vec<ColumnDef>,
    page_size: usize,
    job_id: String,
    /// First page, fetched inline with the query submission.
    pending: Option<QueryResponse>,
    next_token: Option<String>,
    number: usize,
}

#[async_trait]
impl RowPages for RestPages {
    async fn next_page(&mut self) -> Result<Option<Page>, WarehouseError> {
        let response = match self.pending.take() {
            Some(response) => response,
            None => match self.next_token.take() {
                Some(token) => {
                    self.ctx
                        .results_page(&self.job_id, Some(&token), self.page_size)
                        .await?
                }
                None => return Ok(None),
            },
        };
        check_job_errors(&self.job_id, &response)?;
        self.next_token = response.page_token.clone();

        let rows = response
            .rows
            .iter()
            .map(|row| decode_row(&self.columns, row))
            .collect::<Result<Vec<_>, _>>()?;
        self.number += 1;
        Ok(Some(Page::new(self.number, rows)))
    }
}

fn check_job_errors(job_id: &str, response: &QueryResponse) -> Result<(), WarehouseError> {
    match response.errors.first() {
        Some(err) => Err(WarehouseError::Query {
            job_id: job_id.to_string(),
            reason: err.message.clone(),
        }),
        None => Ok(()),
    }
}

fn field_from_rest(table: &str, field: RestField) -> Result<FieldDescriptor, WarehouseError> {
    let remote_type =
        RemoteType::from_str(&field.field_type).map_err(|_| WarehouseError::UnknownType {
            table: table.to_string(),
            type_name: field.field_type.clone(),
        })?;
    let fields = field
        .fields
        .into_iter()
        .map(|sub| field_from_rest(table, sub))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FieldDescriptor {
        name: field.name,
        remote_type,
        fields,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableList {
    #[serde(default)]
    tables: Vec<TableListEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableListEntry {
    table_reference: TableReference,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableReference {
    table_id: String,
}

#[derive(Debug, Deserialize)]
struct TableInfo {
    schema: RestSchema,
}

#[derive(Debug, Deserialize)]
struct RestSchema {
    #[serde(default)]
    fields: Vec<RestField>,
}

#[derive(Debug, Deserialize)]
struct RestField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    fields: Vec<RestField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    job_reference: JobReference,
    #[serde(default)]
    rows: Vec<serde_json::Value>,
    page_token: Option<String>,
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    errors: Vec<JobError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_fields_convert_recursively() {
        let raw: RestSchema = serde_json::from_str(
            r#"{"fields": [
                {"name": "id", "type": "INTEGER"},
                {"name": "datastream_metadata", "type": "RECORD", "fields": [
                    {"name": "source_timestamp", "type": "INTEGER"}
                ]}
            ]}"#,
        )
        .unwrap();

        let fields = raw
            .fields
            .into_iter()
            .map(|f| field_from_rest("orders", f))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(fields[0], FieldDescriptor::new("id", RemoteType::Integer));
        assert_eq!(fields[1].remote_type, RemoteType::Record);
        assert_eq!(fields[1].fields.len(), 1);
    }

    #[test]
    fn test_unknown_schema_type_is_an_error() {
        let field = RestField {
            name: "span".to_string(),
            field_type: "INTERVAL".to_string(),
            fields: Vec::new(),
        };
        let err = field_from_rest("orders", field).unwrap_err();
        assert!(matches!(
            err,
            WarehouseError::UnknownType { table, type_name }
                if table == "orders" && type_name == "INTERVAL"
        ));
    }

    #[test]
    fn test_query_response_deserializes() {
        let response: QueryResponse = serde_json::from_str(
            r#"{
                "jobReference": {"jobId": "job_123"},
                "jobComplete": true,
                "rows": [{"f": [{"v": "1"}]}],
                "pageToken": "tok"
            }"#,
        )
        .unwrap();

        assert_eq!(response.job_reference.job_id, "job_123");
        assert!(response.job_complete);
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.page_token.as_deref(), Some("tok"));
        assert!(response.errors.is_empty());
    }
}
