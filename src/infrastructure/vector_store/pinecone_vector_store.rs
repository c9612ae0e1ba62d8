use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;

use crate::application::ports::vector_store::{VectorQuery, VectorStore, VectorStoreError};
use crate::domain::entities::{ScoredRecord, VectorMetadata, VectorRecord};

const UPSERT_BATCH_SIZE: usize = 100;
const FETCH_BATCH_SIZE: usize = 100;
const LIST_PAGE_SIZE: usize = 100;
const API_VERSION: &str = "2024-07";

#[derive(Debug, Clone)]
pub struct PineconeConfig {
    /// Data-plane host of the index, with or without scheme.
    pub index_host: String,
    pub api_key: String,
    pub namespace: String,
    pub timeout_secs: u64,
}

/// Pinecone data-plane REST client.
pub struct PineconeVectorStore {
    client: Client,
    base_url: String,
    config: PineconeConfig,
}

#[derive(Serialize)]
struct WireVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a VectorMetadata,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: VectorMetadata,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListedId>,
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ListedId {
    id: String,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<String>,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, FetchedVector>,
}

#[derive(Deserialize)]
struct FetchedVector {
    id: String,
    #[serde(default)]
    values: Vec<f32>,
    #[serde(default)]
    metadata: VectorMetadata,
}

impl PineconeVectorStore {
    pub fn new(config: PineconeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let host = config.index_host.trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, VectorStoreError> {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|e| VectorStoreError::NetworkError(e.without_url().to_string()))?;

        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, VectorStoreError> {
        let url = format!("{}{}", self.base_url, path);
        self.send(self.client.post(url).json(body)).await
    }

    async fn list_ids(&self) -> Result<Vec<String>, VectorStoreError> {
        let url = format!("{}/vectors/list", self.base_url);
        let limit = LIST_PAGE_SIZE.to_string();
        let mut ids = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut params = vec![("namespace", self.config.namespace.as_str()), ("limit", limit.as_str())];
            if let Some(token) = token.as_deref() {
                params.push(("paginationToken", token));
            }

            let page: ListResponse = self.send(self.client.get(&url).query(&params)).await?;
            ids.extend(page.vectors.into_iter().map(|v| v.id));

            match page.pagination.and_then(|p| p.next) {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }

        Ok(ids)
    }

    async fn fetch(&self, ids: &[String]) -> Result<Vec<VectorRecord>, VectorStoreError> {
        let url = format!("{}/vectors/fetch", self.base_url);
        let mut params: Vec<(&str, &str)> = vec![("namespace", self.config.namespace.as_str())];
        params.extend(ids.iter().map(|id| ("ids", id.as_str())));

        let response: FetchResponse = self.send(self.client.get(&url).query(&params)).await?;

        let mut records: Vec<VectorRecord> = response
            .vectors
            .into_values()
            .map(|v| VectorRecord {
                id: v.id,
                values: Vector::from(v.values),
                metadata: v.metadata,
            })
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

async fn check_status(response: Response) -> Result<Response, VectorStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(VectorStoreError::ApiError {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<(), VectorStoreError> {
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let vectors: Vec<WireVector> = batch
                .iter()
                .map(|r| WireVector {
                    id: &r.id,
                    values: r.values.as_slice(),
                    metadata: &r.metadata,
                })
                .collect();

            let _: Value = self
                .post(
                    "/vectors/upsert",
                    &json!({ "vectors": vectors, "namespace": self.config.namespace }),
                )
                .await?;
            tracing::debug!("Upserted {} vectors", batch.len());
        }
        Ok(())
    }

    async fn query(&self, query: VectorQuery) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        let mut body = json!({
            "vector": query.vector.as_slice(),
            "topK": query.top_k,
            "includeMetadata": true,
            "includeValues": false,
            "namespace": self.config.namespace,
        });
        if let Some(filter) = &query.filter {
            body["filter"] = filter.to_json();
        }

        let response: QueryResponse = self.post("/query", &body).await?;

        Ok(response
            .matches
            .into_iter()
            .map(|m| ScoredRecord {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
            })
            .collect())
    }

    async fn delete_one(&self, id: &str) -> Result<(), VectorStoreError> {
        let _: Value = self
            .post(
                "/vectors/delete",
                &json!({ "ids": [id], "namespace": self.config.namespace }),
            )
            .await?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), VectorStoreError> {
        for batch in ids.chunks(UPSERT_BATCH_SIZE) {
            let _: Value = self
                .post(
                    "/vectors/delete",
                    &json!({ "ids": batch, "namespace": self.config.namespace }),
                )
                .await?;
        }
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<VectorRecord>, VectorStoreError> {
        let ids = self.list_ids().await?;
        let mut records = Vec::with_capacity(ids.len());

        for batch in ids.chunks(FETCH_BATCH_SIZE) {
            records.extend(self.fetch(batch).await?);
        }

        tracing::debug!("Fetched {} vectors from the index", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::vector_store::MetadataFilter;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> PineconeVectorStore {
        PineconeVectorStore::new(PineconeConfig {
            index_host: server.uri(),
            api_key: "pc-key".to_string(),
            namespace: "docs".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn record(i: usize) -> VectorRecord {
        VectorRecord {
            id: format!("a@b.c/x.pdf/{}", i),
            values: Vector::from(vec![1.0, 0.0]),
            metadata: VectorMetadata {
                file_path: Some("a@b.c/x.pdf".to_string()),
                content: format!("chunk {}", i),
            },
        }
    }

    #[test]
    fn test_host_without_scheme_gets_https() {
        let store = PineconeVectorStore::new(PineconeConfig {
            index_host: "my-index-abc.svc.pinecone.io/".to_string(),
            api_key: String::new(),
            namespace: String::new(),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(store.base_url, "https://my-index-abc.svc.pinecone.io");
    }

    #[tokio::test]
    async fn test_upsert_is_batched_by_one_hundred() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(header("Api-Key", "pc-key"))
            .and(body_partial_json(json!({ "namespace": "docs" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 100 })))
            .expect(3)
            .mount(&server)
            .await;

        let records: Vec<VectorRecord> = (0..250).map(record).collect();
        store(&server).upsert(&records).await.unwrap();
    }

    #[tokio::test]
    async fn test_query_sends_filter_and_reads_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .and(body_partial_json(json!({
                "topK": 3,
                "includeMetadata": true,
                "filter": { "filePath": { "$in": ["a@b.c/x.pdf"] } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "matches": [
                    { "id": "a@b.c/x.pdf/0", "score": 0.91, "metadata": { "filePath": "a@b.c/x.pdf", "content": "Shift starts at 8am" } },
                    { "id": "legacy", "score": 0.5 }
                ],
                "namespace": "docs"
            })))
            .mount(&server)
            .await;

        let matches = store(&server)
            .query(VectorQuery {
                vector: Vector::from(vec![1.0, 0.0]),
                top_k: 3,
                filter: Some(MetadataFilter::FilePathIn(vec!["a@b.c/x.pdf".to_string()])),
            })
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].metadata.content, "Shift starts at 8am");
        assert_eq!(matches[1].metadata.file_path, None);
    }

    #[tokio::test]
    async fn test_fetch_all_follows_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/list"))
            .and(query_param("paginationToken", "page-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vectors": [{ "id": "b" }]
            })))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vectors/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vectors": [{ "id": "a" }],
                "pagination": { "next": "page-2" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "vectors": {
                    "a": { "id": "a", "values": [1.0, 0.0], "metadata": { "filePath": "p/x", "content": "A" } },
                    "b": { "id": "b", "values": [0.0, 1.0], "metadata": { "filePath": "p/x", "content": "B" } }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = store(&server).fetch_all().await.unwrap();

        let contents: Vec<&str> = records.iter().map(|r| r.metadata.content.as_str()).collect();
        assert_eq!(contents, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/delete"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let result = store(&server).delete_one("a").await;

        assert!(matches!(
            result,
            Err(VectorStoreError::ApiError { status: 403, ref message }) if message == "forbidden"
        ));
    }
}
