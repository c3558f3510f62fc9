//! Firestore REST backend
//!
//! Talks to the Firestore v1 REST API. Plain JSON field maps are converted
//! to and from Firestore's typed value encoding at this boundary, so the
//! rest of the application only ever sees `serde_json` values.

use super::{Direction, Document, DocumentStore, Fields, Query};
use crate::auth::TokenSource;
use crate::config::BackendConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Number, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Document store backed by Cloud Firestore
#[derive(Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    config: BackendConfig,
    tokens: Arc<dyn TokenSource>,
}

/// Document as returned by the REST API
#[derive(Deserialize, Debug)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// One element of a `:runQuery` response stream
#[derive(Deserialize, Debug)]
struct RunQueryResponse {
    document: Option<FirestoreDocument>,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl FirestoreStore {
    pub fn new(client: reqwest::Client, config: BackendConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client,
            config,
            tokens,
        }
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        Ok(match self.tokens.id_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Map a non-success response to an error, reading the API's error body
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorEnvelope>(&text).ok().map(|e| e.error);

        if status == reqwest::StatusCode::NOT_FOUND
            || body.as_ref().is_some_and(|b| b.status == "NOT_FOUND")
        {
            let message = body.map(|b| b.message).unwrap_or_default();
            return Err(AppError::NotFound(message));
        }

        Err(AppError::Remote {
            service: "Document store",
            status: status.as_u16(),
            message: body.map(|b| b.message).unwrap_or(text),
        })
    }

    async fn commit(&self, write: Value) -> Result<()> {
        let url = format!("{}:commit", self.config.documents_root());
        let request = self.client.post(url).json(&json!({ "writes": [write] }));

        let response = self.authorized(request).await?.send().await?;
        Self::check(response).await?;
        Ok(())
    }

    fn transforms(server_timestamps: &[&str]) -> Value {
        Value::Array(
            server_timestamps
                .iter()
                .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
                .collect(),
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let url = format!("{}/{}/{}", self.config.documents_root(), collection, id);
        let response = self.authorized(self.client.get(url)).await?.send().await?;

        let response = match Self::check(response).await {
            Ok(response) => response,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let doc: FirestoreDocument = response.json().await?;
        Ok(Some(decode_document(doc)?))
    }

    async fn create(
        &self,
        collection: &str,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();

        self.commit(json!({
            "update": {
                "name": self.config.document_name(collection, &id),
                "fields": encode_fields(&fields),
            },
            "currentDocument": { "exists": false },
            "updateTransforms": Self::transforms(server_timestamps),
        }))
        .await?;

        tracing::debug!("Created Firestore document {}/{}", collection, id);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<()> {
        let field_paths: Vec<&String> = fields.keys().collect();

        self.commit(json!({
            "update": {
                "name": self.config.document_name(collection, id),
                "fields": encode_fields(&fields),
            },
            "updateMask": { "fieldPaths": field_paths },
            "currentDocument": { "exists": true },
            "updateTransforms": Self::transforms(server_timestamps),
        }))
        .await?;

        tracing::debug!("Updated Firestore document {}/{}", collection, id);
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>> {
        let url = format!("{}:runQuery", self.config.documents_root());
        let body = json!({ "structuredQuery": structured_query(collection, query) });

        let response = self
            .authorized(self.client.post(url).json(&body))
            .await?
            .send()
            .await?;
        let results: Vec<RunQueryResponse> = Self::check(response).await?.json().await?;

        results
            .into_iter()
            .filter_map(|r| r.document)
            .map(decode_document)
            .collect()
    }
}

/// Build the `structuredQuery` body for a collection query
fn structured_query(collection: &str, query: &Query) -> Value {
    let mut structured = json!({ "from": [{ "collectionId": collection }] });

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|(field, value)| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": encode_value(value),
                }
            })
        })
        .collect();

    match filters.len() {
        0 => {}
        1 => structured["where"] = filters[0].clone(),
        _ => {
            structured["where"] = json!({ "compositeFilter": { "op": "AND", "filters": filters } })
        }
    }

    if let Some((field, direction)) = &query.order_by {
        let direction = match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{ "field": { "fieldPath": field }, "direction": direction }]);
    }

    structured
}

fn decode_document(doc: FirestoreDocument) -> Result<Document> {
    let id = doc
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::DataIntegrity(format!("Malformed document name: {}", doc.name)))?
        .to_string();

    Ok(Document {
        id,
        fields: decode_fields(&doc.fields)?,
    })
}

pub fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), encode_value(value)))
            .collect(),
    )
}

/// Encode a plain JSON value as a Firestore typed value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

/// Decode a Firestore typed value into plain JSON; timestamps become RFC 3339 strings
pub fn decode_value(value: &Value) -> Result<Value> {
    let malformed = || AppError::DataIntegrity(format!("Unrecognised Firestore value: {}", value));

    let (kind, inner) = value
        .as_object()
        .and_then(|obj| obj.iter().next())
        .ok_or_else(malformed)?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner.as_bool().map(Value::Bool).ok_or_else(malformed),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed.map(|i| Value::Number(i.into())).ok_or_else(malformed)
        }
        "doubleValue" => Ok(inner
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => {
            inner.as_str().map(|s| Value::String(s.to_string())).ok_or_else(malformed)
        }
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(items)) => items.iter().map(decode_value).collect::<Result<_>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(map)) => decode_fields(map)?,
                _ => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode_value(&json!("deer")), json!({ "stringValue": "deer" }));
        assert_eq!(encode_value(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode_value(&json!(12.5)), json!({ "doubleValue": 12.5 }));
        assert_eq!(encode_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(encode_value(&Value::Null), json!({ "nullValue": null }));
    }

    #[test]
    fn test_encode_nested_file_list() {
        let encoded = encode_value(&json!([{ "publicId": "abc", "bytes": 2048 }]));

        assert_eq!(
            encoded,
            json!({
                "arrayValue": { "values": [{
                    "mapValue": { "fields": {
                        "publicId": { "stringValue": "abc" },
                        "bytes": { "integerValue": "2048" }
                    }}
                }]}
            })
        );
    }

    #[test]
    fn test_decode_document_from_api() {
        let doc: FirestoreDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/complaints/xyz",
            "fields": {
                "title": { "stringValue": "Injured deer" },
                "clientSubmissionTimestamp": { "integerValue": "1741132800000" },
                "latitude": { "doubleValue": 12.97 },
                "submissionTimestamp": { "timestampValue": "2025-03-05T10:00:00.123456Z" },
                "attachedFiles": { "arrayValue": {} },
                "severity": { "nullValue": null }
            },
            "createTime": "2025-03-05T10:00:00.123456Z"
        }))
        .unwrap();

        let decoded = decode_document(doc).unwrap();

        assert_eq!(decoded.id, "xyz");
        assert_eq!(decoded.fields["title"], "Injured deer");
        assert_eq!(decoded.fields["clientSubmissionTimestamp"], 1_741_132_800_000_i64);
        assert_eq!(decoded.fields["latitude"], 12.97);
        assert_eq!(decoded.fields["submissionTimestamp"], "2025-03-05T10:00:00.123456Z");
        assert_eq!(decoded.fields["attachedFiles"], json!([]));
        assert!(decoded.fields["severity"].is_null());
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let result = decode_value(&json!({ "mysteryValue": 1 }));
        assert!(matches!(result, Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn test_structured_query_for_user_reports() {
        let query = Query::new()
            .where_eq("userId", "u1")
            .order_by("submissionTimestamp", Direction::Descending);

        let structured = structured_query("complaints", &query);

        assert_eq!(structured["from"][0]["collectionId"], "complaints");
        assert_eq!(structured["where"]["fieldFilter"]["field"]["fieldPath"], "userId");
        assert_eq!(structured["where"]["fieldFilter"]["value"]["stringValue"], "u1");
        assert_eq!(structured["orderBy"][0]["direction"], "DESCENDING");
    }

    #[test]
    fn test_structured_query_without_filter() {
        let query = Query::new().order_by("submissionTimestamp", Direction::Descending);
        let structured = structured_query("complaints", &query);

        assert!(structured.get("where").is_none());
    }
}
