//! HTTP implementation of [`RemoteStore`] for a REST-style JSON document store.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Response, StatusCode};
use serde_json::Value;

use super::{RemoteCollection, RemoteStore};
use crate::config::RemoteConfig;
use crate::models::NoteId;
use crate::util::compact_text;
use crate::wire::WireNote;
use crate::{Error, Result};

/// Remote store reached over HTTP(S).
#[derive(Clone)]
pub struct HttpRemoteStore {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| Error::Network(format!("failed to build HTTP client: {error}")))?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub const fn config(&self) -> &RemoteConfig {
        &self.config
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_all(&self) -> Result<RemoteCollection> {
        let url = self.config.collection_url();
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| transport_error("GET", &url, &error))?;

        let response = ensure_success(response).await?;
        let body = response
            .text()
            .await
            .map_err(|error| transport_error("GET", &url, &error))?;

        let collection = parse_collection(&body)?;
        tracing::debug!(count = collection.len(), "Fetched remote collection");
        Ok(collection)
    }

    async fn put(&self, id: &NoteId, wire: &WireNote) -> Result<()> {
        if !id.is_assigned() {
            return Err(Error::MissingIdentity);
        }

        let url = self.config.note_url(id.as_str());
        let response = self
            .client
            .put(&url)
            .header(ACCEPT, "application/json")
            .json(wire)
            .send()
            .await
            .map_err(|error| transport_error("PUT", &url, &error))?;

        ensure_success(response).await?;
        tracing::debug!(note = %id, "Pushed note to remote");
        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        if !id.is_assigned() {
            return Err(Error::MissingIdentity);
        }

        let url = self.config.note_url(id.as_str());
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|error| transport_error("DELETE", &url, &error))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(note = %id, "Remote note already absent");
            return Ok(());
        }

        ensure_success(response).await?;
        tracing::debug!(note = %id, "Deleted note from remote");
        Ok(())
    }
}

/// Parse a collection body: `null`/empty is an empty collection, entries
/// that are not note-shaped are skipped.
fn parse_collection(body: &str) -> Result<RemoteCollection> {
    if body.trim().is_empty() {
        return Ok(RemoteCollection::new());
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|error| Error::Decode(format!("invalid collection JSON: {error}")))?;

    let entries = match value {
        Value::Null => return Ok(RemoteCollection::new()),
        Value::Object(entries) => entries,
        other => {
            return Err(Error::Decode(format!(
                "expected a JSON object keyed by identity, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut collection = RemoteCollection::new();
    for (key, value) in entries {
        match WireNote::from_value(value) {
            Ok(wire) => {
                collection.insert(key, wire);
            }
            Err(error) => {
                tracing::warn!(key = %key, %error, "Skipping malformed remote entry");
            }
        }
    }
    Ok(collection)
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = compact_text(&body);
    Err(Error::Protocol {
        status: status.as_u16(),
        message: if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string()
        } else {
            message
        },
    })
}

fn transport_error(method: &str, url: &str, error: &reqwest::Error) -> Error {
    if error.is_decode() {
        Error::Decode(format!("{method} {url}: {error}"))
    } else {
        Error::Network(format!("{method} {url} failed: {error}"))
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct RecordedRequest {
        method: String,
        path: String,
        body: String,
    }

    /// In-process document store speaking just enough HTTP/1.1 for reqwest.
    #[derive(Clone, Default)]
    struct MockDocumentStore {
        documents: Arc<Mutex<BTreeMap<String, Value>>>,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
        forced_status: Arc<Mutex<Option<&'static str>>>,
    }

    impl MockDocumentStore {
        async fn spawn(&self) -> RemoteConfig {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind test server");
            let address = listener.local_addr().expect("local address");
            let store = self.clone();

            tokio::spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    let Some(request) = read_request(&mut socket).await else {
                        continue;
                    };
                    let (status_line, body) = store.respond(request);
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                }
            });

            RemoteConfig::new(format!("http://{address}"), "notes").expect("valid config")
        }

        fn respond(&self, request: RecordedRequest) -> (&'static str, String) {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(status_line) = *self.forced_status.lock().unwrap() {
                return (status_line, "{\"error\":\"forced\"}".to_string());
            }

            let mut documents = self.documents.lock().unwrap();
            if request.path == "/notes.json" && request.method == "GET" {
                if documents.is_empty() {
                    return ("200 OK", "null".to_string());
                }
                return ("200 OK", serde_json::to_string(&*documents).unwrap());
            }

            let Some(key) = request
                .path
                .strip_prefix("/notes/")
                .and_then(|rest| rest.strip_suffix(".json"))
                .map(ToOwned::to_owned)
            else {
                return ("404 Not Found", "null".to_string());
            };

            match request.method.as_str() {
                "PUT" => {
                    let value: Value = serde_json::from_str(&request.body).unwrap();
                    documents.insert(key, value);
                    ("200 OK", request.body)
                }
                "DELETE" => {
                    documents.remove(&key);
                    ("200 OK", "null".to_string())
                }
                _ => ("405 Method Not Allowed", "null".to_string()),
            }
        }

        fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn documents(&self) -> BTreeMap<String, Value> {
            self.documents.lock().unwrap().clone()
        }

        fn force_status(&self, status_line: &'static str) {
            *self.forced_status.lock().unwrap() = Some(status_line);
        }
    }

    async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
        let mut buffer = Vec::new();
        let mut chunk = [0_u8; 4096];

        let header_end = loop {
            let read = socket.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
                break position;
            }
        };

        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let body_start = header_end + 4;
        while buffer.len() < body_start + content_length {
            let read = socket.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);
        }

        let mut request_line = head.lines().next()?.split_whitespace();
        Some(RecordedRequest {
            method: request_line.next()?.to_string(),
            path: request_line.next()?.to_string(),
            body: String::from_utf8_lossy(&buffer[body_start..]).to_string(),
        })
    }

    fn sample_wire(identifier: &str, title: &str) -> WireNote {
        WireNote {
            identifier: identifier.to_string(),
            title: title.to_string(),
            body_text: None,
            timestamp: "2020-01-01T00:00:00Z".to_string(),
            mood: "happy".to_string(),
        }
    }

    #[test]
    fn parse_collection_treats_null_and_empty_as_empty() {
        assert!(parse_collection("null").unwrap().is_empty());
        assert!(parse_collection("  ").unwrap().is_empty());
        assert!(parse_collection("{}").unwrap().is_empty());
    }

    #[test]
    fn parse_collection_rejects_non_object() {
        let error = parse_collection("[1, 2]").unwrap_err();
        assert!(matches!(error, Error::Decode(message) if message.contains("an array")));
        assert!(matches!(parse_collection("{oops"), Err(Error::Decode(_))));
    }

    #[test]
    fn parse_collection_skips_malformed_entries() {
        let body = json!({
            "a1": {
                "identifier": "a1",
                "title": "T",
                "bodyText": null,
                "timestamp": "2020-01-01T00:00:00Z",
                "mood": "happy"
            },
            "broken": 42
        })
        .to_string();

        let collection = parse_collection(&body).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection["a1"], sample_wire("a1", "T"));
    }

    #[tokio::test]
    async fn fetch_all_on_empty_collection_is_empty() {
        let server = MockDocumentStore::default();
        let remote = HttpRemoteStore::new(server.spawn().await).unwrap();

        let collection = remote.fetch_all().await.unwrap();
        assert!(collection.is_empty());
        assert_eq!(server.requests()[0].method, "GET");
        assert_eq!(server.requests()[0].path, "/notes.json");
    }

    #[tokio::test]
    async fn put_then_fetch_all_returns_document() {
        let server = MockDocumentStore::default();
        let remote = HttpRemoteStore::new(server.spawn().await).unwrap();

        remote
            .put(&NoteId::from("a1"), &sample_wire("a1", "T"))
            .await
            .unwrap();
        let collection = remote.fetch_all().await.unwrap();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection["a1"], sample_wire("a1", "T"));
        let put = &server.requests()[0];
        assert_eq!(put.method, "PUT");
        assert_eq!(put.path, "/notes/a1.json");
    }

    #[tokio::test]
    async fn put_is_idempotent() {
        let server = MockDocumentStore::default();
        let remote = HttpRemoteStore::new(server.spawn().await).unwrap();
        let id = NoteId::from("a1");
        let wire = sample_wire("a1", "T");

        remote.put(&id, &wire).await.unwrap();
        let after_once = server.documents();
        remote.put(&id, &wire).await.unwrap();

        assert_eq!(server.documents(), after_once);
        assert_eq!(server.documents().len(), 1);
    }

    #[tokio::test]
    async fn put_without_identity_makes_no_request() {
        let server = MockDocumentStore::default();
        let remote = HttpRemoteStore::new(server.spawn().await).unwrap();

        let error = remote
            .put(&NoteId::unassigned(), &sample_wire("", "T"))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::MissingIdentity));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_document_and_is_idempotent() {
        let server = MockDocumentStore::default();
        let remote = HttpRemoteStore::new(server.spawn().await).unwrap();
        let id = NoteId::from("a1");

        remote.put(&id, &sample_wire("a1", "T")).await.unwrap();
        remote.delete(&id).await.unwrap();
        remote.delete(&id).await.unwrap();

        assert!(server.documents().is_empty());
        assert_eq!(server.requests().len(), 3);
    }

    #[tokio::test]
    async fn delete_treats_not_found_as_success() {
        let server = MockDocumentStore::default();
        let remote = HttpRemoteStore::new(server.spawn().await).unwrap();
        server.force_status("404 Not Found");

        remote.delete(&NoteId::from("gone")).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_protocol_error() {
        let server = MockDocumentStore::default();
        let remote = HttpRemoteStore::new(server.spawn().await).unwrap();
        server.force_status("500 Internal Server Error");

        let error = remote.fetch_all().await.unwrap_err();
        match error {
            Error::Protocol { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("forced"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let error = remote
            .put(&NoteId::from("a1"), &sample_wire("a1", "T"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Protocol { status: 500, .. }));
    }

    #[tokio::test]
    async fn unreachable_remote_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let config = RemoteConfig::new(format!("http://{address}"), "notes").unwrap();
        let remote = HttpRemoteStore::new(config).unwrap();

        let error = remote.fetch_all().await.unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        assert!(error.is_remote());
    }

    #[tokio::test]
    async fn stalled_remote_times_out_as_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((socket, _)) = listener.accept().await {
                tokio::time::sleep(Duration::from_secs(5)).await;
                drop(socket);
            }
        });

        let mut config = RemoteConfig::new(format!("http://{address}"), "notes").unwrap();
        config.timeout = Duration::from_millis(200);
        let remote = HttpRemoteStore::new(config).unwrap();

        let error = remote.fetch_all().await.unwrap_err();
        assert!(matches!(error, Error::Network(_)));
    }
}
