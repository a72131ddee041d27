#![allow(dead_code)]

use analytics_mcp::errors::ApiError;
use analytics_mcp::services::http_client::ApiTransport;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

pub const MIB: u64 = 1024 * 1024;
pub const USER_ID: &str = "user-42";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get {
        path: String,
        query: Vec<(String, String)>,
    },
    Post {
        path: String,
        body: Value,
    },
    Put {
        url: String,
        body: Bytes,
    },
}

/// Scripted reply for one request. `Http` and `Network` are turned into the
/// matching transport error when consumed.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(Value),
    Http(u16),
    Network,
}

impl Reply {
    fn into_result(self) -> Result<Value, ApiError> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Http(status) => Err(ApiError::Http {
                status,
                body: "upstream failure".to_string(),
            }),
            Reply::Network => Err(ApiError::Network("connection reset".to_string())),
        }
    }
}

/// In-memory platform. Replies are queued per `"METHOD path"`; the last
/// queued reply for a route repeats once the queue drains to it.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    put_failures: Mutex<HashMap<String, u16>>,
    missing_etags: Mutex<Vec<String>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: &str, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(format!("{} {}", method, path))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn on_ok(&self, method: &str, path: &str, data: Value) -> &Self {
        self.on(method, path, Reply::Ok(envelope(data)))
    }

    pub fn fail_put(&self, url: &str, status: u16) {
        self.put_failures
            .lock()
            .unwrap()
            .insert(url.to_string(), status);
    }

    pub fn omit_etag(&self, url: &str) {
        self.missing_etags.lock().unwrap().push(url.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<(String, Bytes)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Put { url, body } => Some((url, body)),
                _ => None,
            })
            .collect()
    }

    pub fn posts_to(&self, path: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Post { path: p, body } if p == path => Some(body),
                _ => None,
            })
            .collect()
    }

    pub fn gets_to(&self, path: &str) -> Vec<Vec<(String, String)>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Get { path: p, query } if p == path => Some(query),
                _ => None,
            })
            .collect()
    }

    fn reply(&self, method: &str, path: &str) -> Result<Value, ApiError> {
        let key = format!("{} {}", method, path);
        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(&key) else {
            return Err(ApiError::Http {
                status: 404,
                body: format!("no route for {}", key),
            });
        };
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply
            .unwrap_or(Reply::Http(404))
            .into_result()
    }
}

#[async_trait]
impl ApiTransport for FakeTransport {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(Call::Get {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        self.reply("GET", path)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(Call::Post {
            path: path.to_string(),
            body: body.clone(),
        });
        self.reply("POST", path)
    }

    async fn put_part(&self, upload_url: &str, body: Bytes) -> Result<Option<String>, ApiError> {
        self.calls.lock().unwrap().push(Call::Put {
            url: upload_url.to_string(),
            body,
        });
        if let Some(status) = self.put_failures.lock().unwrap().get(upload_url) {
            return Err(ApiError::Http {
                status: *status,
                body: "<Error>SignatureDoesNotMatch</Error>".to_string(),
            });
        }
        if self.missing_etags.lock().unwrap().iter().any(|u| u == upload_url) {
            return Ok(None);
        }
        let tail = upload_url.rsplit('/').next().unwrap_or_default();
        Ok(Some(format!("\"etag-{}\"", tail)))
    }
}

pub fn envelope(data: Value) -> Value {
    json!({ "code": 0, "message": "success", "data": data })
}

pub fn part_url(number: u32) -> String {
    format!("https://storage.test/upload/{}", number)
}

pub fn part_items(sizes: &[u64]) -> Value {
    let items: Vec<Value> = sizes
        .iter()
        .enumerate()
        .map(|(idx, size)| {
            let number = idx as u32 + 1;
            json!({ "number": number, "size": size, "upload_url": part_url(number) })
        })
        .collect();
    Value::Array(items)
}

pub fn init_reply(parts: Value) -> Value {
    json!({
        "upload_id": "up-1",
        "file_object_key": "objects/user-42/sales.csv",
        "part_items": parts,
    })
}

pub fn data_source(status: &str) -> Value {
    json!({
        "id": "src-1",
        "name": "sales.csv",
        "type": "FILE",
        "status": status,
        "size": 12_058_624u64,
    })
}

/// Routes a complete happy-path upload for `ds-1` with the given part sizes.
pub fn script_upload(fake: &FakeTransport, sizes: &[u64], statuses: &[&str]) {
    script_upload_parts(fake, part_items(sizes), statuses);
}

pub fn script_upload_parts(fake: &FakeTransport, parts: Value, statuses: &[&str]) {
    fake.on_ok("POST", "file/init-multipart-upload", init_reply(parts));
    fake.on_ok(
        "POST",
        "file/complete-multipart-upload",
        json!({ "file_object_key": "objects/user-42/sales.csv" }),
    );
    fake.on_ok("POST", "datasets/ds-1/datasources", data_source("synching"));
    for status in statuses {
        fake.on_ok("GET", "datasets/ds-1/datasources/src-1", data_source(status));
    }
}

/// File filled with a repeating byte pattern so part bodies can be checked.
pub struct TempFile {
    pub path: PathBuf,
    pub content: Vec<u8>,
}

impl TempFile {
    pub fn with_size(size: u64) -> Self {
        let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let dir = std::env::temp_dir().join(format!("analytics-mcp-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sales.csv");
        std::fs::write(&path, &content).unwrap();
        Self { path, content }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if let Some(dir) = self.path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
