//! BDD test world for whatsup

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cucumber::World;
use whatsup::config::NotificationChannel;
use whatsup::endpoint::EndpointSpec;
use whatsup::io::{HttpClient, HttpResponse};
use whatsup::store::{MemoryStateStore, StateStore};
use whatsup::{RunSummary, WhatsupError};

/// How a scripted URL answers a GET
#[derive(Debug, Clone)]
pub enum Scripted {
    Status(u16),
    Refused,
}

/// A posted webhook payload
#[derive(Debug, Clone)]
pub struct Post {
    pub url: String,
    pub body: serde_json::Value,
}

/// An HTTP client answering GETs from a script and recording POSTs
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    pub responses: Mutex<HashMap<String, Scripted>>,
    pub failing_webhooks: Mutex<HashSet<String>>,
    pub posts: Mutex<Vec<Post>>,
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(
        &self,
        url: &str,
        _cookies: &BTreeMap<String, String>,
    ) -> whatsup::Result<HttpResponse> {
        let scripted = self.responses.lock().unwrap().get(url).cloned();
        match scripted {
            Some(Scripted::Status(status)) => Ok(HttpResponse {
                status,
                reason: "Scripted".to_string(),
                body: String::new(),
            }),
            Some(Scripted::Refused) | None => Err(WhatsupError::Connection(format!(
                "GET {} failed: connection refused",
                url
            ))),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> whatsup::Result<HttpResponse> {
        self.posts.lock().unwrap().push(Post {
            url: url.to_string(),
            body: body.clone(),
        });
        if self.failing_webhooks.lock().unwrap().contains(url) {
            return Err(WhatsupError::Connection(format!(
                "POST {} failed: connection refused",
                url
            )));
        }
        Ok(HttpResponse {
            status: 200,
            reason: "OK".to_string(),
            body: "ok".to_string(),
        })
    }
}

/// A memory store that counts writes
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: MemoryStateStore,
    pub puts: AtomicUsize,
}

impl CountingStore {
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StateStore for CountingStore {
    async fn get(&self, key: &str) -> whatsup::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> whatsup::Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value).await
    }
}

#[derive(Debug, Default, World)]
pub struct WhatsupWorld {
    pub http: Arc<ScriptedHttpClient>,
    pub store: Arc<CountingStore>,
    pub endpoints: Vec<EndpointSpec>,
    pub channels: Vec<NotificationChannel>,
    pub puts_before_run: usize,
    pub summary: Option<RunSummary>,
}
