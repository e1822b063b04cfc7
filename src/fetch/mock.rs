//! Scripted [`HttpClient`] for unit tests: replays canned responses in order
//! and records every URL it was asked for.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::HttpClient;

pub enum Scripted {
    Reply {
        status: u16,
        body: String,
        retry_after: Option<String>,
    },
    Transport,
}

pub struct ScriptedClient {
    script: Mutex<VecDeque<Scripted>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: &str) -> Scripted {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Scripted {
        Scripted::Reply {
            status,
            body: body.to_string(),
            retry_after: None,
        }
    }

    pub fn throttled(retry_after: &str) -> Scripted {
        Scripted::Reply {
            status: 429,
            body: "Too Many Requests".to_string(),
            retry_after: Some(retry_after.to_string()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

/// A genuine `reqwest::Error` produced without touching the network: the
/// client rejects non-HTTP schemes before connecting.
async fn transport_error() -> reqwest::Error {
    reqwest::Client::new()
        .get("ftp://unreachable.invalid/")
        .send()
        .await
        .unwrap_err()
}

#[async_trait]
impl HttpClient for ScriptedClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.urls.lock().unwrap().push(req.url().to_string());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted client ran out of responses");

        match next {
            Scripted::Reply {
                status,
                body,
                retry_after,
            } => {
                let mut builder = http::Response::builder().status(status);
                if let Some(value) = retry_after {
                    builder = builder.header("Retry-After", value);
                }
                Ok(reqwest::Response::from(builder.body(body).unwrap()))
            }
            Scripted::Transport => Err(transport_error().await),
        }
    }
}
