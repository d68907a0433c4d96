use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use log::debug;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::api::models::{Group, Template};
use crate::manager::dispatch::DOMAIN;
use crate::error::RemoteError;
use crate::ports::{DeviceDirectory, RemoteCollection, ServiceCaller};

const MOBILE_APP_PREFIX: &str = "mobile_app_";

/// Home Assistant access: REST for service calls and the service list, the
/// WebSocket API for commands that return data.
pub struct HubClient {
    pub http: HttpClient,
    base_url: String,
    token: String,
}

impl HubClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn with_http(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    fn base_api(&self) -> String {
        if self.base_url.ends_with("/api") {
            self.base_url.clone()
        } else {
            format!("{}/api", self.base_url)
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.token)
    }

    /// Checks the token against `GET /api/`. Returns the HTTP status.
    pub async fn ping(&self) -> Result<u16, RemoteError> {
        let endpoint = format!("{}/", self.base_api());
        let resp = self.authed(self.http.get(&endpoint)).send().await?;
        Ok(resp.status().as_u16())
    }

    /// Sends one command over a fresh WebSocket session and returns its
    /// `result` field.
    pub async fn command(&self, command: Value) -> Result<Value, RemoteError> {
        let url = websocket_url(&self.base_url)?;
        let (mut ws, _) = connect_async(url.as_str()).await?;

        let hello = next_json(&mut ws).await?;
        if hello.get("type").and_then(|v| v.as_str()) != Some("auth_required") {
            return Err(RemoteError::Protocol(format!("expected auth_required, got {hello}")));
        }
        let auth = json!({"type": "auth", "access_token": self.token});
        ws.send(Message::Text(auth.to_string())).await?;
        let reply = next_json(&mut ws).await?;
        match reply.get("type").and_then(|v| v.as_str()) {
            Some("auth_ok") => {}
            _ => {
                let message = reply
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("rejected")
                    .to_string();
                return Err(RemoteError::Auth(message));
            }
        }

        let mut request = command;
        request["id"] = json!(1);
        ws.send(Message::Text(request.to_string())).await?;
        let result = loop {
            let msg = next_json(&mut ws).await?;
            if msg.get("id").and_then(|v| v.as_u64()) == Some(1)
                && msg.get("type").and_then(|v| v.as_str()) == Some("result")
            {
                break command_result(msg);
            }
        };
        let _ = ws.close(None).await;
        result
    }

    /// `POST /api/services/<domain>/<service>`.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: &Value,
    ) -> Result<(), RemoteError> {
        let endpoint = format!("{}/services/{}/{}", self.base_api(), domain, service);
        let resp = self.authed(self.http.post(&endpoint)).json(payload).send().await?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status().as_u16()));
        }
        Ok(())
    }

    pub async fn services(&self) -> Result<Value, RemoteError> {
        let endpoint = format!("{}/services", self.base_api());
        let resp = self.authed(self.http.get(&endpoint)).send().await?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status().as_u16()));
        }
        Ok(resp.json::<Value>().await?)
    }
}

async fn next_json<S>(ws: &mut S) -> Result<Value, RemoteError>
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
            Some(Ok(Message::Close(_))) | None => {
                return Err(RemoteError::Protocol("connection closed".into()));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

fn command_result(msg: Value) -> Result<Value, RemoteError> {
    if msg.get("success").and_then(|v| v.as_bool()) == Some(true) {
        return Ok(msg.get("result").cloned().unwrap_or(Value::Null));
    }
    let message = msg
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .unwrap_or("command failed")
        .to_string();
    Err(RemoteError::Protocol(message))
}

/// `https://hub:8123` → `wss://hub:8123/api/websocket`.
pub fn websocket_url(base_url: &str) -> Result<Url, RemoteError> {
    let trimmed = base_url.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    let ws = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}/api/websocket")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}/api/websocket")
    } else {
        format!("wss://{trimmed}/api/websocket")
    };
    Ok(Url::parse(&ws)?)
}

/// Device ids from the `notify` domain's `mobile_app_<id>` services.
pub fn mobile_app_devices(services: &Value) -> Vec<String> {
    let Some(domains) = services.as_array() else {
        return Vec::new();
    };
    domains
        .iter()
        .filter(|d| d.get("domain").and_then(|v| v.as_str()) == Some("notify"))
        .filter_map(|d| d.get("services").and_then(|v| v.as_object()))
        .flat_map(|services| services.keys())
        .filter_map(|name| name.strip_prefix(MOBILE_APP_PREFIX))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl RemoteCollection<Template> for HubClient {
    async fn fetch(&self) -> Result<Vec<Template>, RemoteError> {
        let result = self.command(json!({"type": "notify_manager/get_templates"})).await?;
        let templates = result.get("templates").cloned().unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(templates)?)
    }

    async fn push(&self, items: &[Template]) -> Result<(), RemoteError> {
        debug!("pushing {} templates", items.len());
        self.call_service(DOMAIN, "save_templates", &json!({"templates": items})).await
    }
}

#[async_trait]
impl RemoteCollection<Group> for HubClient {
    async fn fetch(&self) -> Result<Vec<Group>, RemoteError> {
        Err(RemoteError::Unsupported("groups"))
    }

    async fn push(&self, items: &[Group]) -> Result<(), RemoteError> {
        debug!("pushing {} groups", items.len());
        self.call_service(DOMAIN, "save_groups", &json!({"groups": items})).await
    }
}

#[async_trait]
impl ServiceCaller for HubClient {
    async fn call(&self, domain: &str, service: &str, payload: &Value) -> Result<(), RemoteError> {
        self.call_service(domain, service, payload).await
    }
}

#[async_trait]
impl DeviceDirectory for HubClient {
    async fn devices(&self) -> Result<Vec<String>, RemoteError> {
        Ok(mobile_app_devices(&self.services().await?))
    }
}
