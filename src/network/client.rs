//! HTTP 客户端实现
//!
//! 使用全局 ureq Agent（同步，在 spawn_blocking 中调用）。
//! 只要 HTTP 交换完成，无论状态码都把响应体原样交回；只有网络层
//! 失败（DNS、超时、连接重置）才合成本地错误负载。

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use tracing::{debug, error, warn};
use ureq::Agent;
use url::Url;

use crate::config::SdkConfig;
use crate::device::SDK_USER_AGENT;
use crate::errors::Result;
use crate::models::{DeviceSnapshot, Event, SendOutcome};

/// 固定的请求超时时间
const HTTP_TIMEOUT_SECS: u64 = 30;

/// 全局 HTTP Agent（ureq 的 Agent 是 Send + Sync）
static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            // 非 2xx 也是完整的 HTTP 交换，状态码由本层自行解读
            .http_status_as_error(false)
            .build()
            .into()
    })
}

/// 合成网络错误负载 `{"status":"error","message":"..."}`
fn error_payload(message: &str) -> String {
    serde_json::json!({
        "status": "error",
        "message": message,
    })
    .to_string()
}

pub struct NetworkClient {
    config: Arc<SdkConfig>,
}

impl NetworkClient {
    pub fn new(config: Arc<SdkConfig>) -> Self {
        NetworkClient { config }
    }

    // 事件上报

    /// 发送事件到收集端
    ///
    /// 异步执行，调用方不会被阻塞。序列化失败与网络失败同样处理：
    /// 合成错误负载，不抛异常。
    pub async fn send_event(&self, event: &Event) -> SendOutcome {
        let url = match self.event_url(event.short_link.as_deref()) {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to build URL for event registration: {}", e);
                return SendOutcome::TransportError(error_payload("Invalid URL"));
            }
        };

        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode event: {}", e);
                return SendOutcome::TransportError(error_payload("Failed to encode event"));
            }
        };

        debug!("Sending event {} to {}", event.event_type, url);

        tokio::task::spawn_blocking(move || Self::send_event_sync(url, payload))
            .await
            .unwrap_or_else(|e| {
                warn!("send_event spawn_blocking failed: {}", e);
                SendOutcome::TransportError(error_payload(&e.to_string()))
            })
    }

    fn send_event_sync(url: Url, payload: serde_json::Value) -> SendOutcome {
        let agent = get_agent();

        let resp = match agent
            .post(url.as_str())
            .header("User-Agent", SDK_USER_AGENT)
            .send_json(&payload)
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("Network error sending event: {}", e);
                return SendOutcome::TransportError(error_payload(&e.to_string()));
            }
        };

        let status = resp.status();
        match resp.into_body().read_to_string() {
            Ok(body) => {
                debug!("Received response ({}): {}", status, body);
                SendOutcome::Completed(body)
            }
            Err(e) => {
                error!("Failed to read event response body: {}", e);
                SendOutcome::TransportError(error_payload(&e.to_string()))
            }
        }
    }

    // 安装归因数据

    /// 拉取短链对应的安装归因键值对
    ///
    /// 任何失败都返回空映射：归因数据缺失是常规非致命结果。
    pub async fn install_data(&self, short_link: &str) -> HashMap<String, String> {
        let url = match self.install_data_url(short_link) {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to build install data URL: {}", e);
                return HashMap::new();
            }
        };

        debug!("Requesting install data from {}", url);

        tokio::task::spawn_blocking(move || Self::fetch_install_data_sync(url))
            .await
            .unwrap_or_else(|e| {
                warn!("install_data spawn_blocking failed: {}", e);
                HashMap::new()
            })
    }

    fn fetch_install_data_sync(url: Url) -> HashMap<String, String> {
        let agent = get_agent();

        let resp = match agent
            .get(url.as_str())
            .header("User-Agent", SDK_USER_AGENT)
            .call()
        {
            Ok(resp) => resp,
            Err(e) => {
                error!("Network error getting install data: {}", e);
                return HashMap::new();
            }
        };

        if !resp.status().is_success() {
            warn!("Failed to get install data: {}", resp.status());
            return HashMap::new();
        }

        match resp.into_body().read_json::<HashMap<String, String>>() {
            Ok(pairs) => pairs,
            Err(e) => {
                error!("Failed to parse install data response: {}", e);
                HashMap::new()
            }
        }
    }

    // 指纹匹配

    /// 提交设备信号快照，返回服务端匹配到的 referrer
    ///
    /// 任何传输/解析失败或 referrer 缺失都返回 None。
    pub async fn check_fingerprint(&self, snapshot: &DeviceSnapshot) -> Option<String> {
        let url = match self.fingerprint_check_url() {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to build fingerprint URL: {}", e);
                return None;
            }
        };

        let payload = match serde_json::to_value(snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode device snapshot: {}", e);
                return None;
            }
        };

        debug!("Submitting device fingerprint to {}", url);

        tokio::task::spawn_blocking(move || Self::check_fingerprint_sync(url, payload))
            .await
            .unwrap_or_else(|e| {
                warn!("check_fingerprint spawn_blocking failed: {}", e);
                None
            })
    }

    fn check_fingerprint_sync(url: Url, payload: serde_json::Value) -> Option<String> {
        let agent = get_agent();

        let resp = match agent
            .post(url.as_str())
            .header("User-Agent", SDK_USER_AGENT)
            .send_json(&payload)
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Fingerprint request failed: {}", e);
                return None;
            }
        };

        let json: serde_json::Value = match resp.into_body().read_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Fingerprint response parse failed: {}", e);
                return None;
            }
        };

        json.get("referrer")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    // URL 构建

    /// 事件注册地址，租户凭证在查询串；事件携带短链时追加 shortlink 参数
    fn event_url(&self, short_link: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/api/clicks/register_event",
            self.config.server_url.trim_end_matches('/')
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("project_id", &self.config.project_id);
            pairs.append_pair("project_token", &self.config.project_token);
            if let Some(short_link) = short_link {
                pairs.append_pair("shortlink", short_link);
            }
        }
        Ok(url)
    }

    fn install_data_url(&self, short_link: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/install-data",
            self.config.server_url.trim_end_matches('/')
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("shortlink", short_link);
            pairs.append_pair("project_id", &self.config.project_id);
            pairs.append_pair("project_token", &self.config.project_token);
        }
        Ok(url)
    }

    fn fingerprint_check_url(&self) -> Result<Url> {
        // 路径拼写沿用服务端既有路由
        Ok(Url::parse(&format!(
            "{}/check-fingureprinting",
            self.config.fingerprint_url.trim_end_matches('/')
        ))?)
    }
}
