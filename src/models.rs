//! 核心数据模型
//!
//! `Event` 是上报到收集端的不可变记录，字段名与线上契约一一对应。
//! `InstallData` 是安装归因接口返回的键值对快照，`DeviceSnapshot`
//! 是指纹匹配用的设备信号集合。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 当前时间的毫秒级 Unix 时间戳
pub fn current_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 追踪事件，构造后不再修改，发送一次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub project_id: String,
    pub project_token: String,
    #[serde(rename = "shortlink", skip_serializing_if = "Option::is_none")]
    pub short_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deep_link: Option<String>,
    /// 毫秒级 Unix 时间戳，构造时写入
    pub timestamp: i64,
    pub device_id: String,
    pub session_id: String,
    /// 设备元数据 + 调用方自定义数据，以原生 JSON 对象上报
    #[serde(default)]
    pub extra: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// 本平台不采集 IP，始终缺省
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// 安装归因数据，每次安装解析一次后持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallData {
    #[serde(rename = "shortlink")]
    pub short_link: String,
    pub key_value_pairs: HashMap<String, String>,
    pub timestamp: i64,
}

impl InstallData {
    pub fn new(short_link: impl Into<String>, key_value_pairs: HashMap<String, String>) -> Self {
        InstallData {
            short_link: short_link.into(),
            key_value_pairs,
            timestamp: current_timestamp_millis(),
        }
    }
}

/// 指纹匹配用的设备信号快照
///
/// 不包含任何运营商/电话标识，只保留粗粒度的"是否具备蜂窝能力"。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub model: String,
    pub os_name: String,
    pub os_version: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub locale: String,
    pub timezone: String,
    pub bundle_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    pub accessibility_enabled: bool,
    /// 进程启动以来的毫秒数
    pub uptime_ms: u64,
    pub has_cellular: bool,
}

/// 事件发送结果
///
/// 只要 HTTP 交换完成（无论状态码），原样返回响应体；
/// 仅网络层失败（DNS、超时、连接重置）合成本地错误负载。
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// HTTP 交换完成，携带原始响应体
    Completed(String),
    /// 网络层失败，携带合成的 `{"status":"error","message":...}` 负载
    TransportError(String),
}

impl SendOutcome {
    pub fn body(&self) -> &str {
        match self {
            SendOutcome::Completed(body) => body,
            SendOutcome::TransportError(body) => body,
        }
    }

    pub fn into_body(self) -> String {
        match self {
            SendOutcome::Completed(body) => body,
            SendOutcome::TransportError(body) => body,
        }
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, SendOutcome::TransportError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        let mut extra = HashMap::new();
        extra.insert("os".to_string(), "ios".to_string());
        Event {
            event_type: "app_open".to_string(),
            project_id: "proj".to_string(),
            project_token: "token".to_string(),
            short_link: Some("https://tryinhouse.com/abc".to_string()),
            deep_link: None,
            timestamp: 1700000000000,
            device_id: "dev-1".to_string(),
            session_id: "sess-1".to_string(),
            extra,
            user_agent: Some("linktracker/0.1.0".to_string()),
            ip_address: None,
        }
    }

    #[test]
    fn test_event_wire_keys() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(json["event_type"], "app_open");
        assert_eq!(json["project_id"], "proj");
        assert_eq!(json["project_token"], "token");
        assert_eq!(json["shortlink"], "https://tryinhouse.com/abc");
        assert_eq!(json["timestamp"], 1700000000000i64);
        assert_eq!(json["device_id"], "dev-1");
        assert_eq!(json["session_id"], "sess-1");
        assert_eq!(json["user_agent"], "linktracker/0.1.0");
    }

    #[test]
    fn test_event_omits_absent_optionals() {
        let json = serde_json::to_value(sample_event()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("deep_link"));
        assert!(!obj.contains_key("ip_address"));
    }

    #[test]
    fn test_extra_is_native_json_object() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert!(json["extra"].is_object(), "extra must not be double-encoded");
        assert_eq!(json["extra"]["os"], "ios");
    }

    #[test]
    fn test_event_round_trip() {
        let event = sample_event();
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_type, event.event_type);
        assert_eq!(back.short_link, event.short_link);
        assert_eq!(back.extra, event.extra);
    }

    #[test]
    fn test_send_outcome_body_access() {
        let ok = SendOutcome::Completed("{}".to_string());
        let err = SendOutcome::TransportError("{\"status\":\"error\"}".to_string());
        assert!(!ok.is_transport_error());
        assert!(err.is_transport_error());
        assert_eq!(ok.body(), "{}");
        assert_eq!(err.into_body(), "{\"status\":\"error\"}");
    }
}
