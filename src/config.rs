//! SDK 配置
//!
//! 宿主应用在组合根处构造一次 `SdkConfig`，之后在整个进程生命周期内只读。

use url::Url;

use crate::errors::{Result, TrackerError};

/// 默认事件收集服务地址
pub const DEFAULT_SERVER_URL: &str = "https://api.tryinhouse.com";
/// 默认设备指纹匹配服务地址
pub const DEFAULT_FINGERPRINT_URL: &str = "https://fp.tryinhouse.com";
/// 默认会话超时（分钟）
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u32 = 30;
/// 默认最大重试次数（仅作为配置保留，本层不做自动重试）
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

/// SDK 配置，初始化后不可变
#[derive(Debug, Clone)]
pub struct SdkConfig {
    pub project_id: String,
    pub project_token: String,
    pub short_link_domain: String,
    pub server_url: String,
    pub fingerprint_url: String,
    pub enable_debug_logging: bool,
    pub session_timeout_minutes: u32,
    pub max_retry_attempts: u32,
}

impl SdkConfig {
    /// 创建配置，必填项为租户凭证与短链域名，其余使用默认值
    pub fn new(
        project_id: impl Into<String>,
        project_token: impl Into<String>,
        short_link_domain: impl Into<String>,
    ) -> Result<Self> {
        let config = SdkConfig {
            project_id: project_id.into(),
            project_token: project_token.into(),
            short_link_domain: short_link_domain.into(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            fingerprint_url: DEFAULT_FINGERPRINT_URL.to_string(),
            enable_debug_logging: false,
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Result<Self> {
        self.server_url = server_url.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_fingerprint_url(mut self, fingerprint_url: impl Into<String>) -> Result<Self> {
        self.fingerprint_url = fingerprint_url.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_debug_logging(mut self, enable: bool) -> Self {
        self.enable_debug_logging = enable;
        self
    }

    pub fn with_session_timeout_minutes(mut self, minutes: u32) -> Self {
        self.session_timeout_minutes = minutes;
        self
    }

    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    /// 校验配置项
    ///
    /// 检查项目：
    /// 1. project_id / project_token / short_link_domain 不为空
    /// 2. server_url / fingerprint_url 是可解析的 http(s) URL
    fn validate(&self) -> Result<()> {
        if self.project_id.trim().is_empty() {
            return Err(TrackerError::config("project_id cannot be empty"));
        }
        if self.project_token.trim().is_empty() {
            return Err(TrackerError::config("project_token cannot be empty"));
        }
        if self.short_link_domain.trim().is_empty() {
            return Err(TrackerError::config("short_link_domain cannot be empty"));
        }

        for (name, value) in [
            ("server_url", &self.server_url),
            ("fingerprint_url", &self.fingerprint_url),
        ] {
            let parsed = Url::parse(value).map_err(|e| {
                TrackerError::config(format!("{} is not a valid URL: {}", name, e))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(TrackerError::config(format!(
                    "{} must use http or https, got: {}",
                    name,
                    parsed.scheme()
                )));
            }
        }

        Ok(())
    }
}
