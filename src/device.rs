//! 设备信息能力接口
//!
//! 事件富化所需的设备描述符和指纹匹配所需的信号快照都从
//! `DeviceInfoProvider` 获取。宿主在真机上注入平台实现；
//! `GenericDeviceInfo` 是从进程环境能拿到什么就填什么的通用实现，
//! 主要用于桌面端宿主和测试。

use std::collections::HashMap;
use std::env;
use std::time::Instant;

use crate::models::DeviceSnapshot;

/// SDK 自身的 User-Agent，用于合成事件 user_agent 和出站请求头
pub const SDK_USER_AGENT: &str = concat!("linktracker/", env!("CARGO_PKG_VERSION"));

/// 设备信息提供者
///
/// 实现必须无副作用且可并发调用。
pub trait DeviceInfoProvider: Send + Sync {
    /// 事件富化用的固定描述符集合
    ///
    /// 键集合：device、device_model、device_vendor、os、os_version、
    /// cpu_architecture、platform、app_version、build_number、
    /// bundle_identifier。
    fn descriptors(&self) -> HashMap<String, String>;

    /// 合成的 User-Agent 字符串
    fn user_agent(&self) -> String;

    /// 指纹匹配用的设备信号快照
    fn snapshot(&self) -> DeviceSnapshot;

    fn name(&self) -> &'static str;
}

/// 通用设备信息实现
///
/// 应用级元数据（版本号、bundle id）无法自省，由宿主通过
/// builder 方法注入，缺省为 "unknown"。
pub struct GenericDeviceInfo {
    device_name: String,
    model: String,
    vendor: String,
    os_version: String,
    app_version: String,
    build_number: String,
    bundle_identifier: String,
    screen_width: u32,
    screen_height: u32,
    has_cellular: bool,
    started_at: Instant,
}

impl GenericDeviceInfo {
    pub fn new() -> Self {
        GenericDeviceInfo {
            device_name: "unknown".to_string(),
            model: "generic".to_string(),
            vendor: "unknown".to_string(),
            os_version: "unknown".to_string(),
            app_version: "unknown".to_string(),
            build_number: "unknown".to_string(),
            bundle_identifier: "unknown".to_string(),
            screen_width: 0,
            screen_height: 0,
            has_cellular: false,
            started_at: Instant::now(),
        }
    }

    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    pub fn with_os_version(mut self, version: impl Into<String>) -> Self {
        self.os_version = version.into();
        self
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn with_build_number(mut self, build: impl Into<String>) -> Self {
        self.build_number = build.into();
        self
    }

    pub fn with_bundle_identifier(mut self, bundle: impl Into<String>) -> Self {
        self.bundle_identifier = bundle.into();
        self
    }

    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    pub fn with_cellular(mut self, has_cellular: bool) -> Self {
        self.has_cellular = has_cellular;
        self
    }

    /// 进程 locale，取自环境变量，拿不到则 "en_US"
    fn locale() -> String {
        env::var("LC_ALL")
            .or_else(|_| env::var("LANG"))
            .ok()
            .and_then(|v| v.split('.').next().map(str::to_string))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "en_US".to_string())
    }

    /// 本地时区的 UTC 偏移表示，如 "UTC+08:00"
    fn timezone() -> String {
        let offset = chrono::Local::now().offset().local_minus_utc();
        let sign = if offset < 0 { '-' } else { '+' };
        let abs = offset.abs();
        format!("UTC{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }
}

impl Default for GenericDeviceInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceInfoProvider for GenericDeviceInfo {
    fn descriptors(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("device".to_string(), self.device_name.clone());
        map.insert("device_model".to_string(), self.model.clone());
        map.insert("device_vendor".to_string(), self.vendor.clone());
        map.insert("os".to_string(), env::consts::OS.to_string());
        map.insert("os_version".to_string(), self.os_version.clone());
        map.insert(
            "cpu_architecture".to_string(),
            env::consts::ARCH.to_string(),
        );
        map.insert("platform".to_string(), env::consts::OS.to_string());
        map.insert("app_version".to_string(), self.app_version.clone());
        map.insert("build_number".to_string(), self.build_number.clone());
        map.insert(
            "bundle_identifier".to_string(),
            self.bundle_identifier.clone(),
        );
        map
    }

    fn user_agent(&self) -> String {
        format!(
            "{} {}/{}",
            SDK_USER_AGENT,
            env::consts::OS,
            self.os_version
        )
    }

    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            model: self.model.clone(),
            os_name: env::consts::OS.to_string(),
            os_version: self.os_version.clone(),
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            locale: Self::locale(),
            timezone: Self::timezone(),
            bundle_identifier: self.bundle_identifier.clone(),
            battery_level: None,
            orientation: None,
            accessibility_enabled: false,
            uptime_ms: self.started_at.elapsed().as_millis() as u64,
            has_cellular: self.has_cellular,
        }
    }

    fn name(&self) -> &'static str {
        "Generic"
    }
}
