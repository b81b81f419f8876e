//! 追踪会话（编排层）
//!
//! `TrackingSession` 是进程级的显式上下文对象：宿主在组合根处
//! 通过 `SessionBuilder` 构造一次，持有句柄并传递给所有调用点。
//! 状态机 `Uninitialized → Initializing → Ready`；进入 Ready 后由
//! 宿主驱动应用启动序列（首次安装归因 + 短链打开检查）。
//!
//! 重复初始化不做防护：再次 build 会得到一个全新实例并静默取代
//! 宿主手中的旧句柄，幂等性由调用方负责。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::attribution::{
    AdvertisingIdProvider, AttributionTokenProvider, InstallReferrerResolver,
    NullAdvertisingIdProvider, NullAttributionProvider,
};
use crate::config::SdkConfig;
use crate::device::{DeviceInfoProvider, GenericDeviceInfo};
use crate::errors::Result;
use crate::events::EventTracker;
use crate::network::NetworkClient;
use crate::shortlink::ShortLinkDetector;
use crate::storage::{MemoryStore, PersistenceStore};

pub mod callback;
mod deeplink;

pub use callback::{CallbackBus, CallbackExecutor, CallbackNotice, HostCallback, InlineExecutor};
pub use deeplink::DeepLinkHandler;

/// 首次安装归因命中时的回调标签
pub const TAG_APP_INSTALL_FROM_SHORTLINK: &str = "app_install_from_shortlink";
/// 短链点击/打开的回调标签
pub const TAG_SHORTLINK_CLICK: &str = "shortlink_click";
/// 冷启动短链会话开始的回调标签
pub const TAG_SESSION_START_FROM_SHORTLINK: &str = "session_start_from_shortlink";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
}

/// 会话构造器
///
/// 宿主在这里注入存储后端、平台能力提供者和回调通道；
/// 未注入的部分使用通用默认实现。
pub struct SessionBuilder {
    config: SdkConfig,
    storage: Option<Arc<dyn PersistenceStore>>,
    attribution: Option<Arc<dyn AttributionTokenProvider>>,
    advertising: Option<Arc<dyn AdvertisingIdProvider>>,
    device: Option<Arc<dyn DeviceInfoProvider>>,
    callback: Option<HostCallback>,
    executor: Option<Arc<dyn CallbackExecutor>>,
}

impl SessionBuilder {
    pub fn new(config: SdkConfig) -> Self {
        SessionBuilder {
            config,
            storage: None,
            attribution: None,
            advertising: None,
            device: None,
            callback: None,
            executor: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn PersistenceStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_attribution_provider(
        mut self,
        provider: Arc<dyn AttributionTokenProvider>,
    ) -> Self {
        self.attribution = Some(provider);
        self
    }

    pub fn with_advertising_provider(mut self, provider: Arc<dyn AdvertisingIdProvider>) -> Self {
        self.advertising = Some(provider);
        self
    }

    pub fn with_device_info(mut self, provider: Arc<dyn DeviceInfoProvider>) -> Self {
        self.device = Some(provider);
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn with_callback_executor(mut self, executor: Arc<dyn CallbackExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// 构造会话并完成组件装配
    pub fn initialize(self) -> Result<Arc<TrackingSession>> {
        debug!(
            "initialize called with project_id={}, short_link_domain={}, server_url={}",
            self.config.project_id, self.config.short_link_domain, self.config.server_url
        );

        let state = RwLock::new(SessionState::Initializing);

        let config = Arc::new(self.config);
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let attribution = self
            .attribution
            .unwrap_or_else(|| Arc::new(NullAttributionProvider));
        let advertising = self
            .advertising
            .unwrap_or_else(|| Arc::new(NullAdvertisingIdProvider));
        let device = self
            .device
            .unwrap_or_else(|| Arc::new(GenericDeviceInfo::new()));
        let executor = self.executor.unwrap_or_else(|| Arc::new(InlineExecutor));

        let session_id = uuid::Uuid::new_v4().to_string();
        let network = Arc::new(NetworkClient::new(config.clone()));
        let detector = ShortLinkDetector::new(config.short_link_domain.clone());
        let tracker = EventTracker::new(
            config.clone(),
            network.clone(),
            storage.clone(),
            device.clone(),
            session_id.clone(),
        );
        let resolver = InstallReferrerResolver::new(
            storage.clone(),
            network.clone(),
            attribution,
            advertising,
            device,
        );
        let callbacks = CallbackBus::new(self.callback, executor);

        let session = TrackingSession {
            config,
            state,
            session_id,
            storage,
            detector,
            tracker,
            resolver,
            callbacks,
        };
        *session.state.write() = SessionState::Ready;
        debug!("Components initialized, session ready");

        Ok(Arc::new(session))
    }
}

pub struct TrackingSession {
    config: Arc<SdkConfig>,
    state: RwLock<SessionState>,
    session_id: String,
    storage: Arc<dyn PersistenceStore>,
    detector: ShortLinkDetector,
    tracker: EventTracker,
    resolver: InstallReferrerResolver,
    callbacks: CallbackBus,
}

impl TrackingSession {
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub(crate) fn detector(&self) -> &ShortLinkDetector {
        &self.detector
    }

    pub(crate) fn tracker(&self) -> &EventTracker {
        &self.tracker
    }

    /// 应用启动序列
    ///
    /// 首次安装归因检查和短链打开检查相互独立，并发执行。
    /// 整个序列异步完成，调用方可以直接 spawn 后继续。
    pub async fn handle_app_launch(&self, launch_url: Option<&str>) {
        debug!("handle_app_launch called with launch_url={:?}", launch_url);

        let first_install = async {
            if self.storage.is_first_install() {
                debug!("First install detected");
                self.handle_first_install().await;
            } else {
                debug!("Not first install, skipping first install logic");
            }
        };

        let short_link_open = async {
            if let Some(url) = launch_url {
                self.check_short_link_open(url, false).await;
            }
        };

        tokio::join!(first_install, short_link_open);
    }

    /// 宿主转发新打开的 URL（自定义 scheme / universal link）
    pub async fn on_new_url(&self, url: &str) {
        debug!("on_new_url called with url={}", url);
        self.check_short_link_open(url, true).await;
    }

    /// 宿主转发应用回到前台
    pub async fn on_app_resume(&self, url: Option<&str>) {
        debug!("on_app_resume called");
        if let Some(url) = url {
            self.check_short_link_open(url, true).await;
        }
    }

    /// 借出深链处理器，handler 不得比会话活得久
    pub fn deep_link_handler(&self) -> DeepLinkHandler<'_> {
        DeepLinkHandler::new(self)
    }

    // 追踪方法，均为薄透传：构造一条事件并发送，完成值即响应体

    pub async fn track_app_open(&self, short_link: Option<&str>) -> String {
        self.tracker.track_event("app_open", short_link).await
    }

    pub async fn track_app_open_from_short_link(&self, short_link: &str) -> String {
        self.tracker
            .track_event("app_open_shortlink", Some(short_link))
            .await
    }

    pub async fn track_session_start(&self, short_link: Option<&str>) -> String {
        self.tracker.track_event("session_start", short_link).await
    }

    pub async fn track_session_start_from_short_link(&self, short_link: &str) -> String {
        self.tracker
            .track_event("session_start_shortlink", Some(short_link))
            .await
    }

    pub async fn track_short_link_click(
        &self,
        short_link: &str,
        deep_link: Option<&str>,
    ) -> String {
        self.tracker
            .track_short_link_click(short_link, deep_link)
            .await
    }

    pub async fn track_app_install_from_short_link(&self, short_link: &str) -> String {
        self.tracker.track_app_install(short_link).await
    }

    pub async fn track_custom_event(
        &self,
        event_type: &str,
        short_link: Option<&str>,
        additional: Option<&HashMap<String, String>>,
    ) -> String {
        self.tracker
            .track_custom_event(event_type, short_link, additional)
            .await
    }

    // 工具方法

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn device_id(&self) -> String {
        self.storage.device_id()
    }

    pub fn install_referrer(&self) -> Option<String> {
        self.storage.install_referrer()
    }

    /// 按需运行归因解析（已存 referrer 会短路）
    pub async fn fetch_install_referrer(&self) -> Option<String> {
        self.resolver.resolve().await
    }

    /// 失败事件留存，供外部对账/重发
    pub fn failed_events(&self) -> Vec<crate::models::Event> {
        self.storage.failed_events()
    }

    pub fn clear_failed_events(&self) {
        self.storage.clear_failed_events()
    }

    /// 订阅 SDK 通知流
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CallbackNotice> {
        self.callbacks.subscribe()
    }

    // 测试辅助

    pub fn reset_first_install(&self) {
        debug!("reset_first_install called");
        self.storage.reset_first_install();
    }

    pub fn debug_first_install_state(&self) {
        debug!(
            "first_install state: is_first_install={}",
            self.storage.is_first_install()
        );
    }

    // 内部流程

    /// 首次安装处理
    ///
    /// 归因解析命中且 referrer 携带短链时，上报安装事件并通知宿主；
    /// 无论结果如何，首次安装标记恰好完成一次。
    async fn handle_first_install(&self) {
        debug!("handle_first_install called");

        match self.resolver.resolve().await {
            Some(referrer) => {
                debug!("Install referrer resolved: {}", referrer);
                match self.detector.extract_short_link_from_referrer(&referrer) {
                    Some(short_link) => {
                        debug!("Shortlink extracted from install referrer: {}", short_link);
                        let body = self.tracker.track_app_install(&short_link).await;
                        self.callbacks.notify(TAG_APP_INSTALL_FROM_SHORTLINK, &body);
                    }
                    None => debug!("No shortlink found in install referrer"),
                }
            }
            None => debug!("No install referrer available after resolution"),
        }

        self.storage.set_first_install_complete();
    }

    /// 短链打开检查
    ///
    /// 冷启动上报点击 + 会话开始两条事件；回到前台只上报一条
    /// 轻量的 app_open_shortlink（再互动信号，不算新获客）。
    async fn check_short_link_open(&self, url: &str, is_app_resume: bool) {
        debug!(
            "check_short_link_open called with is_app_resume={}",
            is_app_resume
        );

        if !self.detector.is_short_link(url) {
            debug!("No shortlink data found in URL");
            return;
        }

        debug!("App opened from shortlink: {}", url);

        if is_app_resume {
            let body = self.tracker.track_event("app_open_shortlink", Some(url)).await;
            self.callbacks.notify(TAG_SHORTLINK_CLICK, &body);
        } else {
            let click = self.tracker.track_short_link_click(url, Some(url)).await;
            self.callbacks.notify(TAG_SHORTLINK_CLICK, &click);

            let start = self
                .tracker
                .track_event("session_start_shortlink", Some(url))
                .await;
            self.callbacks
                .notify(TAG_SESSION_START_FROM_SHORTLINK, &start);
        }
    }
}
