//! 事件追踪器
//!
//! 每次追踪调用构造一条不可变事件：固定的设备/应用描述符先写入，
//! 调用方自定义数据后合并（同名键以调用方为准），发送一次。
//! 传输失败的事件进入有界失败队列，留待外部对账，不在本层重试。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SdkConfig;
use crate::device::DeviceInfoProvider;
use crate::models::{current_timestamp_millis, Event, InstallData};
use crate::network::NetworkClient;
use crate::storage::PersistenceStore;

pub struct EventTracker {
    config: Arc<SdkConfig>,
    network: Arc<NetworkClient>,
    storage: Arc<dyn PersistenceStore>,
    device: Arc<dyn DeviceInfoProvider>,
    session_id: String,
}

impl EventTracker {
    pub fn new(
        config: Arc<SdkConfig>,
        network: Arc<NetworkClient>,
        storage: Arc<dyn PersistenceStore>,
        device: Arc<dyn DeviceInfoProvider>,
        session_id: String,
    ) -> Self {
        EventTracker {
            config,
            network,
            storage,
            device,
            session_id,
        }
    }

    /// 构造事件并填充设备/会话/应用元数据
    ///
    /// 调用方提供的 additional 在默认描述符之后合并，同名键覆盖。
    /// ip_address 在本平台始终缺省。
    pub fn create_event(
        &self,
        event_type: &str,
        short_link: Option<&str>,
        deep_link: Option<&str>,
        additional: Option<&HashMap<String, String>>,
    ) -> Event {
        let mut extra = self.device.descriptors();
        if let Some(additional) = additional {
            for (key, value) in additional {
                extra.insert(key.clone(), value.clone());
            }
        }

        Event {
            event_type: event_type.to_string(),
            project_id: self.config.project_id.clone(),
            project_token: self.config.project_token.clone(),
            short_link: short_link.map(str::to_string),
            deep_link: deep_link.map(str::to_string),
            timestamp: current_timestamp_millis(),
            device_id: self.storage.device_id(),
            session_id: self.session_id.clone(),
            extra,
            user_agent: Some(self.device.user_agent()),
            ip_address: None,
        }
    }

    /// 追踪一条事件，返回原始响应体
    pub async fn track_event(&self, event_type: &str, short_link: Option<&str>) -> String {
        debug!(
            "track_event called with event_type={}, short_link={:?}",
            event_type, short_link
        );
        let event = self.create_event(event_type, short_link, None, None);
        self.dispatch(event).await
    }

    /// 追踪短链点击
    pub async fn track_short_link_click(
        &self,
        short_link: &str,
        deep_link: Option<&str>,
    ) -> String {
        debug!(
            "track_short_link_click called with short_link={}, deep_link={:?}",
            short_link, deep_link
        );
        let event = self.create_event("short_link_click", Some(short_link), deep_link, None);
        self.dispatch(event).await
    }

    /// 追踪安装事件
    ///
    /// 先向服务端拉取该短链的归因键值对并持久化，再把键值对
    /// 合并进安装事件一起上报。
    pub async fn track_app_install(&self, short_link: &str) -> String {
        debug!("track_app_install called with short_link={}", short_link);

        let pairs = self.network.install_data(short_link).await;
        debug!("Install data received: {:?}", pairs);

        self.storage
            .store_install_data(&InstallData::new(short_link, pairs.clone()));

        let event = self.create_event("app_install", Some(short_link), None, Some(&pairs));
        self.dispatch(event).await
    }

    /// 追踪自定义事件
    pub async fn track_custom_event(
        &self,
        event_type: &str,
        short_link: Option<&str>,
        additional: Option<&HashMap<String, String>>,
    ) -> String {
        debug!(
            "track_custom_event called with event_type={}, short_link={:?}",
            event_type, short_link
        );
        let event = self.create_event(event_type, short_link, None, additional);
        self.dispatch(event).await
    }

    /// 发送事件；网络层失败时事件进入失败队列
    async fn dispatch(&self, event: Event) -> String {
        let outcome = self.network.send_event(&event).await;
        if outcome.is_transport_error() {
            warn!(
                "Event {} failed to send, storing for later inspection",
                event.event_type
            );
            self.storage.store_failed_event(&event);
        }
        outcome.into_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::GenericDeviceInfo;
    use crate::storage::MemoryStore;

    fn tracker() -> EventTracker {
        let config = Arc::new(SdkConfig::new("proj", "token", "tryinhouse.com").unwrap());
        let network = Arc::new(NetworkClient::new(config.clone()));
        let storage: Arc<dyn PersistenceStore> = Arc::new(MemoryStore::new());
        let device: Arc<dyn DeviceInfoProvider> =
            Arc::new(GenericDeviceInfo::new().with_app_version("2.0.0"));
        EventTracker::new(
            config,
            network,
            storage,
            device,
            uuid::Uuid::new_v4().to_string(),
        )
    }

    #[test]
    fn test_create_event_stamps_identity() {
        let t = tracker();
        let event = t.create_event("app_open", None, None, None);

        assert!(!event.device_id.is_empty());
        assert!(!event.session_id.is_empty());
        assert!(event.timestamp > 0);
        assert_eq!(event.project_id, "proj");
        assert_eq!(event.project_token, "token");
        assert!(event.ip_address.is_none());
        assert!(event.user_agent.is_some());
    }

    #[test]
    fn test_create_event_device_id_stable() {
        let t = tracker();
        let first = t.create_event("a", None, None, None);
        let second = t.create_event("b", None, None, None);
        assert_eq!(first.device_id, second.device_id);
        assert_eq!(first.session_id, second.session_id);
    }

    #[test]
    fn test_create_event_enrichment_defaults() {
        let t = tracker();
        let event = t.create_event("app_open", None, None, None);
        assert_eq!(event.extra["app_version"], "2.0.0");
        assert!(event.extra.contains_key("os"));
        assert!(event.extra.contains_key("cpu_architecture"));
        assert!(event.extra.contains_key("bundle_identifier"));
    }

    #[test]
    fn test_caller_extra_wins_over_descriptors() {
        let t = tracker();
        let mut additional = HashMap::new();
        additional.insert("app_version".to_string(), "override".to_string());
        additional.insert("campaign".to_string(), "summer".to_string());

        let event = t.create_event("custom", None, None, Some(&additional));
        assert_eq!(event.extra["app_version"], "override");
        assert_eq!(event.extra["campaign"], "summer");
    }

    #[test]
    fn test_create_event_links() {
        let t = tracker();
        let event = t.create_event(
            "short_link_click",
            Some("https://tryinhouse.com/abc"),
            Some("myapp://open"),
            None,
        );
        assert_eq!(
            event.short_link.as_deref(),
            Some("https://tryinhouse.com/abc")
        );
        assert_eq!(event.deep_link.as_deref(), Some("myapp://open"));
    }
}
