//! 归因解析状态机
//!
//! 四个有序状态，每个都是前一个的回退，命中即终止：
//! 1. Stored：存储中已有 referrer，直接返回，不发网络请求
//! 2. PlatformAttribution：查询平台安装归因接口
//! 3. AdvertisingIdentifier：请求广告标识符，格式化为 `idfa=<value>`
//! 4. DeviceFingerprint：提交设备信号快照给远端匹配
//!
//! 步骤 2-4 的命中结果都会持久化；四步耗尽则返回 None 且不持久化
//! 任何值，下次首次安装检查（若标记未完成）可以重试。

use std::sync::Arc;

use tracing::debug;

use super::providers::{AdvertisingIdProvider, AttributionTokenProvider, ZERO_ADVERTISING_ID};
use crate::device::DeviceInfoProvider;
use crate::network::NetworkClient;
use crate::storage::PersistenceStore;

pub struct InstallReferrerResolver {
    storage: Arc<dyn PersistenceStore>,
    network: Arc<NetworkClient>,
    attribution: Arc<dyn AttributionTokenProvider>,
    advertising: Arc<dyn AdvertisingIdProvider>,
    device: Arc<dyn DeviceInfoProvider>,
}

impl InstallReferrerResolver {
    pub fn new(
        storage: Arc<dyn PersistenceStore>,
        network: Arc<NetworkClient>,
        attribution: Arc<dyn AttributionTokenProvider>,
        advertising: Arc<dyn AdvertisingIdProvider>,
        device: Arc<dyn DeviceInfoProvider>,
    ) -> Self {
        InstallReferrerResolver {
            storage,
            network,
            attribution,
            advertising,
            device,
        }
    }

    /// 解析 install referrer，命中即返回
    pub async fn resolve(&self) -> Option<String> {
        // 1. Stored：短路，不发网络请求
        if let Some(stored) = self.storage.install_referrer() {
            debug!("Found stored install referrer: {}", stored);
            return Some(stored);
        }

        // 2. PlatformAttribution
        if let Some(token) = self.attribution.fetch_attribution_token().await {
            if !token.is_empty() {
                debug!(
                    "Attribution token from provider {}: {}",
                    self.attribution.name(),
                    token
                );
                self.storage.store_install_referrer(&token);
                return Some(token);
            }
        }

        // 3. AdvertisingIdentifier，全零标识符视为未授权
        if let Some(advertising_id) = self.advertising.request_advertising_id().await {
            if !advertising_id.is_empty() && advertising_id != ZERO_ADVERTISING_ID {
                let referrer = format!("idfa={}", advertising_id);
                debug!("Using advertising identifier as referrer: {}", referrer);
                self.storage.store_install_referrer(&referrer);
                return Some(referrer);
            }
            debug!("Advertising identifier unavailable or zeroed, falling through");
        }

        // 4. DeviceFingerprint：最后手段，远端匹配
        let snapshot = self.device.snapshot();
        if let Some(referrer) = self.network.check_fingerprint(&snapshot).await {
            debug!("Fingerprint matching resolved referrer: {}", referrer);
            self.storage.store_install_referrer(&referrer);
            return Some(referrer);
        }

        debug!("All attribution steps exhausted, no referrer resolved");
        None
    }
}
