//! 平台能力提供者
//!
//! 平台归因接口和广告标识符在不同系统版本上可用性不同。
//! 按能力提供者接口建模，启动时按平台层级选择实现；
//! 结构性不可用的层级使用 Null 实现。

use async_trait::async_trait;

/// 受限广告追踪 / 未授权时平台返回的全零标识符
pub const ZERO_ADVERTISING_ID: &str = "00000000-0000-0000-0000-000000000000";

/// 平台安装归因提供者
///
/// 尽力而为：平台接口结构性不可用或查询失败时返回 None。
#[async_trait]
pub trait AttributionTokenProvider: Send + Sync {
    /// 查询平台安装归因 token
    async fn fetch_attribution_token(&self) -> Option<String>;

    fn name(&self) -> &'static str;
}

/// 平台归因不可用层级的实现
pub struct NullAttributionProvider;

#[async_trait]
impl AttributionTokenProvider for NullAttributionProvider {
    async fn fetch_attribution_token(&self) -> Option<String> {
        None
    }

    fn name(&self) -> &'static str {
        "NullAttribution"
    }
}

/// 广告标识符提供者
///
/// 实现负责发起用户授权提示；未授权或受限追踪时返回 None
/// 或全零标识符（由解析器拒绝）。
#[async_trait]
pub trait AdvertisingIdProvider: Send + Sync {
    /// 请求授权并返回广告标识符
    async fn request_advertising_id(&self) -> Option<String>;

    fn name(&self) -> &'static str;
}

/// 无广告标识符能力的实现
pub struct NullAdvertisingIdProvider;

#[async_trait]
impl AdvertisingIdProvider for NullAdvertisingIdProvider {
    async fn request_advertising_id(&self) -> Option<String> {
        None
    }

    fn name(&self) -> &'static str {
        "NullAdvertisingId"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_providers_yield_nothing() {
        assert_eq!(
            NullAttributionProvider.fetch_attribution_token().await,
            None
        );
        assert_eq!(
            NullAdvertisingIdProvider.request_advertising_id().await,
            None
        );
    }
}
