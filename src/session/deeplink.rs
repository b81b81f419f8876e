//! 深链处理
//!
//! 宿主把收到的深链 URL 交给 `DeepLinkHandler` 判定并追踪。
//! handler 是对会话的非拥有借用，生命周期不会超过构造它的会话。

use tracing::debug;

use super::TrackingSession;

pub struct DeepLinkHandler<'a> {
    session: &'a TrackingSession,
}

impl<'a> DeepLinkHandler<'a> {
    pub(crate) fn new(session: &'a TrackingSession) -> Self {
        DeepLinkHandler { session }
    }

    /// 处理深链；URL 是短链或携带短链 token 时追踪点击并返回 true
    pub async fn handle_deep_link(&self, url: &str) -> bool {
        debug!("handle_deep_link called with url={}", url);

        if self.session.detector().is_short_link(url) {
            debug!("Deep link is a shortlink: {}", url);
            self.session
                .tracker()
                .track_short_link_click(url, Some(url))
                .await;
            return true;
        }

        if let Some(short_link) = self.extract_short_link_from_url(url) {
            debug!("Shortlink found in deep link: {}", short_link);
            self.session
                .tracker()
                .track_short_link_click(&short_link, Some(url))
                .await;
            return true;
        }

        debug!("No shortlink found in deep link");
        false
    }

    /// 从深链 URL 中提取短链 token
    ///
    /// 检查查询参数、utm_source 和 fragment，与 referrer 提取规则一致。
    pub fn extract_short_link_from_url(&self, url: &str) -> Option<String> {
        if self.session.detector().is_short_link(url) {
            return Some(url.to_string());
        }
        self.session.detector().extract_short_link_from_referrer(url)
    }

    /// 处理应用启动 URL，只记录结果
    pub async fn process_app_launch_url(&self, url: &str) {
        debug!("process_app_launch_url called with url={}", url);
        if self.handle_deep_link(url).await {
            debug!("Deep link processed successfully");
        } else {
            debug!("Deep link did not contain shortlink");
        }
    }
}
