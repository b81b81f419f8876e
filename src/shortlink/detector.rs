use tracing::debug;
use url::Url;

/// 短链识别器
///
/// 以配置的短链域名为依据，判断 URL / referrer 是否携带短链，
/// 并提取规范的短链 token。所有解析失败都按"不是短链"处理，
/// 不向上抛错。
pub struct ShortLinkDetector {
    short_link_domain: String,
}

impl ShortLinkDetector {
    pub fn new(short_link_domain: impl Into<String>) -> Self {
        ShortLinkDetector {
            short_link_domain: short_link_domain.into(),
        }
    }

    /// 判断 URL 是否为短链
    ///
    /// host 小写后包含配置域名即认为是短链；无法解析的输入返回 false。
    pub fn is_short_link(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            debug!("Invalid URL format: {}", url);
            return false;
        };

        let host = parsed.host_str().unwrap_or("").to_lowercase();
        let is_short_link = host.contains(&self.short_link_domain.to_lowercase());

        debug!(
            "URL host: {}, short_link_domain: {}, is_short_link: {}",
            host, self.short_link_domain, is_short_link
        );
        is_short_link
    }

    /// 从 URL 中提取短链 token
    ///
    /// 依次检查：短链 host（返回原始 URL）、`shortlink` 查询参数、
    /// fragment 中 `&` 分隔的 `shortlink=` 键值对。
    pub fn extract_short_link(&self, url: &str) -> Option<String> {
        let Ok(parsed) = Url::parse(url) else {
            debug!("Invalid URL format: {}", url);
            return None;
        };

        // 本身就是短链，原样返回
        if self.is_short_link(url) {
            debug!("Shortlink extracted: {}", url);
            return Some(url.to_string());
        }

        if let Some(value) = Self::query_param(&parsed, "shortlink") {
            debug!("Shortlink found in query parameter: {}", value);
            return Some(value);
        }

        if let Some(value) = Self::fragment_param(&parsed, "shortlink") {
            debug!("Shortlink found in fragment: {}", value);
            return Some(value);
        }

        debug!("No shortlink found in URL: {}", url);
        None
    }

    /// 从 install referrer 字符串中提取短链 token
    ///
    /// 在 `extract_short_link` 的基础上增加一条规则：
    /// `utm_source` 参数值包含短链域名时，该值视为短链 token。
    pub fn extract_short_link_from_referrer(&self, referrer: &str) -> Option<String> {
        if let Some(short_link) = self.extract_short_link(referrer) {
            return Some(short_link);
        }

        if let Ok(parsed) = Url::parse(referrer) {
            if let Some(utm_source) = Self::query_param(&parsed, "utm_source") {
                if utm_source.contains(&self.short_link_domain) {
                    debug!("Shortlink found in utm_source: {}", utm_source);
                    return Some(utm_source);
                }
            }
        }

        debug!("No shortlink found in referrer: {}", referrer);
        None
    }

    /// 查询参数查找，参数名大小写不敏感
    fn query_param(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key.to_lowercase() == name)
            .map(|(_, value)| value.into_owned())
    }

    /// fragment 按 `&` 分隔的 `key=value` 对查找，键大小写不敏感
    ///
    /// fragment 不经过 URL 解析器的解码，值可能仍是百分号编码。
    fn fragment_param(url: &Url, name: &str) -> Option<String> {
        let fragment = url.fragment()?;
        if fragment.is_empty() {
            return None;
        }

        for component in fragment.split('&') {
            let mut parts = component.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if key.to_lowercase() == name && !value.contains('=') => {
                    let decoded = urlencoding::decode(value)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| value.to_string());
                    return Some(decoded);
                }
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ShortLinkDetector {
        ShortLinkDetector::new("tryinhouse.com")
    }

    #[test]
    fn test_is_short_link_host_match() {
        let d = detector();
        assert!(d.is_short_link("https://tryinhouse.com/abc"));
        assert!(d.is_short_link("https://go.tryinhouse.com/abc"));
        assert!(d.is_short_link("https://TRYINHOUSE.COM/abc"));
        assert!(!d.is_short_link("https://example.com/abc"));
    }

    #[test]
    fn test_is_short_link_malformed_url() {
        let d = detector();
        assert!(!d.is_short_link("not a url"));
        assert!(!d.is_short_link(""));
        assert!(!d.is_short_link("://missing-scheme"));
    }

    #[test]
    fn test_is_short_link_domain_case_insensitive() {
        let d = ShortLinkDetector::new("TryInHouse.com");
        assert!(d.is_short_link("https://tryinhouse.com/abc"));
    }

    #[test]
    fn test_extract_identity_on_short_link() {
        let d = detector();
        let url = "https://tryinhouse.com/test123?utm_source=x";
        assert_eq!(d.extract_short_link(url), Some(url.to_string()));
    }

    #[test]
    fn test_extract_from_query_parameter() {
        let d = detector();
        assert_eq!(
            d.extract_short_link("https://example.com/page?shortlink=abc"),
            Some("abc".to_string())
        );
        // 参数名大小写不敏感
        assert_eq!(
            d.extract_short_link("https://example.com/page?ShortLink=abc"),
            Some("abc".to_string())
        );
    }

    #[test]
    fn test_extract_from_fragment() {
        let d = detector();
        assert_eq!(
            d.extract_short_link("https://example.com/page#shortlink=xyz&other=1"),
            Some("xyz".to_string())
        );
        assert_eq!(
            d.extract_short_link("https://example.com/page#other=1&shortlink=xyz"),
            Some("xyz".to_string())
        );
    }

    #[test]
    fn test_extract_from_fragment_percent_encoded() {
        let d = detector();
        assert_eq!(
            d.extract_short_link("https://example.com/page#shortlink=https%3A%2F%2Ftryinhouse.com%2Fabc"),
            Some("https://tryinhouse.com/abc".to_string())
        );
    }

    #[test]
    fn test_extract_none_when_absent() {
        let d = detector();
        assert_eq!(d.extract_short_link("https://example.com/page"), None);
        assert_eq!(d.extract_short_link("https://example.com/#justtext"), None);
        assert_eq!(d.extract_short_link("garbage"), None);
    }

    #[test]
    fn test_query_takes_precedence_over_fragment() {
        let d = detector();
        assert_eq!(
            d.extract_short_link("https://example.com/?shortlink=fromquery#shortlink=fromfrag"),
            Some("fromquery".to_string())
        );
    }

    #[test]
    fn test_referrer_utm_source() {
        let d = detector();
        assert_eq!(
            d.extract_short_link_from_referrer(
                "https://example.com/?utm_source=tryinhouse.com/camp1"
            ),
            Some("tryinhouse.com/camp1".to_string())
        );
        // utm_source 不含短链域名时不命中
        assert_eq!(
            d.extract_short_link_from_referrer("https://example.com/?utm_source=google"),
            None
        );
    }

    #[test]
    fn test_referrer_falls_back_to_standard_rules() {
        let d = detector();
        assert_eq!(
            d.extract_short_link_from_referrer("https://tryinhouse.com/abc"),
            Some("https://tryinhouse.com/abc".to_string())
        );
        assert_eq!(
            d.extract_short_link_from_referrer("https://example.com/?shortlink=ref1"),
            Some("ref1".to_string())
        );
    }
}
