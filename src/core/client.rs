//! HTTP客户端模块
//!
//! 负责带代理、超时和浏览器请求头的页面抓取，响应统一按 GBK 解码。

use crate::core::error::FetchError;
use crate::core::models::NetworkConfig;
use encoding_rs::GBK;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, PRAGMA, REFERER, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const SITE_REFERER: &str = "https://www.che168.com";

/// 请求类型，决定请求头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// HTML 页面
    Page,
    /// 脚本/JSONP 接口
    Script,
}

impl RequestKind {
    fn headers(self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(REFERER, HeaderValue::from_static(SITE_REFERER));

        match self {
            RequestKind::Page => {
                headers.insert(
                    ACCEPT,
                    HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
                );
                headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"));
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
                headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
                headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
            }
            RequestKind::Script => {
                headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
            }
        }

        headers
    }
}

/// 抓取用HTTP客户端
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// 按网络配置创建客户端
    pub fn new(config: &NetworkConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs));

        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = reqwest::Proxy::all(proxy.trim())
                .map_err(|e| FetchError::InvalidProxy(format!("{}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// GET 请求并把响应从 GBK 解码为字符串
    pub async fn get_text(&self, url: &str, kind: RequestKind) -> Result<String, FetchError> {
        tracing::debug!("请求: {}", url);

        let response = self.client.get(url).headers(kind.headers()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(decode_gbk(&bytes))
    }
}

/// GBK 解码，非法字节替换为 U+FFFD
pub fn decode_gbk(bytes: &[u8]) -> String {
    let (text, _, had_errors) = GBK.decode(bytes);
    if had_errors {
        tracing::debug!("响应中存在无法解码的 GBK 字节");
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_gbk() {
        // "未上牌" 的 GBK 编码
        let bytes = [0xce, 0xb4, 0xc9, 0xcf, 0xc5, 0xc6];
        assert_eq!(decode_gbk(&bytes), "未上牌");
        assert_eq!(decode_gbk(b"configTitle({})"), "configTitle({})");
    }

    #[test]
    fn test_request_headers() {
        let page = RequestKind::Page.headers();
        assert_eq!(page.get(ACCEPT_LANGUAGE).unwrap(), "zh-CN,zh;q=0.9,en;q=0.8");
        assert_eq!(page.get(REFERER).unwrap(), SITE_REFERER);

        let script = RequestKind::Script.headers();
        assert_eq!(script.get(ACCEPT).unwrap(), "*/*");
        assert!(script.get(ACCEPT_LANGUAGE).is_none());
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let config = NetworkConfig {
            proxy: Some("::not a url::".to_string()),
            ..Default::default()
        };
        assert!(matches!(HttpClient::new(&config), Err(FetchError::InvalidProxy(_))));
    }

    #[test]
    fn test_empty_proxy_means_direct() {
        let config = NetworkConfig {
            proxy: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(HttpClient::new(&config).is_ok());
    }
}
