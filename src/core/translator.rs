//! 翻译模块
//!
//! 通过 LibreTranslate 兼容接口做两跳翻译（中文 -> 英文 -> 俄文）。
//!
//! 设计原则：
//! - 翻译是尽力而为，永远不让整个请求失败
//! - 哪一跳失败就返回上一跳的结果，并上报异常
//! - 译文对核心计算是不透明的字符串

use crate::core::diagnostics::{AnomalyKind, AnomalyReporter};
use crate::core::error::FetchError;
use crate::core::models::{NetworkConfig, TranslatorConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// 翻译请求
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
}

/// 翻译响应
#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// 两跳翻译器
#[derive(Clone)]
pub struct Translator {
    /// 翻译配置
    config: TranslatorConfig,
    /// HTTP客户端
    client: reqwest::Client,
    /// 异常上报
    reporter: Arc<dyn AnomalyReporter>,
}

impl Translator {
    /// 创建翻译器，请求超时沿用网络配置
    pub fn new(
        config: TranslatorConfig,
        network: &NetworkConfig,
        reporter: Arc<dyn AnomalyReporter>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network.request_timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            reporter,
        })
    }

    /// 翻译文本，失败时退回到上一跳的结果
    pub async fn translate(&self, text: &str) -> String {
        if text.is_empty() || !self.config.enabled {
            return text.to_string();
        }

        let pivot = match self
            .request(text, &self.config.source_lang, &self.config.pivot_lang)
            .await
        {
            Ok(pivot) => pivot,
            Err(e) => {
                self.reporter.report(
                    AnomalyKind::Translation,
                    &format!("翻译为{}失败\n原文: {}\n错误: {}", self.config.pivot_lang, text, e),
                );
                return text.to_string();
            }
        };

        match self
            .request(&pivot, &self.config.pivot_lang, &self.config.target_lang)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                self.reporter.report(
                    AnomalyKind::Translation,
                    &format!("翻译为{}失败\n中间译文: {}\n错误: {}", self.config.target_lang, pivot, e),
                );
                pivot
            }
        }
    }

    /// 调用翻译接口
    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let request = TranslateRequest {
            q: text,
            source,
            target,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<TranslateResponse>()
            .await?;

        Ok(response.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diagnostics::CollectingReporter;

    fn translator_with_timeout(
        enabled: bool,
        endpoint: &str,
        timeout_secs: u64,
    ) -> (Translator, Arc<CollectingReporter>) {
        let reporter = CollectingReporter::new();
        let config = TranslatorConfig {
            enabled,
            endpoint: endpoint.to_string(),
            ..Default::default()
        };
        let network = NetworkConfig {
            request_timeout_secs: timeout_secs,
            ..Default::default()
        };
        let translator = Translator::new(config, &network, reporter.clone()).unwrap();
        (translator, reporter)
    }

    fn translator(enabled: bool, endpoint: &str) -> (Translator, Arc<CollectingReporter>) {
        translator_with_timeout(enabled, endpoint, NetworkConfig::default().request_timeout_secs)
    }

    #[tokio::test]
    async fn test_empty_text_is_untouched() {
        let (t, reporter) = translator(true, "http://127.0.0.1:9/translate");
        assert_eq!(t.translate("").await, "");
        assert!(reporter.entries().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_returns_original() {
        let (t, reporter) = translator(false, "http://127.0.0.1:9/translate");
        assert_eq!(t.translate("插电式混合动力").await, "插电式混合动力");
        assert!(reporter.entries().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back_to_original() {
        // 端口 9 (discard) 上没有翻译服务
        let (t, reporter) = translator(true, "http://127.0.0.1:9/translate");
        assert_eq!(t.translate("前置四驱").await, "前置四驱");

        let entries = reporter.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, AnomalyKind::Translation);
        assert!(entries[0].1.contains("前置四驱"));
    }

    #[tokio::test]
    async fn test_stalled_service_times_out() {
        // 接受连接但从不响应
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let endpoint = format!("http://{}/translate", addr);
        let (t, reporter) = translator_with_timeout(true, &endpoint, 1);
        let translated = tokio::time::timeout(Duration::from_secs(10), t.translate("前置四驱"))
            .await
            .expect("translation must give up after the request timeout");

        assert_eq!(translated, "前置四驱");
        let entries = reporter.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, AnomalyKind::Translation);
    }

    #[test]
    fn test_request_shape() {
        let request = TranslateRequest {
            q: "汽油",
            source: "zh",
            target: "en",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"q": "汽油", "source": "zh", "target": "en"}));

        let response: TranslateResponse = serde_json::from_str(r#"{"translatedText":"Petrol"}"#).unwrap();
        assert_eq!(response.translated_text, "Petrol");
    }
}
