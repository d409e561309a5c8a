//! 核心数据模型定义
//!
//! 车辆事实表（输入）、税费结果（输出）以及各层配置。
//! 事实表由抓取层一次性构造，之后任何模块都不得修改。

use serde::{Deserialize, Serialize};

/// 车辆事实表
/// 计算税费所需的全部信息，文本字段可能来自机器翻译，核心只原样透传
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct VehicleFactSheet {
    /// 车型全称
    pub full_name: String,
    /// 里程（已格式化，如 "35000 км"）
    pub mileage: String,
    /// 上牌年月，形如 "2021-06"；未上牌时为本地化提示语
    pub model_year: String,
    /// 价格（人民币，已乘以 10000）
    pub price: f64,
    /// 最大功率（kW）
    pub power: u32,
    /// 排量（cc），0 表示未知
    pub engine_size: u32,
    /// 驱动方式
    pub drive: String,
    /// 燃料形式
    pub fuel_type: String,
}

impl VehicleFactSheet {
    /// 只用计算必需的三个字段构造事实表
    pub fn new(price: f64, engine_size: u32, model_year: impl Into<String>) -> Self {
        Self {
            price,
            engine_size,
            model_year: model_year.into(),
            ..Default::default()
        }
    }
}

/// 税费计算结果（卢布）
/// 只能由 `TariffEngine::calculate` 一次性构造
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TariffResult {
    /// 车龄（年），无法解析年份时为 0
    pub age: i32,
    /// 关税
    pub customs_duty: f64,
    /// 报关手续费
    pub customs_fee: f64,
    /// 报废回收费
    pub recycling_fee: f64,
    /// 合计 = 三项税费 + 车价折合卢布
    pub total: f64,
}

/// 税率表常量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    /// 人民币兑卢布
    pub cny_rate: f64,
    /// 欧元兑卢布
    pub eur_rate: f64,
    /// 报废回收费基数
    pub base_util_fee: f64,
    /// 计算车龄的基准年份
    pub reference_year: i32,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            cny_rate: 11.0,
            eur_rate: 100.0,
            base_util_fee: 20_000.0,
            reference_year: 2025,
        }
    }
}

/// 网络配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// 代理地址，为空则直连
    pub proxy: Option<String>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 空闲连接保持时间（秒）
    pub idle_timeout_secs: u64,
    /// 同时抓取的最大链接数
    pub max_concurrent_fetches: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            request_timeout_secs: 15,
            idle_timeout_secs: 30,
            max_concurrent_fetches: 100,
        }
    }
}

/// 翻译服务配置（LibreTranslate 兼容接口）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// 是否启用翻译
    pub enabled: bool,
    /// 接口地址
    pub endpoint: String,
    /// 原文语言
    pub source_lang: String,
    /// 中转语言
    pub pivot_lang: String,
    /// 目标语言
    pub target_lang: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:5000/translate".to_string(),
            source_lang: "zh".to_string(),
            pivot_lang: "en".to_string(),
            target_lang: "ru".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 税率表
    pub tariff: TariffConfig,
    /// 网络
    pub network: NetworkConfig,
    /// 翻译
    pub translator: TranslatorConfig,
}
