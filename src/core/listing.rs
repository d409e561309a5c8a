//! 车源页面解析模块
//!
//! 从 che168 的链接、配置页HTML和参数接口(JSONP)中提取原始信息。
//! 此模块只做解析，不做网络请求和翻译。

use crate::core::diagnostics::{AnomalyKind, AnomalyReporter};
use crate::core::error::FetchError;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

/// 未上牌车辆在页面上的写法
const NOT_REGISTERED_ZH: &str = "未上牌";
/// 未上牌车辆在报告中的写法，计算车龄时按新车处理
pub const NOT_REGISTERED: &str = "Еще не ставился на учет";

/// 信息行中的全角分隔符
const INFO_SEPARATOR: char = '／';

/// 已知驱动方式对照表
const DRIVE_TYPES: &[(&str, &str)] = &[
    ("中置四驱", "Полный привод"),
    ("前置后驱", "Переднемоторный задний привод"),
    ("前置前驱", "Передний привод"),
    ("中置后驱", "Среднемоторный задний привод"),
    ("后置后驱", "Задний привод"),
];

lazy_static! {
    static ref NUMBER_PATTERN: Regex = Regex::new(r"[\d.]+").unwrap();
    static ref SPEC_ID: Selector = Selector::parse("#CarSpecid").unwrap();
    static ref PRICE: Selector = Selector::parse("#car_price").unwrap();
    static ref FULL_NAME: Selector = Selector::parse(".source-info-con h3 a").unwrap();
    static ref INFO_LINE: Selector = Selector::parse(".source-info-con p").unwrap();
}

/// 配置页中提取到的基本信息
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingPage {
    /// 车型参数ID，为空表示页面没有参数
    pub spec_id: String,
    /// 价格（人民币，已乘以 10000）
    pub price: f64,
    /// 车型名称（中文原文）
    pub raw_name: String,
    /// 里程（已换算为公里）
    pub mileage: String,
    /// 上牌年月
    pub model_year: String,
}

/// 参数接口中提取到的技术参数
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSpecs {
    /// 最大功率（kW），多个取最大
    pub power: u32,
    /// 排量（mL）
    pub engine_size: u32,
    /// 驱动方式（中文原文）
    pub drive: Option<String>,
    /// 燃料形式（中文原文）
    pub fuel: Option<String>,
}

/// 驱动方式识别结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveType {
    /// 对照表中已有的译名
    Known(&'static str),
    /// 未知写法，需要交给翻译
    Unknown(String),
}

#[derive(Debug, Deserialize)]
struct SpecResponse {
    #[serde(default)]
    result: SpecResult,
}

#[derive(Debug, Deserialize, Default)]
struct SpecResult {
    #[serde(default)]
    paramtypeitems: Vec<ParamTypeItem>,
}

#[derive(Debug, Deserialize)]
struct ParamTypeItem {
    #[serde(default)]
    paramitems: Vec<ParamItem>,
}

#[derive(Debug, Deserialize)]
struct ParamItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

/// 从车源链接中提取车辆ID
///
/// 移动版链接优先取 `infoid` 参数，否则取路径中 `.html` 之前的部分。
/// 没有协议头的链接按 https 补全后再解析。
pub fn car_id_from_url(url: &str) -> Result<String, FetchError> {
    if url.contains("m.che168.com") {
        let parsed = if url.contains("://") {
            reqwest::Url::parse(url)
        } else {
            reqwest::Url::parse(&format!("https://{}", url))
        };
        if let Ok(parsed) = parsed {
            if let Some((_, id)) = parsed.query_pairs().find(|(k, v)| k == "infoid" && !v.is_empty()) {
                return Ok(id.into_owned());
            }
        }
    }

    url.split('/')
        .find_map(|part| part.find(".html").map(|idx| part[..idx].to_string()))
        .ok_or_else(|| FetchError::CarIdNotFound(url.to_string()))
}

/// 配置页地址
pub fn config_page_url(car_id: &str) -> String {
    format!("https://www.che168.com/CarConfig/CarConfig.html?infoid={}", car_id)
}

/// 参数接口地址
pub fn spec_payload_url(spec_id: &str) -> String {
    format!(
        "https://cacheapigo.che168.com/CarProduct/GetParam.ashx?specid={}&callback=configTitle",
        spec_id
    )
}

/// 解析配置页
pub fn parse_listing_page(html: &str) -> Result<ListingPage, FetchError> {
    let doc = Html::parse_document(html);
    let mut page = ListingPage::default();

    page.spec_id = doc
        .select(&SPEC_ID)
        .next()
        .and_then(|el| el.value().attr("value"))
        .unwrap_or_default()
        .to_string();

    let price_str = doc
        .select(&PRICE)
        .next()
        .and_then(|el| el.value().attr("value"))
        .unwrap_or("0");
    let price: f64 = price_str
        .trim()
        .parse()
        .map_err(|_| FetchError::InvalidPrice(price_str.to_string()))?;
    page.price = price * 10_000.0;

    page.raw_name = doc
        .select(&FULL_NAME)
        .flat_map(|el| el.text())
        .collect::<String>();

    if let Some(info) = doc.select(&INFO_LINE).next() {
        let text = info.text().collect::<String>();
        let (mileage, model_year) = split_info_line(&text);
        page.mileage = mileage;
        page.model_year = model_year;
    }

    Ok(page)
}

/// 拆分 "里程／上牌时间／..." 信息行
fn split_info_line(text: &str) -> (String, String) {
    let Some((mileage, rest)) = text.split_once(INFO_SEPARATOR) else {
        return (String::new(), String::new());
    };

    let model_year = match rest.split_once(INFO_SEPARATOR) {
        Some((year, _)) => {
            let year = year.trim();
            if year == NOT_REGISTERED_ZH {
                NOT_REGISTERED.to_string()
            } else {
                year.to_string()
            }
        }
        None => String::new(),
    };

    (parse_mileage(mileage), model_year)
}

/// 把 "3.5万公里" 换算为 "35000 км"，无法识别时原样返回
pub fn parse_mileage(text: &str) -> String {
    let text = text.trim();

    let Some(number) = NUMBER_PATTERN.find(text) else {
        return text.to_string();
    };

    match number.as_str().parse::<f64>() {
        Ok(value) => format!("{:.0} км", value * 10_000.0),
        Err(_) => text.to_string(),
    }
}

/// 解析参数接口的 JSONP 响应
pub fn parse_spec_payload(payload: &str) -> Result<RawSpecs, FetchError> {
    let start = payload.find('(').ok_or(FetchError::InvalidPayload)?;
    let end = payload.rfind(')').ok_or(FetchError::InvalidPayload)?;
    if end <= start {
        return Err(FetchError::InvalidPayload);
    }

    let response: SpecResponse = serde_json::from_str(&payload[start + 1..end])?;
    let mut specs = RawSpecs::default();

    let params = response
        .result
        .paramtypeitems
        .iter()
        .flat_map(|group| group.paramitems.iter());

    for param in params {
        let name = param.name.as_str();
        let value = param.value.as_str();

        if name.contains("(kW)") {
            if let Ok(power) = value.parse::<u32>() {
                specs.power = specs.power.max(power);
            }
        }

        if name.contains("(mL)") {
            if let Ok(engine_size) = value.parse::<u32>() {
                specs.engine_size = engine_size;
            }
        }

        if name.contains("驱动方式") {
            specs.drive = Some(value.to_string());
        }

        if name.contains("燃料形式") {
            specs.fuel = Some(value.to_string());
        }
    }

    Ok(specs)
}

/// 查表识别驱动方式，未知写法上报后交给调用方翻译
pub fn resolve_drive(raw: &str, reporter: &dyn AnomalyReporter) -> DriveType {
    match DRIVE_TYPES.iter().find(|(zh, _)| *zh == raw) {
        Some((_, known)) => DriveType::Known(known),
        None => {
            reporter.report(AnomalyKind::UnknownDrive, &format!("未知驱动方式: {}", raw));
            DriveType::Unknown(raw.to_string())
        }
    }
}
