//! 抓取层错误类型

use thiserror::Error;

/// 获取车辆信息时可能出现的错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("链接中找不到车辆ID: {0}")]
    CarIdNotFound(String),

    #[error("代理地址无效: {0}")]
    InvalidProxy(String),

    #[error("请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("服务器返回状态码 {0}，而不是 200 OK")]
    Status(u16),

    #[error("价格解析失败: {0}")]
    InvalidPrice(String),

    #[error("参数接口响应格式无效")]
    InvalidPayload,

    #[error("参数JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("页面中没有车型参数ID")]
    MissingSpecId,

    #[error("抓取任务异常终止: {0}")]
    TaskFailed(String),
}
