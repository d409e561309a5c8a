//! 异常上报模块
//!
//! 非致命异常（未知驱动方式、翻译失败等）通过注入的上报器记录，
//! 不使用全局日志单例。

#[cfg(test)]
use std::sync::{Arc, Mutex};

/// 异常类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// 驱动方式不在对照表中
    UnknownDrive,
    /// 翻译服务失败
    Translation,
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::UnknownDrive => write!(f, "unknown_drive"),
            AnomalyKind::Translation => write!(f, "translation"),
        }
    }
}

/// 异常上报能力
pub trait AnomalyReporter: Send + Sync {
    fn report(&self, kind: AnomalyKind, message: &str);
}

/// 转发到 tracing 的上报器
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl AnomalyReporter for TracingReporter {
    fn report(&self, kind: AnomalyKind, message: &str) {
        tracing::warn!(anomaly = %kind, "{}", message);
    }
}

/// 在内存中收集异常
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CollectingReporter {
    entries: Mutex<Vec<(AnomalyKind, String)>>,
}

#[cfg(test)]
impl CollectingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 已收集的异常
    pub fn entries(&self) -> Vec<(AnomalyKind, String)> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl AnomalyReporter for CollectingReporter {
    fn report(&self, kind: AnomalyKind, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((kind, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::new();
        let shared: Arc<dyn AnomalyReporter> = reporter.clone();

        shared.report(AnomalyKind::UnknownDrive, "未知驱动方式: 双电机四驱");
        shared.report(AnomalyKind::Translation, "timeout");

        let entries = reporter.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, AnomalyKind::UnknownDrive);
        assert_eq!(entries[1].1, "timeout");
    }
}
