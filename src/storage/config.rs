//! 配置文件管理模块
//!
//! 配置以 JSON 保存；文件不存在时使用默认值，加载后再应用环境变量覆盖。

use crate::core::models::AppConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// 代理地址的环境变量
pub const PROXY_ENV: &str = "PROXY";

/// 配置管理器
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// 创建配置管理器
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// 获取默认配置路径
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "customs-calc", "CustomsCalc")
            .map(|d| d.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// 加载配置
    pub fn load(&self) -> Result<AppConfig> {
        if self.config_path.exists() {
            let content = std::fs::read_to_string(&self.config_path)
                .with_context(|| format!("读取配置文件失败: {}", self.config_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("配置文件格式错误: {}", self.config_path.display()))
        } else {
            tracing::debug!("配置文件不存在，使用默认配置: {}", self.config_path.display());
            Ok(AppConfig::default())
        }
    }

    /// 加载配置并应用环境变量覆盖
    pub fn load_with_env(&self) -> Result<AppConfig> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// 保存配置
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// 重置为默认配置
    pub fn reset(&self) -> Result<()> {
        self.save(&AppConfig::default())
    }
}

/// 用环境变量覆盖配置，空值不覆盖
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(proxy) = lookup(PROXY_ENV).filter(|p| !p.trim().is_empty()) {
        config.network.proxy = Some(proxy.trim().to_string());
    }
}
