//! 存储模块 - 配置文件读写

pub mod config;
