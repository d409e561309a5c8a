//! Core模块 - 包含所有核心业务逻辑

pub mod models;
pub mod tariff;
pub mod report;
pub mod diagnostics;
pub mod error;
pub mod listing;
pub mod client;
pub mod translator;
pub mod fetcher;
