//! 车辆信息获取模块
//!
//! 串联 HTTP 抓取、页面解析和翻译，把车源链接变成车辆事实表。

use crate::core::client::{HttpClient, RequestKind};
use crate::core::diagnostics::AnomalyReporter;
use crate::core::error::FetchError;
use crate::core::listing::{
    car_id_from_url, config_page_url, parse_listing_page, parse_spec_payload, resolve_drive,
    spec_payload_url, DriveType, ListingPage, RawSpecs,
};
use crate::core::models::VehicleFactSheet;
use crate::core::translator::Translator;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// 车辆信息获取器
#[derive(Clone)]
pub struct CarInfoFetcher {
    client: HttpClient,
    translator: Translator,
    reporter: Arc<dyn AnomalyReporter>,
}

impl CarInfoFetcher {
    pub fn new(client: HttpClient, translator: Translator, reporter: Arc<dyn AnomalyReporter>) -> Self {
        Self {
            client,
            translator,
            reporter,
        }
    }

    /// 根据车源链接获取完整的车辆事实表
    pub async fn fetch(&self, url: &str) -> Result<VehicleFactSheet, FetchError> {
        let car_id = car_id_from_url(url)?;
        tracing::info!(car_id = %car_id, "获取车辆信息");

        let html = self
            .client
            .get_text(&config_page_url(&car_id), RequestKind::Page)
            .await?;
        let listing = parse_listing_page(&html)?;

        if listing.spec_id.is_empty() {
            return Err(FetchError::MissingSpecId);
        }

        let payload = self
            .client
            .get_text(&spec_payload_url(&listing.spec_id), RequestKind::Script)
            .await?;
        let specs = parse_spec_payload(&payload)?;

        Ok(self.assemble(listing, specs).await)
    }

    /// 并发获取多个链接，结果顺序与输入一致
    pub async fn fetch_many(
        &self,
        urls: &[String],
        max_concurrent: usize,
    ) -> Vec<Result<VehicleFactSheet, FetchError>> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            let fetcher = self.clone();
            let semaphore = semaphore.clone();
            let url = url.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                fetcher.fetch(&url).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => results.push(Err(FetchError::TaskFailed(e.to_string()))),
            }
        }
        results
    }

    /// 翻译文本字段并组装事实表
    async fn assemble(&self, listing: ListingPage, specs: RawSpecs) -> VehicleFactSheet {
        let full_name = self.translator.translate(&listing.raw_name).await;

        let drive = match specs.drive.as_deref() {
            Some(raw) => match resolve_drive(raw, self.reporter.as_ref()) {
                DriveType::Known(known) => known.to_string(),
                DriveType::Unknown(raw) => self.translator.translate(&raw).await,
            },
            None => String::new(),
        };

        let fuel_type = match specs.fuel.as_deref() {
            Some(raw) => self.translator.translate(raw).await,
            None => String::new(),
        };

        VehicleFactSheet {
            full_name,
            mileage: listing.mileage,
            model_year: listing.model_year,
            price: listing.price,
            power: specs.power,
            engine_size: specs.engine_size,
            drive,
            fuel_type,
        }
    }
}
