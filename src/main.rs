//! customs-calc - che168 进口车清关费用计算器
//!
//! 核心设计原则：
//! - 税费计算是纯函数，不依赖时钟、网络和全局状态
//! - 抓取和翻译只负责产出车辆事实表
//! - 税率常量全部可配置

pub mod core;
pub mod storage;

use crate::core::client::HttpClient;
use crate::core::diagnostics::{AnomalyReporter, TracingReporter};
use crate::core::fetcher::CarInfoFetcher;
use crate::core::models::{AppConfig, TariffResult, VehicleFactSheet};
use crate::core::report::render_report;
use crate::core::tariff::TariffEngine;
use crate::core::translator::Translator;
use crate::storage::config::ConfigManager;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "customs-calc",
    version,
    about = "Расчёт таможенных платежей для автомобилей с che168.com"
)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, global = true, env = "CUSTOMS_CALC_CONFIG")]
    config: Option<PathBuf>,

    /// 输出 JSON
    #[arg(long, global = true)]
    json: bool,

    /// 覆盖计算车龄的基准年份
    #[arg(long, global = true)]
    reference_year: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 直接按给定参数计算
    Calc(CalcArgs),
    /// 抓取车源链接并计算
    Fetch {
        /// che168 车源链接
        #[arg(required = true)]
        urls: Vec<String>,
        /// 不调用翻译服务
        #[arg(long)]
        no_translate: bool,
    },
    /// 配置管理
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// 显示当前生效的配置
    Show,
    /// 显示配置文件路径
    Path,
    /// 重置为默认配置
    Reset,
}

#[derive(Args, Debug)]
struct CalcArgs {
    /// 价格（人民币，完整金额）
    #[arg(long)]
    price: f64,
    /// 排量（cc）
    #[arg(long)]
    engine: u32,
    /// 上牌年月，如 2021-06
    #[arg(long)]
    year: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    mileage: String,
    #[arg(long, default_value_t = 0)]
    power: u32,
    #[arg(long, default_value = "")]
    drive: String,
    #[arg(long, default_value = "")]
    fuel: String,
}

impl CalcArgs {
    fn into_fact_sheet(self) -> VehicleFactSheet {
        VehicleFactSheet {
            full_name: self.name,
            mileage: self.mileage,
            model_year: self.year,
            price: self.price,
            power: self.power,
            engine_size: self.engine,
            drive: self.drive,
            fuel_type: self.fuel,
        }
    }
}

/// JSON 输出
#[derive(Serialize)]
struct Calculation<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    fact: &'a VehicleFactSheet,
    result: &'a TariffResult,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_calculation(json: bool, url: Option<&str>, fact: &VehicleFactSheet, result: &TariffResult) -> Result<()> {
    if json {
        let out = Calculation { url, fact, result };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", render_report(fact, result));
    }
    Ok(())
}

async fn run_fetch(config: &AppConfig, engine: &TariffEngine, urls: &[String], json: bool) -> Result<()> {
    let reporter: Arc<dyn AnomalyReporter> = Arc::new(TracingReporter);
    let client = HttpClient::new(&config.network).context("创建HTTP客户端失败")?;
    let translator = Translator::new(config.translator.clone(), &config.network, reporter.clone())
        .context("创建翻译客户端失败")?;
    let fetcher = CarInfoFetcher::new(client, translator, reporter);

    let results = fetcher
        .fetch_many(urls, config.network.max_concurrent_fetches)
        .await;

    let mut failed = 0;
    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(fact) => {
                let calculation = engine.calculate(&fact);
                tracing::info!(url = %url, total = calculation.total, "计算完成");
                print_calculation(json, Some(url), &fact, &calculation)?;
            }
            Err(e) => {
                failed += 1;
                tracing::error!(url = %url, "获取车辆信息失败: {}", e);
                eprintln!("❌ Ошибка при получении информации о машине: {}", url);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} 个链接获取失败", failed);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let manager = ConfigManager::new(cli.config.clone().unwrap_or_else(ConfigManager::default_path));

    let mut config = manager.load_with_env()?;
    if let Some(year) = cli.reference_year {
        config.tariff.reference_year = year;
    }
    let engine = TariffEngine::new(config.tariff);

    match cli.command {
        Commands::Calc(args) => {
            let fact = args.into_fact_sheet();
            let result = engine.calculate(&fact);
            print_calculation(cli.json, None, &fact, &result)?;
        }
        Commands::Fetch { urls, no_translate } => {
            if no_translate {
                config.translator.enabled = false;
            }
            run_fetch(&config, &engine, &urls, cli.json).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => println!("{}", serde_json::to_string_pretty(&config)?),
            ConfigCommands::Path => println!("{}", manager.path().display()),
            ConfigCommands::Reset => {
                manager.reset()?;
                tracing::info!("配置已重置: {}", manager.path().display());
            }
        },
    }

    Ok(())
}
