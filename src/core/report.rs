//! 报告格式化模块
//!
//! 把事实表和税费结果渲染成面向用户的俄文文本。
//! 只做格式化，不做任何计算；空字段原样输出。

use crate::core::models::{TariffResult, VehicleFactSheet};
use std::fmt;

/// 一辆车的完整费用报告
#[derive(Debug, Clone, Copy)]
pub struct CostReport<'a> {
    pub fact: &'a VehicleFactSheet,
    pub result: &'a TariffResult,
}

impl<'a> CostReport<'a> {
    pub fn new(fact: &'a VehicleFactSheet, result: &'a TariffResult) -> Self {
        Self { fact, result }
    }
}

impl fmt::Display for CostReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let CostReport { fact, result } = self;

        writeln!(f, "🚗 *{}*", fact.full_name)?;
        writeln!(f)?;
        writeln!(f, "📅 Год выпуска: {}", fact.model_year)?;
        writeln!(f, "📊 Пробег: {}", fact.mileage)?;
        writeln!(f, "💰 Цена: {:.2} юаней", fact.price)?;
        writeln!(f)?;
        writeln!(f, "🔧 Характеристики:")?;
        writeln!(f, "   • Двигатель: {} см³", fact.engine_size)?;
        writeln!(f, "   • Мощность: {} kW", fact.power)?;
        writeln!(f, "   • Привод: {}", fact.drive)?;
        writeln!(f, "   • Топливо: {}", fact.fuel_type)?;
        writeln!(f)?;
        writeln!(f, "💳 Таможенные платежи:")?;
        writeln!(f, "   • Пошлина: {:.2} ₽", result.customs_duty)?;
        writeln!(f, "   • Сбор: {:.2} ₽", result.customs_fee)?;
        writeln!(f, "   • Утилизационный сбор: {:.2} ₽", result.recycling_fee)?;
        writeln!(f)?;
        write!(f, "💵 Итого к оплате: {:.2} ₽", result.total)
    }
}

/// 渲染报告文本
pub fn render_report(fact: &VehicleFactSheet, result: &TariffResult) -> String {
    CostReport::new(fact, result).to_string()
}
