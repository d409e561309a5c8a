//! 税费计算引擎
//!
//! 根据车辆事实表计算关税、报关手续费和报废回收费。
//! 纯计算：无IO、无共享状态，相同输入得到逐位相同的输出。
//!
//! 所有分档表都按上限升序排列，取第一个不超过上限的档位（上限包含在内）。

use crate::core::models::{TariffConfig, TariffResult, VehicleFactSheet};

/// 分档表：升序上限 + 超出所有上限时的取值
struct BracketTable<T: 'static> {
    bounds: &'static [(f64, T)],
    above: T,
}

impl<T: Copy> BracketTable<T> {
    fn resolve(&self, value: f64) -> T {
        self.bounds
            .iter()
            .find(|(upper, _)| value <= *upper)
            .map_or(self.above, |(_, v)| *v)
    }
}

/// 三年以内新车的从价税率与每cc最低税额（欧元）
#[derive(Debug, Clone, Copy, PartialEq)]
struct AdValoremRate {
    rate: f64,
    min_per_cc: f64,
}

/// 按车龄区分的每cc税额（欧元）
#[derive(Debug, Clone, Copy, PartialEq)]
struct SpecificRate {
    three_to_five: f64,
    over_five: f64,
}

/// 按新旧区分的回收费系数
#[derive(Debug, Clone, Copy, PartialEq)]
struct RecyclingCoefficient {
    new: f64,
    used: f64,
}

/// 报关手续费，按车价（卢布）分档
const CUSTOMS_FEE: BracketTable<f64> = BracketTable {
    bounds: &[
        (200_000.0, 1_067.0),
        (450_000.0, 2_134.0),
        (1_200_000.0, 4_269.0),
        (2_700_000.0, 11_746.0),
        (4_200_000.0, 16_524.0),
        (5_500_000.0, 21_344.0),
        (7_000_000.0, 27_540.0),
    ],
    above: 30_000.0,
};

/// 三年以内：按车价（欧元）分档
const DUTY_UNDER_THREE: BracketTable<AdValoremRate> = BracketTable {
    bounds: &[
        (8_500.0, AdValoremRate { rate: 0.54, min_per_cc: 2.5 }),
        (16_700.0, AdValoremRate { rate: 0.48, min_per_cc: 3.5 }),
        (42_300.0, AdValoremRate { rate: 0.48, min_per_cc: 5.5 }),
        (84_500.0, AdValoremRate { rate: 0.48, min_per_cc: 7.5 }),
        (169_000.0, AdValoremRate { rate: 0.48, min_per_cc: 15.0 }),
    ],
    above: AdValoremRate { rate: 0.48, min_per_cc: 20.0 },
};

/// 三年以上：按排量分档
const DUTY_OVER_THREE: BracketTable<SpecificRate> = BracketTable {
    bounds: &[
        (1_000.0, SpecificRate { three_to_five: 1.5, over_five: 3.0 }),
        (1_500.0, SpecificRate { three_to_five: 1.7, over_five: 3.2 }),
        (1_800.0, SpecificRate { three_to_five: 2.5, over_five: 3.5 }),
        (2_300.0, SpecificRate { three_to_five: 2.7, over_five: 4.8 }),
        (3_000.0, SpecificRate { three_to_five: 3.0, over_five: 5.0 }),
    ],
    above: SpecificRate { three_to_five: 3.6, over_five: 5.7 },
};

/// 回收费系数，按排量分档
///
/// 1000/2000/3000 三档系数相同，与现行费率表一致，不要合并或修改。
const RECYCLING: BracketTable<RecyclingCoefficient> = BracketTable {
    bounds: &[
        (1_000.0, RecyclingCoefficient { new: 0.17, used: 0.26 }),
        (2_000.0, RecyclingCoefficient { new: 0.17, used: 0.26 }),
        (3_000.0, RecyclingCoefficient { new: 0.17, used: 0.26 }),
        (3_500.0, RecyclingCoefficient { new: 107.67, used: 165.84 }),
    ],
    above: RecyclingCoefficient { new: 137.11, used: 180.24 },
};

/// 三年以内车辆的两种关税，取较大者
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdValoremDuty {
    /// 从价税（卢布）
    pub percent: f64,
    /// 按排量计的最低税额（卢布）
    pub minimum: f64,
}

impl AdValoremDuty {
    /// 实际征收额
    pub fn amount(&self) -> f64 {
        if self.minimum > self.percent {
            self.minimum
        } else {
            self.percent
        }
    }
}

/// 税费计算引擎
#[derive(Debug, Clone, Copy, Default)]
pub struct TariffEngine {
    config: TariffConfig,
}

impl TariffEngine {
    /// 用给定税率表创建引擎
    pub fn new(config: TariffConfig) -> Self {
        Self { config }
    }

    /// 一次性计算全部税费
    pub fn calculate(&self, fact: &VehicleFactSheet) -> TariffResult {
        let age = vehicle_age(&fact.model_year, self.config.reference_year);

        let customs_fee = self.customs_fee(fact.price);
        let customs_duty = self.customs_duty(fact.price, fact.engine_size, age);
        let recycling_fee = self.recycling_fee(fact.engine_size, age);

        TariffResult {
            age,
            customs_duty,
            customs_fee,
            recycling_fee,
            total: customs_duty + customs_fee + recycling_fee + fact.price * self.config.cny_rate,
        }
    }

    /// 报关手续费
    pub fn customs_fee(&self, price: f64) -> f64 {
        CUSTOMS_FEE.resolve(price * self.config.cny_rate)
    }

    /// 关税：三年以内取从价税与最低税额的较大者，三年以上按排量计
    pub fn customs_duty(&self, price: f64, engine_size: u32, age: i32) -> f64 {
        if age < 3 {
            self.duty_under_three(price, engine_size).amount()
        } else {
            self.duty_over_three(engine_size, age)
        }
    }

    /// 三年以内车辆的关税明细
    pub fn duty_under_three(&self, price: f64, engine_size: u32) -> AdValoremDuty {
        let eur_rate = self.config.eur_rate;
        let price_eur = price * self.config.cny_rate / eur_rate;
        let bracket = DUTY_UNDER_THREE.resolve(price_eur);

        AdValoremDuty {
            percent: price_eur * bracket.rate * eur_rate,
            minimum: f64::from(engine_size) * bracket.min_per_cc * eur_rate,
        }
    }

    /// 三年以上车辆的关税，五年以上使用更高费率
    pub fn duty_over_three(&self, engine_size: u32, age: i32) -> f64 {
        let engine_size = f64::from(engine_size);
        let bracket = DUTY_OVER_THREE.resolve(engine_size);
        let rate_per_cc = if age > 5 {
            bracket.over_five
        } else {
            bracket.three_to_five
        };

        engine_size * rate_per_cc * self.config.eur_rate
    }

    /// 报废回收费
    pub fn recycling_fee(&self, engine_size: u32, age: i32) -> f64 {
        let bracket = RECYCLING.resolve(f64::from(engine_size));
        let coefficient = if age < 3 { bracket.new } else { bracket.used };

        self.config.base_util_fee * coefficient
    }
}

/// 以默认税率计算，仅指定基准年份
///
/// 命令行总是带着配置文件里的税率走 `TariffEngine`，这里是默认税率的入口。
#[cfg_attr(not(test), allow(dead_code))]
pub fn calculate(fact: &VehicleFactSheet, reference_year: i32) -> TariffResult {
    TariffEngine::new(TariffConfig {
        reference_year,
        ..TariffConfig::default()
    })
    .calculate(fact)
}

/// 由 "年-月" 字符串计算车龄
///
/// 格式不符或年份不是整数时按新车处理（车龄 0），不报错。
pub fn vehicle_age(model_year: &str, reference_year: i32) -> i32 {
    let parts: Vec<&str> = model_year.split('-').collect();
    if parts.len() != 2 {
        return 0;
    }

    match parts[0].parse::<i32>() {
        Ok(year) => reference_year.saturating_sub(year),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn engine() -> TariffEngine {
        TariffEngine::new(TariffConfig::default())
    }

    #[test]
    fn test_vehicle_age() {
        assert_eq!(vehicle_age("2024-01", 2025), 1);
        assert_eq!(vehicle_age("2018-12", 2025), 7);
        assert_eq!(vehicle_age("2025-03", 2025), 0);
        assert_eq!(vehicle_age("2026-01", 2025), -1);
    }

    #[test]
    fn test_vehicle_age_lenient_fallback() {
        assert_eq!(vehicle_age("not-a-year", 2025), 0);
        assert_eq!(vehicle_age("Еще не ставился на учет", 2025), 0);
        assert_eq!(vehicle_age("", 2025), 0);
        assert_eq!(vehicle_age("2020", 2025), 0);
        assert_eq!(vehicle_age("abcd-01", 2025), 0);
        assert_eq!(vehicle_age("2020-01-15", 2025), 0);
    }

    #[test]
    fn test_customs_fee_brackets() {
        let e = engine();
        // 人民币价格 -> 卢布 = 价格 * 11
        let cases = [
            (0.0, 1_067.0),
            (18_000.0, 1_067.0),
            (18_200.0, 2_134.0),
            (40_900.0, 2_134.0),
            (100_000.0, 4_269.0),
            (109_000.0, 4_269.0),
            (109_100.0, 11_746.0),
            (245_000.0, 11_746.0),
            (381_000.0, 16_524.0),
            (500_000.0, 21_344.0),
            (636_000.0, 27_540.0),
            (636_400.0, 30_000.0),
        ];
        for (price, fee) in cases {
            assert_eq!(e.customs_fee(price), fee, "price={price}");
        }
    }

    #[test]
    fn test_customs_fee_upper_bound_is_inclusive() {
        // 500000 * 11 恰好等于 5_500_000
        assert_eq!(engine().customs_fee(500_000.0), 21_344.0);
        assert_eq!(engine().customs_fee(500_001.0), 27_540.0);
    }

    #[test]
    fn test_customs_fee_is_monotonic() {
        let e = engine();
        let mut last = 0.0;
        for step in 0..2_000 {
            let price = f64::from(step) * 500.0;
            let fee = e.customs_fee(price);
            assert!(fee >= last, "fee dropped at price {price}");
            last = fee;
        }
    }

    #[test]
    fn test_percent_duty_dominates() {
        let duty = engine().duty_under_three(100_000.0, 1500);
        // 11000 EUR -> 0.48 / 3.5
        assert_close(duty.percent, 528_000.0);
        assert_close(duty.minimum, 525_000.0);
        assert_eq!(duty.amount(), duty.percent);
        assert_eq!(engine().customs_duty(100_000.0, 1500, 1), duty.percent);
    }

    #[test]
    fn test_minimum_duty_dominates() {
        let duty = engine().duty_under_three(100_000.0, 3000);
        assert_close(duty.minimum, 1_050_000.0);
        assert!(duty.minimum > duty.percent);
        assert_eq!(engine().customs_duty(100_000.0, 3000, 2), duty.minimum);
    }

    #[test]
    fn test_cheapest_bracket_uses_higher_rate() {
        // 5000 EUR 落在第一档：0.54 / 2.5
        let duty = engine().duty_under_three(5_000.0 * 100.0 / 11.0, 1000);
        assert_close(duty.percent, 5_000.0 * 0.54 * 100.0);
        assert_close(duty.minimum, 1000.0 * 2.5 * 100.0);
    }

    /// 汇率都取 1，便于直接核对每一档的系数
    fn unit_rate_engine() -> TariffEngine {
        TariffEngine::new(TariffConfig {
            cny_rate: 1.0,
            eur_rate: 1.0,
            ..TariffConfig::default()
        })
    }

    #[test]
    fn test_under_three_brackets() {
        let e = unit_rate_engine();
        // (价格EUR, 税率, 每cc最低税额)，含每档的上限本身
        let cases = [
            (1_000.0, 0.54, 2.5),
            (8_500.0, 0.54, 2.5),
            (8_501.0, 0.48, 3.5),
            (16_700.0, 0.48, 3.5),
            (16_701.0, 0.48, 5.5),
            (42_300.0, 0.48, 5.5),
            (42_301.0, 0.48, 7.5),
            (84_500.0, 0.48, 7.5),
            (84_501.0, 0.48, 15.0),
            (169_000.0, 0.48, 15.0),
            (169_001.0, 0.48, 20.0),
            (500_000.0, 0.48, 20.0),
        ];
        for (price_eur, rate, min_per_cc) in cases {
            let duty = e.duty_under_three(price_eur, 1000);
            assert_close(duty.percent, price_eur * rate);
            assert_close(duty.minimum, 1000.0 * min_per_cc);
            assert_eq!(
                DUTY_UNDER_THREE.resolve(price_eur),
                AdValoremRate { rate, min_per_cc },
                "price_eur={price_eur}"
            );
        }
    }

    #[test]
    fn test_over_three_brackets() {
        let e = unit_rate_engine();
        // (排量, 3-5年, 5年以上)，含每档的上限本身
        let cases = [
            (0, 1.5, 3.0),
            (1_000, 1.5, 3.0),
            (1_001, 1.7, 3.2),
            (1_500, 1.7, 3.2),
            (1_501, 2.5, 3.5),
            (1_800, 2.5, 3.5),
            (1_801, 2.7, 4.8),
            (2_300, 2.7, 4.8),
            (2_301, 3.0, 5.0),
            (3_000, 3.0, 5.0),
            (3_001, 3.6, 5.7),
            (6_000, 3.6, 5.7),
        ];
        for (engine_size, three_to_five, over_five) in cases {
            let cc = f64::from(engine_size);
            assert_close(e.duty_over_three(engine_size, 4), cc * three_to_five);
            assert_close(e.duty_over_three(engine_size, 6), cc * over_five);
            assert_eq!(
                DUTY_OVER_THREE.resolve(cc),
                SpecificRate { three_to_five, over_five },
                "engine_size={engine_size}"
            );
        }
    }

    #[test]
    fn test_recycling_brackets() {
        let cases = [
            (1_000.0, 0.17, 0.26),
            (2_000.0, 0.17, 0.26),
            (3_000.0, 0.17, 0.26),
            (3_001.0, 107.67, 165.84),
            (3_500.0, 107.67, 165.84),
            (3_501.0, 137.11, 180.24),
        ];
        for (engine_size, new, used) in cases {
            assert_eq!(
                RECYCLING.resolve(engine_size),
                RecyclingCoefficient { new, used },
                "engine_size={engine_size}"
            );
        }
    }

    #[test]
    fn test_over_five_rate_is_higher() {
        let e = engine();
        for engine_size in [800, 1000, 1400, 1500, 1700, 2000, 2300, 2800, 3000, 4400] {
            let mid = e.customs_duty(100_000.0, engine_size, 4);
            let old = e.customs_duty(100_000.0, engine_size, 6);
            assert!(old > mid, "engine {engine_size}: {old} <= {mid}");
        }
    }

    #[test]
    fn test_five_years_uses_mid_rate() {
        let e = engine();
        assert_close(e.duty_over_three(1500, 5), 1500.0 * 1.7 * 100.0);
        assert_close(e.duty_over_three(1500, 3), 1500.0 * 1.7 * 100.0);
        assert_close(e.duty_over_three(1500, 6), 1500.0 * 3.2 * 100.0);
    }

    #[test]
    fn test_recycling_fee() {
        let e = engine();
        assert_close(e.recycling_fee(1500, 1), 3_400.0);
        assert_close(e.recycling_fee(1500, 3), 5_200.0);
        assert_close(e.recycling_fee(3_200, 0), 20_000.0 * 107.67);
        assert_close(e.recycling_fee(3_200, 4), 20_000.0 * 165.84);
        assert_close(e.recycling_fee(5_000, 0), 20_000.0 * 137.11);
        assert_close(e.recycling_fee(5_000, 10), 20_000.0 * 180.24);
    }

    #[test]
    fn test_recycling_sub_brackets_share_coefficients() {
        let e = engine();
        for age in [0, 7] {
            let fee = e.recycling_fee(900, age);
            assert_eq!(e.recycling_fee(1_800, age), fee);
            assert_eq!(e.recycling_fee(2_900, age), fee);
        }
    }

    #[test]
    fn test_recycling_coefficient_increases_with_age() {
        let e = engine();
        for engine_size in [0, 1000, 2500, 3300, 6000] {
            assert!(e.recycling_fee(engine_size, 3) > e.recycling_fee(engine_size, 2));
        }
    }

    #[test]
    fn test_custom_rates_are_used() {
        let config = TariffConfig {
            cny_rate: 12.0,
            eur_rate: 90.0,
            base_util_fee: 10_000.0,
            reference_year: 2030,
        };
        let result = TariffEngine::new(config).calculate(&VehicleFactSheet::new(10_000.0, 1500, "2020-05"));

        assert_eq!(result.age, 10);
        assert_close(result.customs_duty, 1500.0 * 3.2 * 90.0);
        assert_eq!(result.customs_fee, 1_067.0);
        assert_close(result.recycling_fee, 2_600.0);
    }

    #[test]
    fn test_calculate_is_deterministic() {
        let fact = VehicleFactSheet::new(183_000.0, 1984, "2022-09");
        let first = calculate(&fact, 2025);
        for _ in 0..10 {
            let again = calculate(&fact, 2025);
            assert_eq!(again.total.to_bits(), first.total.to_bits());
            assert_eq!(again, first);
        }
    }
}
