// ==========================================
// 采购计划决策支持系统 - 库存数量优化引擎 (报童模型)
// ==========================================
// 职责: 正态需求假设下的单周期最优订货量
// 输入: 均值 + 置信区间 + 单品成本结构
// 输出: 最优订货量 (非负整数, 向上取整)
// 红线: 临界比率落在 (0, 1) 之外时报错标记,不静默截断
// ==========================================
// 公式:
//   σ  = (ci_high − ci_low) / (2 × z_interval)
//   p  = shortage_cost + markup      (采购价)
//   CR = (p − holding_cost) / (p − salvage)
//   Q* = ceil(max(0, μ + σ × Φ⁻¹(CR)))
// ==========================================

use crate::config::planner_config::PlannerConfig;
use crate::domain::cost::CostTable;
use crate::domain::demand::DemandResult;
use crate::domain::forecast::ForecastRecord;
use crate::domain::plan::{PlanItem, SkippedItem};
use crate::engine::error::PlanningError;
use crate::engine::quantile::quantile;
use tracing::{debug, info, instrument, warn};

// ==========================================
// NewsvendorParams - 模型参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewsvendorParams {
    pub price_markup: f64,
    pub salvage_value: f64,
    pub interval_z: f64,
}

impl Default for NewsvendorParams {
    fn default() -> Self {
        Self {
            price_markup: 10.0,
            salvage_value: 0.0,
            interval_z: 1.96,
        }
    }
}

impl From<&PlannerConfig> for NewsvendorParams {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            price_markup: config.price_markup,
            salvage_value: config.salvage_value,
            interval_z: config.interval_z,
        }
    }
}

/// 计划草案（约束前）
#[derive(Debug, Clone, Default)]
pub struct PlanDraft {
    pub items: Vec<PlanItem>,
    pub skipped: Vec<SkippedItem>,
}

// ==========================================
// InventoryPlanner - 报童模型优化器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct InventoryPlanner {
    params: NewsvendorParams,
}

impl InventoryPlanner {
    pub fn new(params: NewsvendorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &NewsvendorParams {
        &self.params
    }

    /// 采购价 = 缺货成本 + 固定加价
    pub fn purchasing_price(&self, shortage_cost: f64) -> f64 {
        shortage_cost + self.params.price_markup
    }

    /// 需求标准差 (区间半宽 / z)
    pub fn std_dev(&self, ci_low: f64, ci_high: f64) -> f64 {
        (ci_high - ci_low) / (2.0 * self.params.interval_z)
    }

    /// 临界比率 CR = (p − c) / (p − s)
    pub fn critical_ratio(&self, price: f64, holding_cost: f64) -> f64 {
        (price - holding_cost) / (price - self.params.salvage_value)
    }

    /// 最优订货量
    ///
    /// # 错误
    /// - `NonFiniteInput`: 任一输入非有限
    /// - `InvalidInterval`: ci_high < ci_low
    /// - `DegenerateCriticalRatio`: CR ∉ (0, 1)
    pub fn optimal_quantity(
        &self,
        item_id: &str,
        mean: f64,
        ci_low: f64,
        ci_high: f64,
        holding_cost: f64,
        shortage_cost: f64,
    ) -> Result<u32, PlanningError> {
        for (field, value) in [
            ("mean", mean),
            ("ci_low", ci_low),
            ("ci_high", ci_high),
            ("holding_cost", holding_cost),
            ("shortage_cost", shortage_cost),
        ] {
            if !value.is_finite() {
                return Err(PlanningError::NonFiniteInput {
                    item_id: item_id.to_string(),
                    field: field.to_string(),
                });
            }
        }
        if ci_high < ci_low {
            return Err(PlanningError::InvalidInterval {
                item_id: item_id.to_string(),
                low: ci_low,
                high: ci_high,
            });
        }

        let std_dev = self.std_dev(ci_low, ci_high);
        let price = self.purchasing_price(shortage_cost);
        let critical_ratio = self.critical_ratio(price, holding_cost);

        if !(critical_ratio > 0.0 && critical_ratio < 1.0) {
            return Err(PlanningError::DegenerateCriticalRatio {
                item_id: item_id.to_string(),
                critical_ratio,
                holding_cost,
                price,
            });
        }

        let z = quantile(critical_ratio);
        let q_star = (mean + std_dev * z).max(0.0).ceil();

        debug!(
            item_id,
            std_dev,
            price,
            critical_ratio,
            z,
            q_star,
            "报童模型计算完成"
        );

        Ok(q_star.min(u32::MAX as f64) as u32)
    }

    /// 为全部需求结果生成计划草案（保持输入顺序）
    ///
    /// - 无成本条目的 item 跳过 (NO_COST_ENTRY)
    /// - 报童模型报错的 item 跳过并保留错误原因
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn plan(
        &self,
        records: &[ForecastRecord],
        demand: &[DemandResult],
        costs: &CostTable,
    ) -> PlanDraft {
        let mut draft = PlanDraft::default();

        for (record, result) in records.iter().zip(demand.iter()) {
            let Some(cost) = costs.for_item(&record.item_id) else {
                warn!(item_id = %record.item_id, product_id = record.product_key(), "成本条目缺失，跳过该 item");
                draft.skipped.push(SkippedItem::new(
                    record.item_id.clone(),
                    format!("NO_COST_ENTRY: product_id={}", record.product_key()),
                ));
                continue;
            };

            match self.optimal_quantity(
                &record.item_id,
                record.yhat,
                record.yhat_lower,
                record.yhat_upper,
                cost.holding_cost,
                cost.shortage_cost,
            ) {
                Ok(quantity) => {
                    let unit_cost = self.purchasing_price(cost.shortage_cost);
                    draft.items.push(PlanItem::new(
                        record.item_id.clone(),
                        result.name.clone(),
                        quantity,
                        unit_cost,
                    ));
                }
                Err(e) => {
                    warn!(item_id = %record.item_id, error = %e, "最优订货量计算失败，跳过该 item");
                    draft
                        .skipped
                        .push(SkippedItem::new(record.item_id.clone(), format!("{}: {}", e.code(), e)));
                }
            }
        }

        info!(
            planned = draft.items.len(),
            skipped = draft.skipped.len(),
            "库存优化完成"
        );
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cost::CostEntry;
    use chrono::NaiveDate;

    fn planner() -> InventoryPlanner {
        InventoryPlanner::new(NewsvendorParams::default())
    }

    #[test]
    fn test_reference_example() {
        // p = 15, CR = 14/15, σ = 0.8/3.92, Q* ≈ 2.31 → 3
        let p = planner();
        assert_eq!(p.purchasing_price(5.0), 15.0);
        assert!((p.critical_ratio(15.0, 1.0) - 14.0 / 15.0).abs() < 1e-12);
        assert!((p.std_dev(1.6, 2.4) - 0.2041).abs() < 1e-4);
        assert_eq!(p.optimal_quantity("X", 2.0, 1.6, 2.4, 1.0, 5.0), Ok(3));
    }

    #[test]
    fn test_zero_spread_returns_ceil_mean() {
        assert_eq!(planner().optimal_quantity("X", 7.2, 7.2, 7.2, 1.0, 5.0), Ok(8));
    }

    #[test]
    fn test_negative_quantity_clamped_to_zero() {
        // holding 很高 → CR 很小 → z 为负
        assert_eq!(planner().optimal_quantity("X", 0.5, 0.0, 40.0, 14.9, 5.0), Ok(0));
    }

    #[test]
    fn test_holding_cost_at_or_above_price_is_flagged() {
        // p = 15, c = 15 → CR = 0
        let err = planner().optimal_quantity("X", 10.0, 8.0, 12.0, 15.0, 5.0).unwrap_err();
        assert!(matches!(err, PlanningError::DegenerateCriticalRatio { .. }));

        // c = 20 > p → CR < 0
        let err = planner().optimal_quantity("X", 10.0, 8.0, 12.0, 20.0, 5.0).unwrap_err();
        assert_eq!(err.code(), "DEGENERATE_CRITICAL_RATIO");
    }

    #[test]
    fn test_zero_holding_cost_is_flagged() {
        // c = 0 → CR = 1 → z = +∞
        let err = planner().optimal_quantity("X", 10.0, 8.0, 12.0, 0.0, 5.0).unwrap_err();
        assert!(matches!(
            err,
            PlanningError::DegenerateCriticalRatio { critical_ratio, .. } if critical_ratio == 1.0
        ));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            planner().optimal_quantity("X", 10.0, 12.0, 8.0, 1.0, 5.0),
            Err(PlanningError::InvalidInterval { .. })
        ));
        assert!(matches!(
            planner().optimal_quantity("X", f64::NAN, 8.0, 12.0, 1.0, 5.0),
            Err(PlanningError::NonFiniteInput { .. })
        ));
    }

    #[test]
    fn test_plan_skips_missing_costs_and_degenerate_items() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mk = |id: &str| ForecastRecord {
            item_id: id.to_string(),
            client_id: None,
            warehouse_id: None,
            product_id: None,
            date: d,
            yhat: 2.0,
            yhat_lower: 1.6,
            yhat_upper: 2.4,
            confidence: None,
        };
        let records = vec![mk("C/W/P1"), mk("C/W/P2"), mk("C/W/P3")];
        let demand: Vec<DemandResult> = records
            .iter()
            .map(|r| DemandResult {
                item_id: r.item_id.clone(),
                name: r.display_name(),
                forecast: r.yhat,
                confidence: 0.5,
                target_quantity: 3,
                explanation: String::new(),
            })
            .collect();

        let mut costs = CostTable::new();
        costs.insert("P1", CostEntry::new(1.0, 5.0));
        costs.insert("P3", CostEntry::new(30.0, 5.0));

        let draft = planner().plan(&records, &demand, &costs);
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].item_id, "C/W/P1");
        assert_eq!(draft.items[0].quantity(), 3);
        assert_eq!(draft.items[0].unit_cost, 15.0);
        assert_eq!(draft.items[0].total_cost(), 45.0);

        let codes: Vec<&str> = draft.skipped.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec!["NO_COST_ENTRY", "DEGENERATE_CRITICAL_RATIO"]);
    }
}
