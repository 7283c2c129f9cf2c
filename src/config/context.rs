// ==========================================
// 采购计划决策支持系统 - 规划上下文
// ==========================================
// 职责: 单次运行的不可变上下文 (配置 + 成本表 + 预算/仓容快照)
// 红线: 构造后只读,显式传入每个阶段,不使用进程级可变缓存
// ==========================================

use crate::config::planner_config::PlannerConfig;
use crate::domain::cost::CostTable;
use crate::domain::forecast::ForecastRecord;
use crate::domain::ledger::{BudgetHistory, CapacityHistory};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PlanningContext {
    config: PlannerConfig,
    costs: CostTable,
    budgets: BudgetHistory,
    capacities: CapacityHistory,
    warehouse_id: Option<String>,
    available_budget: f64,
    capacity: u32,
}

impl PlanningContext {
    /// 构造上下文并一次性解析当前预算与仓容
    ///
    /// # 参数
    /// - `forecasts`: 仅用于在未配置仓库时取首条预测的仓库
    pub fn new(
        config: PlannerConfig,
        costs: CostTable,
        budgets: BudgetHistory,
        capacities: CapacityHistory,
        forecasts: &[ForecastRecord],
    ) -> Self {
        let warehouse_id = config.warehouse_id.clone().or_else(|| {
            forecasts
                .iter()
                .find_map(|f| f.warehouse_key().map(|w| w.to_string()))
        });

        if budgets.is_empty() {
            warn!(fallback = config.fallback_budget, "预算历史为空，使用回退预算");
        }
        let available_budget = budgets.current_or(config.fallback_budget);

        if warehouse_id.as_deref().and_then(|w| capacities.latest_for(w)).is_none() {
            warn!(
                warehouse_id = ?warehouse_id,
                fallback = config.fallback_capacity,
                "仓容历史缺失，使用回退仓容"
            );
        }
        let capacity = capacities.current_or(warehouse_id.as_deref(), config.fallback_capacity);

        info!(
            warehouse_id = ?warehouse_id,
            available_budget,
            capacity,
            cost_entries = costs.len(),
            "规划上下文已构建"
        );

        Self {
            config,
            costs,
            budgets,
            capacities,
            warehouse_id,
            available_budget,
            capacity,
        }
    }

    /// 仅使用配置构造（无历史数据,全部回退）
    pub fn from_config(config: PlannerConfig, costs: CostTable) -> Self {
        Self::new(
            config,
            costs,
            BudgetHistory::default(),
            CapacityHistory::default(),
            &[],
        )
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    pub fn budgets(&self) -> &BudgetHistory {
        &self.budgets
    }

    pub fn capacities(&self) -> &CapacityHistory {
        &self.capacities
    }

    pub fn warehouse_id(&self) -> Option<&str> {
        self.warehouse_id.as_deref()
    }

    pub fn available_budget(&self) -> f64 {
        self.available_budget
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}
