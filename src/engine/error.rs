// ==========================================
// 采购计划决策支持系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 所有错误信息必须带出 item_id 与数值原因 (可解释性)
// ==========================================

use crate::domain::workflow::InvalidTransition;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// 临界比率落在 (0, 1) 之外,分位数为无穷
    #[error("临界比率退化: item_id={item_id}, critical_ratio={critical_ratio:.6} (holding_cost={holding_cost}, price={price})")]
    DegenerateCriticalRatio {
        item_id: String,
        critical_ratio: f64,
        holding_cost: f64,
        price: f64,
    },

    #[error("置信区间无效: item_id={item_id}, low={low}, high={high}")]
    InvalidInterval { item_id: String, low: f64, high: f64 },

    #[error("数值非有限: item_id={item_id}, field={field}")]
    NonFiniteInput { item_id: String, field: String },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("当前状态没有可用计划: run_id={0}")]
    MissingPlan(String),
}

impl PlanningError {
    /// 跳过原因代码 (用于 SkippedItem.reason)
    pub fn code(&self) -> &'static str {
        match self {
            PlanningError::DegenerateCriticalRatio { .. } => "DEGENERATE_CRITICAL_RATIO",
            PlanningError::InvalidInterval { .. } => "INVALID_INTERVAL",
            PlanningError::NonFiniteInput { .. } => "NON_FINITE_INPUT",
            PlanningError::InvalidTransition(_) => "INVALID_TRANSITION",
            PlanningError::MissingPlan(_) => "MISSING_PLAN",
        }
    }
}
