// ==========================================
// 采购计划决策支持系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含文件读取逻辑,不含引擎逻辑
// ==========================================

pub mod cost;
pub mod demand;
pub mod forecast;
pub mod ledger;
pub mod plan;
pub mod types;
pub mod workflow;

// 重导出核心类型
pub use cost::{CostEntry, CostTable};
pub use demand::{DemandResult, MAX_CONFIDENCE, MIN_CONFIDENCE};
pub use forecast::{product_key, select_planning_records, warehouse_key, ForecastRecord};
pub use ledger::{
    BudgetHistory, BudgetRecord, CapacityHistory, CapacityRecord, DEFAULT_FALLBACK_BUDGET,
    DEFAULT_FALLBACK_CAPACITY,
};
pub use plan::{Plan, PlanItem, SkippedItem};
pub use types::{ConfidenceTier, ConservatismLevel, MessageLevel, TargetAdjustment, WorkflowStatus};
pub use workflow::{HumanInput, InvalidTransition, WorkflowMessage, WorkflowState};
