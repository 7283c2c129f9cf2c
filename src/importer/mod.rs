// ==========================================
// 采购计划决策支持系统 - 导入层
// ==========================================
// 职责: 外部 CSV 表 → 领域快照
// 红线: 只做解析与过滤,不含规划规则
// ==========================================

pub mod csv_loader;
pub mod error;

// 重导出核心类型
pub use csv_loader::{
    load_budgets, load_capacities, load_costs, load_dataset, load_forecasts, Dataset, BUDGET_FILE,
    CAPACITY_FILE, COSTS_FILE, FORECASTS_FILE,
};
pub use error::{ImportError, ImportResult};
