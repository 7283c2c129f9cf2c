// ==========================================
// 采购计划决策支持系统 - 核心库
// ==========================================
// 流程: 需求预测 → 需求分析 → 报童模型优化 → 预算/仓容约束 → 人工复核 → 定稿
// 系统定位: 决策支持系统 (人工最终控制权)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 规划规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 规划配置与上下文
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ConfidenceTier, ConservatismLevel, MessageLevel, TargetAdjustment, WorkflowStatus,
};

// 领域实体
pub use domain::{
    CostEntry, CostTable, DemandResult, ForecastRecord, HumanInput, Plan, PlanItem, SkippedItem,
    WorkflowState,
};

// 引擎
pub use engine::{
    ConstraintEngine, DemandAnalyzer, ExplanationService, FeedbackReconciler, InventoryPlanner,
    PlanningError, PlanningOrchestrator, ReviewGate,
};

// 配置
pub use config::{PlannerConfig, PlanningContext};

// API
pub use api::{ApiError, PlanningApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "采购计划决策支持系统";
