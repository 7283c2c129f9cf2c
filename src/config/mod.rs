// ==========================================
// 采购计划决策支持系统 - 配置层
// ==========================================
// 职责: 规划配置 (文件 + 环境变量覆写) 与单次运行的不可变上下文
// ==========================================

pub mod context;
pub mod planner_config;

// 重导出核心配置类型
pub use context::PlanningContext;
pub use planner_config::{config_keys, default_config_path, ConfigError, PlannerConfig, ReasonerConfig};
