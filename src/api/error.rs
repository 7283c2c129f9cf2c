// ==========================================
// 采购计划决策支持系统 - API层错误类型
// ==========================================
// 职责: 汇总下层错误,转换为调用方可读的错误消息
// ==========================================

use crate::config::planner_config::ConfigError;
use crate::domain::types::WorkflowStatus;
use crate::engine::error::PlanningError;
use crate::importer::error::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 只有 waiting_for_input 的运行可以接收人工反馈
    #[error("运行状态不允许该操作: run_id={run_id}, status={status}")]
    InvalidState { run_id: String, status: WorkflowStatus },

    // ==========================================
    // 下层错误
    // ==========================================
    #[error("数据导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("规划失败: {0}")]
    Planning(#[from] PlanningError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
