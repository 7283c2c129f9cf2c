// ==========================================
// 采购计划决策支持系统 - 领域类型定义
// ==========================================
// 职责: 工作流状态、保守度策略、置信度分层等枚举
// 红线: 状态机只允许 ready → running → {waiting_for_input → running} → complete
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工作流状态 (Workflow Status)
// ==========================================
// 序列化格式: snake_case (与前端快照一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Ready,           // 未启动
    Running,         // 自动阶段执行中
    WaitingForInput, // 等待人工复核
    Complete,        // 终态
}

impl WorkflowStatus {
    /// 判断状态迁移是否合法
    ///
    /// 合法迁移:
    /// - Ready → Running
    /// - Running → WaitingForInput / Complete
    /// - WaitingForInput → Running
    pub fn can_transition_to(&self, next: WorkflowStatus) -> bool {
        matches!(
            (self, next),
            (WorkflowStatus::Ready, WorkflowStatus::Running)
                | (WorkflowStatus::Running, WorkflowStatus::WaitingForInput)
                | (WorkflowStatus::Running, WorkflowStatus::Complete)
                | (WorkflowStatus::WaitingForInput, WorkflowStatus::Running)
        )
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        *self == WorkflowStatus::Complete
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Ready => write!(f, "ready"),
            WorkflowStatus::Running => write!(f, "running"),
            WorkflowStatus::WaitingForInput => write!(f, "waiting_for_input"),
            WorkflowStatus::Complete => write!(f, "complete"),
        }
    }
}

// ==========================================
// 保守度 (Conservatism Level)
// ==========================================
// 用途: 旧版目标数量计算的基础放大系数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConservatismLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ConservatismLevel {
    /// 基础放大系数
    pub fn multiplier(&self) -> f64 {
        match self {
            ConservatismLevel::High => 1.3,
            ConservatismLevel::Medium => 1.15,
            ConservatismLevel::Low => 1.0,
        }
    }

    /// 从字符串解析（未知值返回 None）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(ConservatismLevel::Low),
            "medium" => Some(ConservatismLevel::Medium),
            "high" => Some(ConservatismLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for ConservatismLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConservatismLevel::Low => write!(f, "low"),
            ConservatismLevel::Medium => write!(f, "medium"),
            ConservatismLevel::High => write!(f, "high"),
        }
    }
}

// ==========================================
// 置信度分层 (Confidence Tier)
// ==========================================
// 阈值: high > 0.7, medium > 0.4, 其余 low
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.7 {
            ConfidenceTier::High
        } else if confidence > 0.4 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    /// i18n 键
    pub fn i18n_key(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "tier.high",
            ConfidenceTier::Medium => "tier.medium",
            ConfidenceTier::Low => "tier.low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::High => write!(f, "high"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::Low => write!(f, "low"),
        }
    }
}

// ==========================================
// 目标调整方向 (Target Adjustment)
// ==========================================
// 目标数量相对原始预测值的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetAdjustment {
    Increased,
    Decreased,
    Maintained,
}

impl TargetAdjustment {
    pub fn between(forecast: f64, target: u32) -> Self {
        let target = target as f64;
        if target > forecast {
            TargetAdjustment::Increased
        } else if target < forecast {
            TargetAdjustment::Decreased
        } else {
            TargetAdjustment::Maintained
        }
    }

    /// i18n 键
    pub fn i18n_key(&self) -> &'static str {
        match self {
            TargetAdjustment::Increased => "adjustment.increased",
            TargetAdjustment::Decreased => "adjustment.decreased",
            TargetAdjustment::Maintained => "adjustment.maintained",
        }
    }
}

impl fmt::Display for TargetAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAdjustment::Increased => write!(f, "increased"),
            TargetAdjustment::Decreased => write!(f, "decreased"),
            TargetAdjustment::Maintained => write!(f, "maintained"),
        }
    }
}

// ==========================================
// 消息级别 (Message Level)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageLevel::Info => write!(f, "INFO"),
            MessageLevel::Warning => write!(f, "WARNING"),
            MessageLevel::Error => write!(f, "ERROR"),
        }
    }
}
