// ==========================================
// 采购计划决策支持系统 - 工作流状态快照
// ==========================================
// 职责: 单次运行的全部可观测状态 (状态 / 需求结果 / 计划 / 人工输入 / 消息记录)
// 红线: complete 为终态; waiting_for_input 每次运行最多进入一次
// ==========================================

use crate::domain::demand::DemandResult;
use crate::domain::plan::{Plan, SkippedItem};
use crate::domain::types::{MessageLevel, WorkflowStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 非法状态迁移
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的状态转换: from={from} to={to}")]
pub struct InvalidTransition {
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
}

// ==========================================
// HumanInput - 人工复核输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanInput {
    pub feedback: String,
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl HumanInput {
    pub fn new(feedback: impl Into<String>) -> Self {
        Self {
            feedback: feedback.into(),
            submitted_by: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.submitted_by = Some(author.into());
        self
    }

    /// 空白反馈视为直接批准
    pub fn is_approval(&self) -> bool {
        self.feedback.trim().is_empty()
    }
}

// ==========================================
// WorkflowMessage - 阶段消息
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowMessage {
    pub stage: String,
    pub level: MessageLevel,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// WorkflowState - 工作流状态
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    pub run_id: String,
    status: WorkflowStatus,
    pub demand_results: Vec<DemandResult>,
    pub plan: Option<Plan>,
    pub human_input: Option<HumanInput>,
    pub skipped_items: Vec<SkippedItem>,
    pub messages: Vec<WorkflowMessage>,
    review_entered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    pub fn new(run_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            status: WorkflowStatus::Ready,
            demand_results: Vec::new(),
            plan: None,
            human_input: None,
            skipped_items: Vec::new(),
            messages: Vec::new(),
            review_entered: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// 是否已经进入过人工复核
    pub fn review_entered(&self) -> bool {
        self.review_entered
    }

    /// 受控状态迁移
    pub fn transition_to(&mut self, next: WorkflowStatus) -> Result<(), InvalidTransition> {
        let invalid = InvalidTransition {
            from: self.status,
            to: next,
        };
        if !self.status.can_transition_to(next) {
            return Err(invalid);
        }
        if next == WorkflowStatus::WaitingForInput {
            if self.review_entered {
                return Err(invalid);
            }
            self.review_entered = true;
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 强制进入终态（阶段异常时使用,任何状态均可）
    pub fn force_complete(&mut self) {
        self.status = WorkflowStatus::Complete;
        self.updated_at = Utc::now();
    }

    pub fn push_message(&mut self, stage: &str, level: MessageLevel, content: impl Into<String>) {
        self.messages.push(WorkflowMessage {
            stage: stage.to_string(),
            level,
            content: content.into(),
            created_at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == MessageLevel::Error)
    }
}
