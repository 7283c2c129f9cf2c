// ==========================================
// 采购计划决策支持系统 - 工作流事件发布
// ==========================================
// 职责: 每个阶段结束后发布状态快照,供前端渐进展示
// 说明: 引擎层定义 trait,展示层实现; 发布失败只记录日志,不影响流程
// ==========================================

use crate::domain::types::WorkflowStatus;
use crate::domain::workflow::WorkflowState;
use serde::Serialize;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 工作流阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// 需求分析
    DemandAnalysis,
    /// 库存数量优化
    InventoryOptimization,
    /// 预算 / 仓容约束
    ConstraintApplication,
    /// 人工复核门控
    ReviewGate,
    /// 人工反馈调和
    FeedbackReconciliation,
    /// 定稿
    Finalization,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::DemandAnalysis => "demand_analysis",
            WorkflowStage::InventoryOptimization => "inventory_optimization",
            WorkflowStage::ConstraintApplication => "constraint_application",
            WorkflowStage::ReviewGate => "review_gate",
            WorkflowStage::FeedbackReconciliation => "feedback_reconciliation",
            WorkflowStage::Finalization => "finalization",
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 工作流事件
///
/// 携带阶段结束时的完整状态快照
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowEvent {
    pub run_id: String,
    pub stage: WorkflowStage,
    pub status: WorkflowStatus,
    pub snapshot: WorkflowState,
}

impl WorkflowEvent {
    pub fn from_state(stage: WorkflowStage, state: &WorkflowState) -> Self {
        Self {
            run_id: state.run_id.clone(),
            stage,
            status: state.status(),
            snapshot: state.clone(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 工作流事件发布者
pub trait WorkflowEventPublisher: Send + Sync {
    fn publish(&self, event: WorkflowEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl WorkflowEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: WorkflowEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - run_id={}, stage={}",
            event.run_id,
            event.stage
        );
        Ok(())
    }
}

/// 收集事件的发布者（测试 / 回放用）
#[derive(Debug, Default)]
pub struct CollectingEventPublisher {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl CollectingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收集事件的副本
    pub fn events(&self) -> Vec<WorkflowEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn stages(&self) -> Vec<WorkflowStage> {
        self.events().iter().map(|e| e.stage).collect()
    }
}

impl WorkflowEventPublisher for CollectingEventPublisher {
    fn publish(&self, event: WorkflowEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut guard = self
            .events
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        guard.push(event);
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn WorkflowEventPublisher>> 的使用
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn WorkflowEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn WorkflowEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布阶段快照; 失败只记录 warn
    pub fn emit(&self, stage: WorkflowStage, state: &WorkflowState) {
        let Some(publisher) = &self.inner else {
            return;
        };
        if let Err(e) = publisher.publish(WorkflowEvent::from_state(stage, state)) {
            tracing::warn!(run_id = %state.run_id, stage = %stage, error = %e, "工作流事件发布失败");
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl std::fmt::Debug for OptionalEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalEventPublisher")
            .field("configured", &self.is_configured())
            .finish()
    }
}
