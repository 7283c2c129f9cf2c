// ==========================================
// 采购计划决策支持系统 - 引擎层
// ==========================================
// 职责: 实现规划规则引擎,不做文件读取
// 红线: 引擎只消费不可变上下文; 所有剔除必须输出 reason
// ==========================================

pub mod constraint;
pub mod demand_analyzer;
pub mod error;
pub mod events;
pub mod feedback;
pub mod inventory_planner;
pub mod orchestrator;
pub mod quantile;
pub mod reasoner;
pub mod review_gate;

// 重导出核心引擎
pub use constraint::{BudgetLedger, ConstraintEngine, ConstraintOutcome};
pub use demand_analyzer::DemandAnalyzer;
pub use error::PlanningError;
pub use events::{
    CollectingEventPublisher, NoOpEventPublisher, OptionalEventPublisher, WorkflowEvent,
    WorkflowEventPublisher, WorkflowStage,
};
pub use feedback::{FeedbackReconciler, FeedbackRule, Reconciliation};
pub use inventory_planner::{InventoryPlanner, NewsvendorParams, PlanDraft};
pub use orchestrator::PlanningOrchestrator;
pub use quantile::quantile;
pub use reasoner::{
    DeterministicReasoner, Explanation, ExplanationFacts, ExplanationService, ExplanationSource,
    LlmReasoner, Reasoner, ReasonerError,
};
pub use review_gate::{ReviewGate, ReviewTrigger};
