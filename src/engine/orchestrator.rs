// ==========================================
// 采购计划决策支持系统 - 工作流编排器
// ==========================================
// 职责: 驱动状态机 ready → running → {waiting_for_input → running} → complete
// 阶段: 需求分析 → 报童优化 → 预算/仓容约束 → 人工复核门控 → (反馈调和) → 定稿
// 红线: 任何阶段异常 (含 panic) 都强制进入 complete 并保留已有结果,
//       不允许停留在 running
// ==========================================

use crate::config::context::PlanningContext;
use crate::config::planner_config::PlannerConfig;
use crate::domain::forecast::{select_planning_records, ForecastRecord};
use crate::domain::plan::Plan;
use crate::domain::types::{MessageLevel, WorkflowStatus};
use crate::domain::workflow::{HumanInput, InvalidTransition, WorkflowState};
use crate::engine::constraint::ConstraintEngine;
use crate::engine::demand_analyzer::DemandAnalyzer;
use crate::engine::error::PlanningError;
use crate::engine::events::{OptionalEventPublisher, WorkflowStage};
use crate::engine::feedback::FeedbackReconciler;
use crate::engine::inventory_planner::{InventoryPlanner, NewsvendorParams};
use crate::engine::reasoner::ExplanationService;
use crate::engine::review_gate::ReviewGate;
use crate::i18n::{t, t_with_args};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, instrument, warn};

// ==========================================
// PlanningOrchestrator - 工作流编排器
// ==========================================
#[derive(Debug)]
pub struct PlanningOrchestrator {
    analyzer: DemandAnalyzer,
    planner: InventoryPlanner,
    constraints: ConstraintEngine,
    gate: ReviewGate,
    reconciler: FeedbackReconciler,
    explainer: ExplanationService,
    publisher: OptionalEventPublisher,
}

impl PlanningOrchestrator {
    /// 创建编排器
    ///
    /// # 参数
    /// - config: 规划配置 (保守度、报童参数)
    /// - explainer: 解释服务 (构造时一次性选定 LLM / 确定性实现)
    pub fn new(config: &PlannerConfig, explainer: ExplanationService) -> Self {
        Self {
            analyzer: DemandAnalyzer::new(config.conservatism),
            planner: InventoryPlanner::new(NewsvendorParams::from(config)),
            constraints: ConstraintEngine::new(),
            gate: ReviewGate::new(),
            reconciler: FeedbackReconciler::new(),
            explainer,
            publisher: OptionalEventPublisher::none(),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config, ExplanationService::from_config(&config.reasoner))
    }

    /// 挂接阶段事件发布者
    pub fn with_publisher(mut self, publisher: OptionalEventPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn explainer(&self) -> &ExplanationService {
        &self.explainer
    }

    // ==========================================
    // 自动阶段
    // ==========================================

    /// 执行一次规划运行
    ///
    /// 返回的状态只可能是 `WaitingForInput` 或 `Complete`
    #[instrument(skip_all, fields(forecasts = forecasts.len()))]
    pub async fn run(
        &self,
        run_id: impl Into<String>,
        forecasts: &[ForecastRecord],
        ctx: &PlanningContext,
    ) -> WorkflowState {
        let mut state = WorkflowState::new(run_id);
        info!(run_id = %state.run_id, "开始执行规划流程");

        let outcome = AssertUnwindSafe(self.run_stages(&mut state, forecasts, ctx))
            .catch_unwind()
            .await;
        self.settle(&mut state, outcome);

        info!(
            run_id = %state.run_id,
            status = %state.status(),
            planned = state.plan.as_ref().map(|p| p.items().len()).unwrap_or(0),
            skipped = state.skipped_items.len(),
            "规划流程返回"
        );
        state
    }

    async fn run_stages(
        &self,
        state: &mut WorkflowState,
        forecasts: &[ForecastRecord],
        ctx: &PlanningContext,
    ) -> Result<(), PlanningError> {
        state.transition_to(WorkflowStatus::Running)?;

        let records = select_planning_records(forecasts, ctx.config().plan_date);
        let count = records.len().to_string();

        // ==========================================
        // 步骤1: 需求分析
        // ==========================================
        let stage = WorkflowStage::DemandAnalysis;
        state.push_message(
            stage.as_str(),
            MessageLevel::Info,
            t_with_args("workflow.started", &[("count", &count)]),
        );
        state.demand_results = self.analyzer.analyze_all(&records, &self.explainer).await;
        state.push_message(
            stage.as_str(),
            MessageLevel::Info,
            t_with_args("workflow.demand_done", &[("count", &state.demand_results.len().to_string())]),
        );
        self.publisher.emit(stage, state);

        // ==========================================
        // 步骤2: 报童模型优化
        // ==========================================
        let stage = WorkflowStage::InventoryOptimization;
        let draft = self.planner.plan(&records, &state.demand_results, ctx.costs());
        for skipped in &draft.skipped {
            state.push_message(
                stage.as_str(),
                MessageLevel::Warning,
                t_with_args(
                    "workflow.item_skipped",
                    &[("item_id", &skipped.item_id), ("reason", &skipped.reason)],
                ),
            );
        }
        state.push_message(
            stage.as_str(),
            MessageLevel::Info,
            t_with_args(
                "workflow.optimized",
                &[
                    ("planned", &draft.items.len().to_string()),
                    ("skipped", &draft.skipped.len().to_string()),
                ],
            ),
        );
        state.skipped_items.extend(draft.skipped);
        state.plan = Some(Plan::new(draft.items, t("plan.draft_rationale")));
        self.publisher.emit(stage, state);

        // ==========================================
        // 步骤3: 预算 → 仓容约束
        // ==========================================
        let stage = WorkflowStage::ConstraintApplication;
        let candidates = state
            .plan
            .as_ref()
            .map(|p| p.items().to_vec())
            .ok_or_else(|| PlanningError::MissingPlan(state.run_id.clone()))?;
        let outcome = self.constraints.apply(candidates, ctx);
        for rejected in &outcome.rejected {
            state.push_message(
                stage.as_str(),
                MessageLevel::Warning,
                t_with_args(
                    "workflow.item_skipped",
                    &[("item_id", &rejected.item_id), ("reason", &rejected.reason)],
                ),
            );
        }
        let budget = format!("{:.2}", ctx.available_budget());
        let capacity = ctx.capacity().to_string();
        state.push_message(
            stage.as_str(),
            MessageLevel::Info,
            t_with_args(
                "workflow.constrained",
                &[
                    ("accepted", &outcome.items.len().to_string()),
                    ("rejected", &outcome.rejected.len().to_string()),
                    ("budget", &budget),
                    ("capacity", &capacity),
                ],
            ),
        );
        let mut plan = Plan::new(outcome.items, "");
        plan.rationale = t_with_args(
            "plan.rationale",
            &[
                ("count", &plan.items().len().to_string()),
                ("budget", &budget),
                ("cost", &format!("{:.2}", plan.total_cost())),
                ("capacity", &capacity),
                ("warehouse", ctx.warehouse_id().unwrap_or("-")),
            ],
        );
        state.skipped_items.extend(outcome.rejected);
        state.plan = Some(plan);
        self.publisher.emit(stage, state);

        // ==========================================
        // 步骤4: 人工复核门控
        // ==========================================
        let stage = WorkflowStage::ReviewGate;
        let triggers = match state.plan.as_ref() {
            Some(plan) => self.gate.triggers(plan, ctx.costs()),
            None => return Err(PlanningError::MissingPlan(state.run_id.clone())),
        };

        if !triggers.is_empty() {
            let items: Vec<&str> = triggers.iter().map(|trigger| trigger.item_id.as_str()).collect();
            state.transition_to(WorkflowStatus::WaitingForInput)?;
            state.push_message(
                stage.as_str(),
                MessageLevel::Warning,
                t_with_args(
                    "workflow.review_required",
                    &[("count", &triggers.len().to_string()), ("items", &items.join(", "))],
                ),
            );
            info!(run_id = %state.run_id, triggers = triggers.len(), "计划冻结，等待人工复核");
            self.publisher.emit(stage, state);
            return Ok(());
        }

        state.push_message(stage.as_str(), MessageLevel::Info, t("workflow.no_review"));
        self.publisher.emit(stage, state);

        self.finalize(state)
    }

    // ==========================================
    // 人工复核恢复
    // ==========================================

    /// 从 `WaitingForInput` 快照恢复
    ///
    /// - 空白反馈视为批准,不修改计划
    /// - 非空反馈经 FeedbackReconciler 调和一次
    ///
    /// # 错误
    /// 快照不处于 `WaitingForInput` 时返回 `InvalidTransition`,快照原样丢弃
    #[instrument(skip(self, state, input), fields(run_id = %state.run_id))]
    pub fn resume(&self, mut state: WorkflowState, input: HumanInput) -> Result<WorkflowState, PlanningError> {
        if state.status() != WorkflowStatus::WaitingForInput {
            return Err(InvalidTransition {
                from: state.status(),
                to: WorkflowStatus::Running,
            }
            .into());
        }

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| self.resume_stages(&mut state, input)));
        self.settle(&mut state, outcome);
        Ok(state)
    }

    fn resume_stages(&self, state: &mut WorkflowState, input: HumanInput) -> Result<(), PlanningError> {
        state.transition_to(WorkflowStatus::Running)?;
        let stage = WorkflowStage::FeedbackReconciliation;

        let approval = input.is_approval();
        let feedback = input.feedback.clone();
        state.human_input = Some(input);

        if approval {
            state.push_message(stage.as_str(), MessageLevel::Info, t("workflow.approved"));
        } else {
            let plan = state
                .plan
                .as_ref()
                .ok_or_else(|| PlanningError::MissingPlan(state.run_id.clone()))?;
            let reconciliation = self.reconciler.reconcile(plan, &feedback);
            let rules: Vec<String> = reconciliation.applied_rules.iter().map(|r| r.to_string()).collect();
            state.plan = Some(reconciliation.plan);
            state.push_message(
                stage.as_str(),
                MessageLevel::Info,
                t_with_args("workflow.revised", &[("rules", &rules.join(", "))]),
            );
        }
        self.publisher.emit(stage, state);

        self.finalize(state)
    }

    // ==========================================
    // 定稿 / 异常收口
    // ==========================================

    fn finalize(&self, state: &mut WorkflowState) -> Result<(), PlanningError> {
        state.transition_to(WorkflowStatus::Complete)?;
        let (units, cost) = state
            .plan
            .as_ref()
            .map(|p| (p.total_units(), p.total_cost()))
            .unwrap_or((0, 0.0));
        state.push_message(
            WorkflowStage::Finalization.as_str(),
            MessageLevel::Info,
            t_with_args(
                "workflow.finalized",
                &[("units", &units.to_string()), ("cost", &format!("{:.2}", cost))],
            ),
        );
        self.publisher.emit(WorkflowStage::Finalization, state);
        Ok(())
    }

    /// 阶段结果收口: 错误或 panic 均记录诊断并强制 complete
    fn settle(
        &self,
        state: &mut WorkflowState,
        outcome: Result<Result<(), PlanningError>, Box<dyn Any + Send>>,
    ) {
        let reason = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => format!("{}: {}", e.code(), e),
            Err(payload) => format!("PANIC: {}", panic_message(payload.as_ref())),
        };

        let stage = state
            .messages
            .last()
            .map(|m| m.stage.clone())
            .unwrap_or_else(|| "workflow".to_string());
        error!(run_id = %state.run_id, stage = %stage, reason = %reason, "阶段执行失败，强制结束流程");

        state.push_message(
            &stage,
            MessageLevel::Error,
            t_with_args("workflow.failed", &[("stage", &stage), ("error", &reason)]),
        );
        if state.status() != WorkflowStatus::Complete {
            state.force_complete();
        } else {
            warn!(run_id = %state.run_id, "流程已处于终态");
        }
        self.publisher.emit(WorkflowStage::Finalization, state);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
