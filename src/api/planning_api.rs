// ==========================================
// 采购计划决策支持系统 - 规划 API
// ==========================================
// 职责: 启动规划运行、接收人工反馈、查询状态快照
// 说明: waiting_for_input 的运行以快照形式保存,人工反馈从该快照恢复
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::context::PlanningContext;
use crate::config::planner_config::PlannerConfig;
use crate::domain::forecast::ForecastRecord;
use crate::domain::types::WorkflowStatus;
use crate::domain::workflow::{HumanInput, WorkflowState};
use crate::engine::orchestrator::PlanningOrchestrator;
use crate::importer::csv_loader::load_dataset;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, instrument};
use uuid::Uuid;

/// 人工反馈文本长度上限（字符）
pub const MAX_FEEDBACK_CHARS: usize = 2_000;

// ==========================================
// SnapshotStore - 运行快照存储
// ==========================================
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: Mutex<HashMap<String, WorkflowState>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, HashMap<String, WorkflowState>>> {
        self.inner
            .lock()
            .map_err(|e| ApiError::InternalError(format!("快照锁获取失败: {}", e)))
    }

    pub fn save(&self, state: &WorkflowState) -> ApiResult<()> {
        self.lock()?.insert(state.run_id.clone(), state.clone());
        Ok(())
    }

    pub fn get(&self, run_id: &str) -> ApiResult<Option<WorkflowState>> {
        Ok(self.lock()?.get(run_id).cloned())
    }

    /// 等待人工输入的运行ID
    pub fn pending_run_ids(&self) -> ApiResult<Vec<String>> {
        let guard = self.lock()?;
        let mut ids: Vec<String> = guard
            .values()
            .filter(|s| s.status() == WorkflowStatus::WaitingForInput)
            .map(|s| s.run_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ==========================================
// PlanningApi - 规划 API
// ==========================================

/// 规划API
///
/// 职责：
/// 1. 启动规划运行（分配 run_id,保存快照）
/// 2. 接收人工反馈并恢复运行
/// 3. 查询运行快照
#[derive(Debug)]
pub struct PlanningApi {
    orchestrator: PlanningOrchestrator,
    snapshots: SnapshotStore,
}

impl PlanningApi {
    pub fn new(orchestrator: PlanningOrchestrator) -> Self {
        Self {
            orchestrator,
            snapshots: SnapshotStore::new(),
        }
    }

    pub fn orchestrator(&self) -> &PlanningOrchestrator {
        &self.orchestrator
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// 启动一次规划运行
    ///
    /// 返回 WaitingForInput 或 Complete 状态的快照
    #[instrument(skip_all, fields(forecasts = forecasts.len()))]
    pub async fn start_run(&self, forecasts: &[ForecastRecord], ctx: &PlanningContext) -> ApiResult<WorkflowState> {
        let run_id = Uuid::new_v4().to_string();
        let state = self.orchestrator.run(run_id, forecasts, ctx).await;
        self.snapshots.save(&state)?;

        info!(run_id = %state.run_id, status = %state.status(), "规划运行已保存");
        Ok(state)
    }

    /// 从数据目录加载输入并启动运行
    pub async fn start_run_from_dir(&self, data_dir: &Path, config: PlannerConfig) -> ApiResult<WorkflowState> {
        config.validate()?;
        let dataset = load_dataset(data_dir)?;
        let ctx = PlanningContext::new(
            config,
            dataset.costs,
            dataset.budgets,
            dataset.capacities,
            &dataset.forecasts,
        );
        self.start_run(&dataset.forecasts, &ctx).await
    }

    /// 提交人工反馈,从保存的快照恢复运行
    ///
    /// # 错误
    /// - `NotFound`: run_id 不存在
    /// - `InvalidState`: 运行不处于 waiting_for_input
    /// - `InvalidInput`: run_id 为空或反馈过长
    #[instrument(skip(self, input), fields(feedback_len = input.feedback.len()))]
    pub fn submit_feedback(&self, run_id: &str, input: HumanInput) -> ApiResult<WorkflowState> {
        if run_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("run_id 不能为空".to_string()));
        }
        if input.feedback.chars().count() > MAX_FEEDBACK_CHARS {
            return Err(ApiError::InvalidInput(format!(
                "反馈文本过长 (上限 {} 字符)",
                MAX_FEEDBACK_CHARS
            )));
        }

        // 持锁完成恢复,同一运行只能恢复一次
        let mut guard = self.snapshots.lock()?;
        let snapshot = guard
            .get(run_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("运行(run_id={})不存在", run_id)))?;
        if snapshot.status() != WorkflowStatus::WaitingForInput {
            return Err(ApiError::InvalidState {
                run_id: run_id.to_string(),
                status: snapshot.status(),
            });
        }

        let resumed = self.orchestrator.resume(snapshot, input)?;
        guard.insert(resumed.run_id.clone(), resumed.clone());

        info!(run_id = %resumed.run_id, status = %resumed.status(), "人工反馈已处理");
        Ok(resumed)
    }

    pub fn get_snapshot(&self, run_id: &str) -> ApiResult<WorkflowState> {
        self.snapshots
            .get(run_id)?
            .ok_or_else(|| ApiError::NotFound(format!("运行(run_id={})不存在", run_id)))
    }
}
