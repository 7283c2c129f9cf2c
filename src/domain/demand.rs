// ==========================================
// 采购计划决策支持系统 - 需求分析结果
// ==========================================
// 职责: DemandAnalyzer 输出 (置信度 / 目标数量 / 解释文本)
// 红线: 创建后不可变,只被计划阶段消费一次
// ==========================================

use crate::domain::types::{ConfidenceTier, TargetAdjustment};
use serde::{Deserialize, Serialize};

/// 置信度下限
pub const MIN_CONFIDENCE: f64 = 0.1;

/// 置信度上限
pub const MAX_CONFIDENCE: f64 = 0.95;

// ==========================================
// DemandResult - 需求分析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandResult {
    pub item_id: String,
    pub name: String,
    pub forecast: f64,                 // 原始预测值
    pub confidence: f64,               // ∈ [0.1, 0.95]
    pub target_quantity: u32,          // 策略调整后的目标数量
    pub explanation: String,           // 解释文本
}

impl DemandResult {
    pub fn confidence_tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_confidence(self.confidence)
    }

    pub fn adjustment(&self) -> TargetAdjustment {
        TargetAdjustment::between(self.forecast, self.target_quantity)
    }
}
