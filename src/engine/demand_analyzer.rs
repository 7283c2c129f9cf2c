// ==========================================
// 采购计划决策支持系统 - 需求分析引擎
// ==========================================
// 职责: 预测记录 → 置信度 + 策略目标数量 + 解释文本
// 输入: ForecastRecord + 保守度策略
// 输出: DemandResult
// 红线: 置信度始终位于 [0.1, 0.95]
// ==========================================

use crate::domain::demand::{DemandResult, MAX_CONFIDENCE, MIN_CONFIDENCE};
use crate::domain::forecast::ForecastRecord;
use crate::domain::types::{ConfidenceTier, ConservatismLevel, TargetAdjustment};
use crate::engine::reasoner::{ExplanationFacts, ExplanationService};
use tracing::{debug, instrument};

/// 低置信度阈值（低于则额外放大）
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;
/// 高置信度阈值（高于则收缩）
const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;
const LOW_CONFIDENCE_FACTOR: f64 = 1.2;
const HIGH_CONFIDENCE_FACTOR: f64 = 0.9;

// ==========================================
// DemandAnalyzer - 需求分析引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct DemandAnalyzer {
    conservatism: ConservatismLevel,
}

impl DemandAnalyzer {
    pub fn new(conservatism: ConservatismLevel) -> Self {
        Self { conservatism }
    }

    pub fn conservatism(&self) -> ConservatismLevel {
        self.conservatism
    }

    /// 计算置信度
    ///
    /// 规则:
    /// 1) 显式置信度存在 → clamp 到 [0.1, 0.95]
    /// 2) 否则 → clamp(1 − 区间宽度 / max(yhat, 1), 0.1, 0.95)
    /// 3) 任何非有限中间值 → 0.1
    pub fn confidence(record: &ForecastRecord) -> f64 {
        let raw = match record.confidence {
            Some(c) if c.is_finite() => c,
            _ => 1.0 - record.interval_width() / record.yhat.max(1.0),
        };
        if raw.is_finite() {
            raw.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
        } else {
            MIN_CONFIDENCE
        }
    }

    /// 策略目标数量
    ///
    /// 乘数 = 保守度系数; 置信度 < 0.5 时 ×1.2, > 0.8 时 ×0.9;
    /// 结果 = ceil(yhat × 乘数),负值截断为 0
    pub fn target_quantity(record: &ForecastRecord, confidence: f64, policy: ConservatismLevel) -> u32 {
        let mut multiplier = policy.multiplier();
        if confidence < LOW_CONFIDENCE_THRESHOLD {
            multiplier *= LOW_CONFIDENCE_FACTOR;
        } else if confidence > HIGH_CONFIDENCE_THRESHOLD {
            multiplier *= HIGH_CONFIDENCE_FACTOR;
        }
        let target = (record.yhat * multiplier).ceil();
        if target.is_finite() && target > 0.0 {
            target.min(u32::MAX as f64) as u32
        } else {
            0
        }
    }

    /// 构造解释事实
    pub fn facts(&self, record: &ForecastRecord, confidence: f64, target_quantity: u32) -> ExplanationFacts {
        ExplanationFacts {
            item_id: record.item_id.clone(),
            name: record.display_name(),
            forecast: record.yhat,
            interval_low: record.yhat_lower,
            interval_high: record.yhat_upper,
            confidence,
            tier: ConfidenceTier::from_confidence(confidence),
            conservatism: self.conservatism,
            target_quantity,
            adjustment: TargetAdjustment::between(record.yhat, target_quantity),
        }
    }

    /// 分析单条预测记录
    #[instrument(skip(self, record, explainer), fields(item_id = %record.item_id))]
    pub async fn analyze(&self, record: &ForecastRecord, explainer: &ExplanationService) -> DemandResult {
        let confidence = Self::confidence(record);
        let target_quantity = Self::target_quantity(record, confidence, self.conservatism);
        let facts = self.facts(record, confidence, target_quantity);
        let explanation = explainer.explain(&facts).await;

        debug!(
            confidence,
            target_quantity,
            explanation_source = ?explanation.source,
            "需求分析完成"
        );

        DemandResult {
            item_id: record.item_id.clone(),
            name: facts.name,
            forecast: record.yhat,
            confidence,
            target_quantity,
            explanation: explanation.text,
        }
    }

    /// 批量分析（保持输入顺序）
    pub async fn analyze_all(
        &self,
        records: &[ForecastRecord],
        explainer: &ExplanationService,
    ) -> Vec<DemandResult> {
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            results.push(self.analyze(record, explainer).await);
        }
        results
    }
}

impl Default for DemandAnalyzer {
    fn default() -> Self {
        Self::new(ConservatismLevel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(yhat: f64, low: f64, high: f64, confidence: Option<f64>) -> ForecastRecord {
        ForecastRecord {
            item_id: "C01/W01/P001".to_string(),
            client_id: None,
            warehouse_id: None,
            product_id: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            yhat,
            yhat_lower: low,
            yhat_upper: high,
            confidence,
        }
    }

    #[test]
    fn test_explicit_confidence_is_clamped() {
        assert_eq!(DemandAnalyzer::confidence(&record(10.0, 9.0, 11.0, Some(0.99))), 0.95);
        assert_eq!(DemandAnalyzer::confidence(&record(10.0, 9.0, 11.0, Some(0.01))), 0.1);
        assert_eq!(DemandAnalyzer::confidence(&record(10.0, 9.0, 11.0, Some(0.6))), 0.6);
    }

    #[test]
    fn test_derived_confidence_from_interval() {
        // 1 - 4/10 = 0.6
        let c = DemandAnalyzer::confidence(&record(10.0, 8.0, 12.0, None));
        assert!((c - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_bounds_for_degenerate_forecasts() {
        let cases = [
            record(0.0, 0.0, 0.0, None),
            record(-5.0, -10.0, 3.0, None),
            record(0.0, -100.0, 100.0, None),
            record(10.0, 12.0, 8.0, None),
            record(10.0, f64::NAN, 8.0, None),
            record(10.0, 8.0, 12.0, Some(f64::NAN)),
            record(f64::INFINITY, 0.0, f64::INFINITY, None),
        ];
        for r in &cases {
            let c = DemandAnalyzer::confidence(r);
            assert!((0.1..=0.95).contains(&c), "confidence {} out of range for {:?}", c, r);
        }
    }

    #[test]
    fn test_target_quantity_policy_and_confidence() {
        let r = record(10.0, 8.0, 12.0, None);
        // medium, 中等置信度: ceil(10 × 1.15) = 12
        assert_eq!(DemandAnalyzer::target_quantity(&r, 0.6, ConservatismLevel::Medium), 12);
        // medium, 低置信度: ceil(10 × 1.15 × 1.2) = 14
        assert_eq!(DemandAnalyzer::target_quantity(&r, 0.3, ConservatismLevel::Medium), 14);
        // low, 高置信度: ceil(10 × 0.9) = 9
        assert_eq!(DemandAnalyzer::target_quantity(&r, 0.9, ConservatismLevel::Low), 9);
        // high, 中等置信度: ceil(10 × 1.3) = 13
        assert_eq!(DemandAnalyzer::target_quantity(&r, 0.6, ConservatismLevel::High), 13);
    }

    #[test]
    fn test_target_quantity_never_negative() {
        let r = record(-3.0, -4.0, -2.0, None);
        assert_eq!(DemandAnalyzer::target_quantity(&r, 0.6, ConservatismLevel::High), 0);
    }

    #[tokio::test]
    async fn test_analyze_uses_fallback_explainer() {
        let analyzer = DemandAnalyzer::new(ConservatismLevel::Low);
        let result = analyzer
            .analyze(&record(10.0, 9.5, 10.5, Some(0.9)), &ExplanationService::deterministic())
            .await;

        assert_eq!(result.name, "P001");
        assert_eq!(result.target_quantity, 9);
        assert_eq!(result.confidence_tier(), ConfidenceTier::High);
        assert_eq!(result.adjustment(), TargetAdjustment::Decreased);
        assert!(!result.explanation.is_empty());
    }
}
