// ==========================================
// 采购计划决策支持系统 - 人工反馈调和引擎
// ==========================================
// 职责: 自由文本反馈 → 规则化数量调整 → 重算计划汇总
// 规则 (顺序叠加,后一条读取前一条修改后的数量):
//   1) 预算顾虑: budget / cost / expensive → ×0.85 (含 very → ×0.7)
//   2) 风险顾虑: risk / conservative / safe → ×0.9 (含 very → ×0.75)
//   3) 点名明细: 文本中出现名称或ID → ×0.7
//   4) 兜底: 以上均未改变任何数量 → 全部 ×0.95
// 数量: max(1, floor(quantity × factor))
// 说明: 非幂等,同一反馈重复提交会再次削减
// ==========================================

use crate::domain::plan::{Plan, PlanItem};
use crate::i18n::t_with_args;
use serde::Serialize;
use std::fmt;
use tracing::{info, instrument};

const BUDGET_KEYWORDS: [&str; 3] = ["budget", "cost", "expensive"];
const RISK_KEYWORDS: [&str; 3] = ["risk", "conservative", "safe"];
const INTENSIFIER: &str = "very";

const BUDGET_FACTOR: f64 = 0.85;
const BUDGET_FACTOR_STRONG: f64 = 0.7;
const RISK_FACTOR: f64 = 0.9;
const RISK_FACTOR_STRONG: f64 = 0.75;
const NAMED_ITEM_FACTOR: f64 = 0.7;
const FALLBACK_FACTOR: f64 = 0.95;

// 浮点误差 (如 0.85 × 20 = 16.999…)
const FLOOR_EPSILON: f64 = 1e-9;

// ==========================================
// FeedbackRule - 已应用的规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FeedbackRule {
    BudgetConcern { factor: f64 },
    RiskConcern { factor: f64 },
    NamedItem { item_id: String, factor: f64 },
    Fallback { factor: f64 },
}

impl fmt::Display for FeedbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackRule::BudgetConcern { factor } => write!(f, "BUDGET_CONCERN(×{})", factor),
            FeedbackRule::RiskConcern { factor } => write!(f, "RISK_CONCERN(×{})", factor),
            FeedbackRule::NamedItem { item_id, factor } => write!(f, "NAMED_ITEM({}, ×{})", item_id, factor),
            FeedbackRule::Fallback { factor } => write!(f, "FALLBACK(×{})", factor),
        }
    }
}

/// 调和结果
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub plan: Plan,
    pub applied_rules: Vec<FeedbackRule>,
}

// ==========================================
// FeedbackReconciler - 反馈调和引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct FeedbackReconciler;

impl FeedbackReconciler {
    pub fn new() -> Self {
        Self
    }

    /// 按系数削减数量: max(1, floor(quantity × factor))
    pub fn reduce(quantity: u32, factor: f64) -> u32 {
        let reduced = (quantity as f64 * factor + FLOOR_EPSILON).floor();
        (reduced as u32).max(1)
    }

    /// 调和一次人工反馈
    #[instrument(skip(self, plan), fields(items = plan.items().len()))]
    pub fn reconcile(&self, plan: &Plan, feedback: &str) -> Reconciliation {
        let text = feedback.to_lowercase();
        let very = text.contains(INTENSIFIER);
        let original: Vec<u32> = plan.items().iter().map(|i| i.quantity()).collect();
        let mut items: Vec<PlanItem> = plan.items().to_vec();
        let mut applied_rules = Vec::new();

        // 1) 预算顾虑
        if BUDGET_KEYWORDS.iter().any(|k| text.contains(k)) {
            let factor = if very { BUDGET_FACTOR_STRONG } else { BUDGET_FACTOR };
            scale_all(&mut items, factor);
            applied_rules.push(FeedbackRule::BudgetConcern { factor });
        }

        // 2) 风险顾虑
        if RISK_KEYWORDS.iter().any(|k| text.contains(k)) {
            let factor = if very { RISK_FACTOR_STRONG } else { RISK_FACTOR };
            scale_all(&mut items, factor);
            applied_rules.push(FeedbackRule::RiskConcern { factor });
        }

        // 3) 点名明细
        for item in items.iter_mut() {
            if mentions(&text, item) {
                let reduced = Self::reduce(item.quantity(), NAMED_ITEM_FACTOR);
                item.set_quantity(reduced);
                applied_rules.push(FeedbackRule::NamedItem {
                    item_id: item.item_id.clone(),
                    factor: NAMED_ITEM_FACTOR,
                });
            }
        }

        // 4) 兜底
        let changed = items
            .iter()
            .zip(original.iter())
            .any(|(item, before)| item.quantity() != *before);
        if !changed {
            scale_all(&mut items, FALLBACK_FACTOR);
            applied_rules.push(FeedbackRule::Fallback {
                factor: FALLBACK_FACTOR,
            });
        }

        let mut revised = plan.clone();
        revised.replace_items(items);
        revised.rationale = t_with_args(
            "feedback.rationale",
            &[
                ("old_cost", &format!("{:.2}", plan.total_cost())),
                ("new_cost", &format!("{:.2}", revised.total_cost())),
                ("old_units", &plan.total_units().to_string()),
                ("new_units", &revised.total_units().to_string()),
            ],
        );

        info!(
            rules = ?applied_rules.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
            old_cost = plan.total_cost(),
            new_cost = revised.total_cost(),
            old_units = plan.total_units(),
            new_units = revised.total_units(),
            "人工反馈调和完成"
        );

        Reconciliation {
            plan: revised,
            applied_rules,
        }
    }
}

fn scale_all(items: &mut [PlanItem], factor: f64) {
    for item in items.iter_mut() {
        let reduced = FeedbackReconciler::reduce(item.quantity(), factor);
        item.set_quantity(reduced);
    }
}

/// 文本（已小写）中是否出现明细名称或ID
fn mentions(lowercase_text: &str, item: &PlanItem) -> bool {
    let name = item.name.trim().to_lowercase();
    let id = item.item_id.trim().to_lowercase();
    (!name.is_empty() && lowercase_text.contains(&name)) || (!id.is_empty() && lowercase_text.contains(&id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(quantities: &[(&str, u32)]) -> Plan {
        Plan::new(
            quantities
                .iter()
                .map(|(name, q)| PlanItem::new(format!("C01/W01/{}", name), *name, *q, 2.0))
                .collect(),
            "initial",
        )
    }

    fn quantities(plan: &Plan) -> Vec<u32> {
        plan.items().iter().map(|i| i.quantity()).collect()
    }

    #[test]
    fn test_reduce_floor_and_minimum() {
        assert_eq!(FeedbackReconciler::reduce(100, 0.85), 85);
        assert_eq!(FeedbackReconciler::reduce(20, 0.85), 17);
        assert_eq!(FeedbackReconciler::reduce(1, 0.7), 1);
        assert_eq!(FeedbackReconciler::reduce(0, 0.7), 1);
    }

    #[test]
    fn test_budget_rule() {
        let r = FeedbackReconciler::new().reconcile(&plan(&[("SKU1", 100), ("SKU2", 40)]), "Too much COST here");
        assert_eq!(quantities(&r.plan), vec![85, 34]);
        assert_eq!(r.applied_rules, vec![FeedbackRule::BudgetConcern { factor: 0.85 }]);
        assert_eq!(r.plan.total_cost(), (85 + 34) as f64 * 2.0);
        assert_eq!(r.plan.total_units(), 119);
    }

    #[test]
    fn test_very_strengthens_factor() {
        let r = FeedbackReconciler::new().reconcile(&plan(&[("SKU1", 100)]), "very expensive");
        assert_eq!(quantities(&r.plan), vec![70]);
    }

    #[test]
    fn test_rules_compound() {
        // SKU1: 100 → 85 (budget) → 76 (risk) → 53 (named)
        // SKU2: 10 → 8 → 7
        let r = FeedbackReconciler::new().reconcile(
            &plan(&[("SKU1", 100), ("SKU2", 10)]),
            "budget is tight, be safe, and cut sku1",
        );
        assert_eq!(quantities(&r.plan), vec![53, 7]);
        assert_eq!(r.applied_rules.len(), 3);
    }

    #[test]
    fn test_named_item_only() {
        let r = FeedbackReconciler::new().reconcile(&plan(&[("SKU1", 10), ("SKU2", 10)]), "drop SKU2 a bit");
        assert_eq!(quantities(&r.plan), vec![10, 7]);
        assert!(matches!(r.applied_rules[0], FeedbackRule::NamedItem { .. }));
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let r = FeedbackReconciler::new().reconcile(&plan(&[("SKU1", 100), ("SKU2", 20)]), "looks odd");
        assert_eq!(quantities(&r.plan), vec![95, 19]);
        assert_eq!(r.applied_rules, vec![FeedbackRule::Fallback { factor: 0.95 }]);
    }

    #[test]
    fn test_fallback_when_rules_trigger_but_change_nothing() {
        let r = FeedbackReconciler::new().reconcile(&plan(&[("SKU1", 1)]), "cost");
        assert_eq!(quantities(&r.plan), vec![1]);
        assert_eq!(r.applied_rules.len(), 2);
        assert!(matches!(r.applied_rules[1], FeedbackRule::Fallback { .. }));
    }

    #[test]
    fn test_rationale_replaced_and_input_untouched() {
        let original = plan(&[("SKU1", 100)]);
        let r = FeedbackReconciler::new().reconcile(&original, "expensive");
        assert_ne!(r.plan.rationale, "initial");
        assert!(r.plan.rationale.contains("200.00"));
        assert!(r.plan.rationale.contains("170.00"));
        assert_eq!(original.items()[0].quantity(), 100);
    }
}
