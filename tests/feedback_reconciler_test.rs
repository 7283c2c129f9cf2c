// ==========================================
// FeedbackReconciler 集成测试
// ==========================================
// 测试目标: 人工反馈 → 数量调整 → 汇总重算
// 覆盖范围: 关键词规则、点名规则、兜底规则、非幂等性
// ==========================================

use procurement_planner::domain::{Plan, PlanItem};
use procurement_planner::engine::{FeedbackReconciler, FeedbackRule};

fn sample_plan() -> Plan {
    Plan::new(
        vec![
            PlanItem::new("C01/W01/SKU-A", "SKU-A", 100, 15.0),
            PlanItem::new("C01/W01/SKU-B", "SKU-B", 40, 13.0),
        ],
        "initial",
    )
}

fn quantities(plan: &Plan) -> Vec<u32> {
    plan.items().iter().map(|i| i.quantity()).collect()
}

#[test]
fn test_too_expensive_reduces_once_per_submission() {
    let reconciler = FeedbackReconciler::new();

    let first = reconciler.reconcile(&sample_plan(), "that's too expensive");
    assert_eq!(quantities(&first.plan), vec![85, 34]);
    assert_eq!(first.applied_rules, vec![FeedbackRule::BudgetConcern { factor: 0.85 }]);

    // 同一反馈再次提交会再次削减,不是空操作
    let second = reconciler.reconcile(&first.plan, "that's too expensive");
    assert_eq!(quantities(&second.plan), vec![72, 28]);
    assert_ne!(quantities(&second.plan), quantities(&first.plan));
}

#[test]
fn test_totals_recomputed_after_reconciliation() {
    let result = FeedbackReconciler::new().reconcile(&sample_plan(), "that's too expensive");
    let plan = &result.plan;

    assert_eq!(plan.total_units(), 85 + 34);
    assert!((plan.items()[0].total_cost() - 85.0 * 15.0).abs() < 1e-9);
    assert!((plan.total_cost() - (85.0 * 15.0 + 34.0 * 13.0)).abs() < 1e-9);
    assert_ne!(plan.rationale, "initial");
}

#[test]
fn test_very_risky_uses_strong_factor() {
    let result = FeedbackReconciler::new().reconcile(&sample_plan(), "This is VERY risky");
    assert_eq!(quantities(&result.plan), vec![75, 30]);
    assert_eq!(result.applied_rules, vec![FeedbackRule::RiskConcern { factor: 0.75 }]);
}

#[test]
fn test_named_item_by_id_case_insensitive() {
    let result = FeedbackReconciler::new().reconcile(&sample_plan(), "c01/w01/sku-b is overstocked");
    assert_eq!(quantities(&result.plan), vec![100, 28]);
}

#[test]
fn test_unrecognized_feedback_still_reduces() {
    let result = FeedbackReconciler::new().reconcile(&sample_plan(), "hmm");
    assert_eq!(quantities(&result.plan), vec![95, 38]);
    assert_eq!(result.applied_rules, vec![FeedbackRule::Fallback { factor: 0.95 }]);
}

#[test]
fn test_quantities_never_drop_below_one() {
    let plan = Plan::new(vec![PlanItem::new("C01/W01/X", "X", 1, 10.0)], "");
    let mut current = plan;
    for _ in 0..5 {
        current = FeedbackReconciler::new().reconcile(&current, "very expensive and very risky").plan;
    }
    assert_eq!(quantities(&current), vec![1]);
}
