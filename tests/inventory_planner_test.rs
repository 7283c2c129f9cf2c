// ==========================================
// InventoryPlanner (报童模型) 集成测试
// ==========================================
// 测试目标: 最优订货量计算与计划草案生成
// 覆盖范围: 参考算例、退化临界比率、缺失成本、非负截断
// ==========================================

mod helpers;

use helpers::test_data_builder::{cost_table, ForecastBuilder};
use procurement_planner::engine::{quantile, DemandAnalyzer, ExplanationService, InventoryPlanner, NewsvendorParams, PlanningError};

fn planner() -> InventoryPlanner {
    InventoryPlanner::new(NewsvendorParams::default())
}

#[test]
fn test_reference_example_rounds_up_to_three() {
    let planner = planner();
    assert_eq!(planner.purchasing_price(5.0), 15.0);
    assert!((planner.critical_ratio(15.0, 1.0) - 14.0 / 15.0).abs() < 1e-12);
    assert!((planner.std_dev(1.6, 2.4) - 0.8 / 3.92).abs() < 1e-12);
    assert!((quantile(14.0 / 15.0) - 1.50).abs() < 0.01);

    assert_eq!(planner.optimal_quantity("ref", 2.0, 1.6, 2.4, 1.0, 5.0), Ok(3));
}

#[test]
fn test_holding_cost_at_or_above_price_is_flagged() {
    let err = planner().optimal_quantity("x", 10.0, 8.0, 12.0, 15.0, 5.0).unwrap_err();
    assert_eq!(err.code(), "DEGENERATE_CRITICAL_RATIO");
    assert!(matches!(err, PlanningError::DegenerateCriticalRatio { critical_ratio, .. } if critical_ratio == 0.0));

    // holding = 0, salvage = 0 → CR = 1
    let err = planner().optimal_quantity("y", 10.0, 8.0, 12.0, 0.0, 5.0).unwrap_err();
    assert_eq!(err.code(), "DEGENERATE_CRITICAL_RATIO");
}

#[test]
fn test_negative_demand_clamped_to_zero() {
    assert_eq!(planner().optimal_quantity("neg", -50.0, -51.0, -49.0, 1.0, 5.0), Ok(0));
}

#[test]
fn test_zero_width_interval_orders_mean() {
    assert_eq!(planner().optimal_quantity("flat", 7.0, 7.0, 7.0, 1.0, 5.0), Ok(7));
}

#[tokio::test]
async fn test_plan_skips_missing_cost_and_keeps_order() {
    let records = vec![
        ForecastBuilder::new("P9").build(),
        ForecastBuilder::new("P1").yhat(2.0).interval(1.6, 2.4).build(),
        ForecastBuilder::new("P2").build(),
    ];
    let costs = cost_table(&[("P1", 1.0, 5.0), ("P2", 1.0, 5.0)]);
    let demand = DemandAnalyzer::default()
        .analyze_all(&records, &ExplanationService::deterministic())
        .await;

    let draft = planner().plan(&records, &demand, &costs);

    let ids: Vec<&str> = draft.items.iter().map(|i| i.item_id.as_str()).collect();
    assert_eq!(ids, vec!["C01/W01/P1", "C01/W01/P2"]);
    assert_eq!(draft.items[0].quantity(), 3);
    assert_eq!(draft.items[0].unit_cost, 15.0);
    assert_eq!(draft.skipped.len(), 1);
    assert_eq!(draft.skipped[0].code(), "NO_COST_ENTRY");
}
