// ==========================================
// CSV 导入集成测试
// ==========================================
// 测试目标: 数据目录 → Dataset → PlanningContext
// 覆盖范围: NaN 过滤、可选文件缺失回退、必需文件缺失
// ==========================================

mod helpers;

use helpers::test_data_builder::{date, write_file, write_sample_dataset};
use procurement_planner::config::{PlannerConfig, PlanningContext};
use procurement_planner::domain::{DEFAULT_FALLBACK_BUDGET, DEFAULT_FALLBACK_CAPACITY};
use procurement_planner::importer::{load_capacities, load_dataset, ImportError, BUDGET_FILE, CAPACITY_FILE};
use tempfile::TempDir;

#[test]
fn test_load_sample_dataset() {
    let dir = TempDir::new().unwrap();
    write_sample_dataset(dir.path());

    let dataset = load_dataset(dir.path()).unwrap();

    // P3 行 yhat = nan 被过滤
    assert_eq!(dataset.forecasts.len(), 3);
    assert!(dataset.forecasts.iter().all(|f| f.yhat.is_finite()));
    assert_eq!(dataset.costs.len(), 2);
    assert_eq!(dataset.budgets.latest().unwrap().budget, 5000.0);
    assert_eq!(dataset.budgets.latest().unwrap().date, date(2026, 3, 1));

    let ctx = PlanningContext::new(
        PlannerConfig::default(),
        dataset.costs,
        dataset.budgets,
        dataset.capacities,
        &dataset.forecasts,
    );
    assert_eq!(ctx.warehouse_id(), Some("W01"));
    assert_eq!(ctx.available_budget(), 5000.0);
    assert_eq!(ctx.capacity(), 800);
}

#[test]
fn test_missing_budget_and_capacity_fall_back() {
    let dir = TempDir::new().unwrap();
    write_sample_dataset(dir.path());
    std::fs::remove_file(dir.path().join(BUDGET_FILE)).unwrap();
    std::fs::remove_file(dir.path().join(CAPACITY_FILE)).unwrap();

    let dataset = load_dataset(dir.path()).unwrap();
    assert!(dataset.budgets.is_empty());
    assert!(dataset.capacities.is_empty());

    let ctx = PlanningContext::new(
        PlannerConfig::default(),
        dataset.costs,
        dataset.budgets,
        dataset.capacities,
        &dataset.forecasts,
    );
    assert_eq!(ctx.available_budget(), DEFAULT_FALLBACK_BUDGET);
    assert_eq!(ctx.capacity(), DEFAULT_FALLBACK_CAPACITY);
}

#[test]
fn test_missing_forecasts_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_dataset(dir.path()).unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));
}

#[test]
fn test_capacity_for_other_warehouse_ignored() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "capacity.csv",
        "date,warehouse_id,capacity\n2026-03-01,W01,800\n2026-03-05,W02,50\n2026-02-01,W01,900\n",
    );

    let capacities = load_capacities(&dir.path().join("capacity.csv")).unwrap();
    assert_eq!(capacities.len(), 3);
    assert_eq!(capacities.latest_for("W01").unwrap().capacity, 800);
    assert_eq!(capacities.latest_for("W02").unwrap().capacity, 50);
}

#[test]
fn test_bad_budget_date_reports_row() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "budget.csv", "date,budget\n2026-03-01,100\nyesterday,200\n");

    let err = procurement_planner::importer::load_budgets(&dir.path().join("budget.csv")).unwrap_err();
    assert!(matches!(err, ImportError::DateFormatError { row: 3, .. }));
}
