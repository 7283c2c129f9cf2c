// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use procurement_planner::config::{PlannerConfig, PlanningContext};
use procurement_planner::domain::ledger::{BudgetHistory, BudgetRecord, CapacityHistory, CapacityRecord};
use procurement_planner::domain::{CostEntry, CostTable, ForecastRecord};
use std::fs;
use std::path::Path;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==========================================
// ForecastRecord 构建器
// ==========================================

pub struct ForecastBuilder {
    client: String,
    warehouse: String,
    product: String,
    product_column: Option<String>,
    date: NaiveDate,
    yhat: f64,
    yhat_lower: Option<f64>,
    yhat_upper: Option<f64>,
    confidence: Option<f64>,
}

impl ForecastBuilder {
    pub fn new(product: &str) -> Self {
        Self {
            client: "C01".to_string(),
            warehouse: "W01".to_string(),
            product: product.to_string(),
            product_column: None,
            date: date(2026, 3, 1),
            yhat: 20.0,
            yhat_lower: None,
            yhat_upper: None,
            confidence: None,
        }
    }

    pub fn warehouse(mut self, warehouse: &str) -> Self {
        self.warehouse = warehouse.to_string();
        self
    }

    /// product_id 列与 item_id 最后一段不一致
    pub fn product_column(mut self, product_id: &str) -> Self {
        self.product_column = Some(product_id.to_string());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn yhat(mut self, yhat: f64) -> Self {
        self.yhat = yhat;
        self
    }

    pub fn interval(mut self, low: f64, high: f64) -> Self {
        self.yhat_lower = Some(low);
        self.yhat_upper = Some(high);
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn build(self) -> ForecastRecord {
        ForecastRecord {
            item_id: format!("{}/{}/{}", self.client, self.warehouse, self.product),
            client_id: Some(self.client),
            warehouse_id: Some(self.warehouse),
            product_id: Some(self.product_column.unwrap_or(self.product)),
            date: self.date,
            yhat: self.yhat,
            yhat_lower: self.yhat_lower.unwrap_or(self.yhat * 0.8),
            yhat_upper: self.yhat_upper.unwrap_or(self.yhat * 1.2),
            confidence: self.confidence,
        }
    }
}

// ==========================================
// 成本表 / 上下文
// ==========================================

/// (product_id, holding_cost, shortage_cost)
pub fn cost_table(entries: &[(&str, f64, f64)]) -> CostTable {
    let mut costs = CostTable::new();
    for (product, holding, shortage) in entries {
        costs.insert(*product, CostEntry::new(*holding, *shortage));
    }
    costs
}

/// 预算 / 仓容为 None 时走回退常量
pub fn context_with(
    costs: CostTable,
    budget: Option<f64>,
    capacity: Option<u32>,
    forecasts: &[ForecastRecord],
) -> PlanningContext {
    let budgets = BudgetHistory::new(
        budget
            .map(|b| vec![BudgetRecord { date: date(2026, 3, 1), budget: b }])
            .unwrap_or_default(),
    );
    let capacities = CapacityHistory::new(
        capacity
            .map(|c| {
                vec![CapacityRecord {
                    date: date(2026, 3, 1),
                    warehouse_id: "W01".to_string(),
                    capacity: c,
                }]
            })
            .unwrap_or_default(),
    );
    PlanningContext::new(PlannerConfig::default(), costs, budgets, capacities, forecasts)
}

// ==========================================
// CSV 数据目录
// ==========================================

pub fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// 写入一套最小可用数据 (P1 缺货主导, P2 持有主导, P3 数值无效)
pub fn write_sample_dataset(dir: &Path) {
    write_file(
        dir,
        "forecasts.csv",
        "item_id,date,yhat,yhat_lower,yhat_upper,confidence\n\
         C01/W01/P1,2026-02-28,18,15,21,0.8\n\
         C01/W01/P1,2026-03-01,20,16,24,0.8\n\
         C01/W01/P2,2026-03-01,10,8,12,0.6\n\
         C01/W01/P3,2026-03-01,nan,8,12,0.6\n",
    );
    write_file(
        dir,
        "costs.csv",
        "product_id,holding_cost,shortage_cost\n\
         P1,1,5\n\
         P2,5,3\n",
    );
    write_file(dir, "budget.csv", "date,budget\n2026-02-01,500\n2026-03-01,5000\n");
    write_file(dir, "capacity.csv", "date,warehouse_id,capacity\n2026-03-01,W01,800\n");
}
