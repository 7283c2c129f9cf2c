// ==========================================
// 采购计划决策支持系统 - 采购计划领域模型
// ==========================================
// 红线: PlanItem.total_cost == quantity × unit_cost (每次变更后成立)
// 红线: Plan 汇总值只由明细推导,不独立存储
// ==========================================

use serde::Serialize;

// ==========================================
// PlanItem - 采购明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    pub item_id: String,  // 复合标识
    pub name: String,     // 展示名称
    quantity: u32,        // 采购数量
    pub unit_cost: f64,   // 单位采购成本
    total_cost: f64,      // 明细成本 (推导值)
}

impl PlanItem {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>, quantity: u32, unit_cost: f64) -> Self {
        Self {
            item_id: item_id.into(),
            name: name.into(),
            quantity,
            unit_cost,
            total_cost: quantity as f64 * unit_cost,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// 修改数量并同步重算明细成本
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total_cost = quantity as f64 * self.unit_cost;
    }
}

// ==========================================
// Plan - 采购计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    items: Vec<PlanItem>,
    total_cost: f64,
    total_units: u64,
    pub rationale: String,
}

impl Plan {
    pub fn new(items: Vec<PlanItem>, rationale: impl Into<String>) -> Self {
        let mut plan = Self {
            items,
            total_cost: 0.0,
            total_units: 0,
            rationale: rationale.into(),
        };
        plan.recompute_totals();
        plan
    }

    pub fn empty(rationale: impl Into<String>) -> Self {
        Self::new(Vec::new(), rationale)
    }

    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 替换全部明细
    pub fn replace_items(&mut self, items: Vec<PlanItem>) {
        self.items = items;
        self.recompute_totals();
    }

    fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.total_cost = item.quantity as f64 * item.unit_cost;
        }
        self.total_cost = self.items.iter().map(|i| i.total_cost).sum();
        self.total_units = self.items.iter().map(|i| i.quantity as u64).sum();
    }
}

// ==========================================
// SkippedItem - 被剔除的明细
// ==========================================
// reason 采用 CODE: detail 格式 (与日志一致)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub item_id: String,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(item_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            reason: reason.into(),
        }
    }

    /// 原因代码 (冒号前部分)
    pub fn code(&self) -> &str {
        self.reason.split(':').next().unwrap_or("").trim()
    }
}
