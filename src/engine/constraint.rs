// ==========================================
// 采购计划决策支持系统 - 约束引擎
// ==========================================
// 职责: 顺序应用两个过滤器
//   1) 预算台账: 按调用方给定顺序贪心准入,超预算整项剔除 (不做部分削减)
//   2) 仓容截断: quantity' = min(quantity, capacity),重算明细成本,数量为 0 的剔除
// 说明: 贪心且依赖顺序; 仓容按单一仓库上下文查询一次
// ==========================================

use crate::config::context::PlanningContext;
use crate::domain::plan::{PlanItem, SkippedItem};
use tracing::{debug, info, instrument};

// ==========================================
// BudgetLedger - 预算台账
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetLedger {
    pub available: f64,
    pub committed: f64,
}

impl BudgetLedger {
    pub fn new(available: f64) -> Self {
        Self {
            available,
            committed: 0.0,
        }
    }

    /// committed + cost ≤ available
    pub fn can_admit(&self, cost: f64) -> bool {
        self.committed + cost <= self.available
    }

    pub fn admit(&mut self, cost: f64) {
        self.committed += cost;
    }

    pub fn remaining(&self) -> f64 {
        (self.available - self.committed).max(0.0)
    }
}

/// 约束结果
#[derive(Debug, Clone, Default)]
pub struct ConstraintOutcome {
    pub items: Vec<PlanItem>,
    pub rejected: Vec<SkippedItem>,
}

// ==========================================
// ConstraintEngine - 约束引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConstraintEngine {
    // 无状态引擎
}

impl ConstraintEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// 预算过滤（贪心,保持顺序）
    #[instrument(skip(self, items), fields(items_count = items.len()))]
    pub fn apply_budget(&self, items: Vec<PlanItem>, available_budget: f64) -> ConstraintOutcome {
        let mut ledger = BudgetLedger::new(available_budget);
        let mut outcome = ConstraintOutcome::default();

        for item in items {
            let cost = item.total_cost();
            if ledger.can_admit(cost) {
                ledger.admit(cost);
                outcome.items.push(item);
            } else {
                debug!(item_id = %item.item_id, cost, committed = ledger.committed, "超出预算，剔除");
                outcome.rejected.push(SkippedItem::new(
                    item.item_id.clone(),
                    format!(
                        "BUDGET_EXCEEDED: would exceed available budget ({} + {} > {})",
                        ledger.committed, cost, ledger.available
                    ),
                ));
            }
        }

        info!(
            accepted = outcome.items.len(),
            rejected = outcome.rejected.len(),
            committed = ledger.committed,
            remaining = ledger.remaining(),
            "预算过滤完成"
        );
        outcome
    }

    /// 仓容截断
    #[instrument(skip(self, items), fields(items_count = items.len()))]
    pub fn apply_capacity(&self, items: Vec<PlanItem>, capacity: u32) -> ConstraintOutcome {
        let mut outcome = ConstraintOutcome::default();

        for mut item in items {
            let clamped = item.quantity().min(capacity);
            if clamped != item.quantity() {
                debug!(item_id = %item.item_id, from = item.quantity(), to = clamped, "按仓容截断");
            }
            item.set_quantity(clamped);

            if clamped == 0 {
                outcome.rejected.push(SkippedItem::new(
                    item.item_id.clone(),
                    format!("ZERO_QUANTITY: quantity is 0 after capacity clamp (capacity={})", capacity),
                ));
            } else {
                outcome.items.push(item);
            }
        }

        info!(
            accepted = outcome.items.len(),
            rejected = outcome.rejected.len(),
            capacity,
            "仓容过滤完成"
        );
        outcome
    }

    /// 预算 → 仓容 顺序应用
    pub fn apply(&self, items: Vec<PlanItem>, ctx: &PlanningContext) -> ConstraintOutcome {
        let budget = self.apply_budget(items, ctx.available_budget());
        let capacity = self.apply_capacity(budget.items, ctx.capacity());

        let mut rejected = budget.rejected;
        rejected.extend(capacity.rejected);
        ConstraintOutcome {
            items: capacity.items,
            rejected,
        }
    }
}
