// ==========================================
// 采购计划决策支持系统 - 人工复核门控
// ==========================================
// 规则: 任一明细 quantity × holding_cost > quantity × shortage_cost 即需人工复核
// 说明: 无成本条目的明细永不触发
// ==========================================

use crate::domain::cost::CostTable;
use crate::domain::plan::Plan;
use serde::Serialize;

/// 触发复核的明细
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewTrigger {
    pub item_id: String,
    pub holding_risk: f64,
    pub shortage_risk: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewGate;

impl ReviewGate {
    pub fn new() -> Self {
        Self
    }

    /// 返回所有触发复核的明细（空 = 无需复核）
    pub fn triggers(&self, plan: &Plan, costs: &CostTable) -> Vec<ReviewTrigger> {
        plan.items()
            .iter()
            .filter_map(|item| {
                let cost = costs.for_item(&item.item_id)?;
                if cost.holding_risk_exceeds_shortage(item.quantity()) {
                    let q = item.quantity() as f64;
                    Some(ReviewTrigger {
                        item_id: item.item_id.clone(),
                        holding_risk: q * cost.holding_cost,
                        shortage_risk: q * cost.shortage_cost,
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn requires_review(&self, plan: &Plan, costs: &CostTable) -> bool {
        !self.triggers(plan, costs).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cost::CostEntry;
    use crate::domain::plan::PlanItem;

    #[test]
    fn test_holding_risk_above_shortage_triggers() {
        let mut costs = CostTable::new();
        costs.insert("P1", CostEntry::new(5.0, 3.0));
        let plan = Plan::new(vec![PlanItem::new("C/W/P1", "P1", 10, 13.0)], "");

        let triggers = ReviewGate::new().triggers(&plan, &costs);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].holding_risk, 50.0);
        assert_eq!(triggers[0].shortage_risk, 30.0);
    }

    #[test]
    fn test_shortage_dominant_does_not_trigger() {
        let mut costs = CostTable::new();
        costs.insert("P1", CostEntry::new(2.0, 10.0));
        let plan = Plan::new(vec![PlanItem::new("C/W/P1", "P1", 10, 20.0)], "");
        assert!(!ReviewGate::new().requires_review(&plan, &costs));
    }

    #[test]
    fn test_missing_cost_never_triggers() {
        let costs = CostTable::new();
        let plan = Plan::new(vec![PlanItem::new("C/W/P9", "P9", 10, 20.0)], "");
        assert!(!ReviewGate::new().requires_review(&plan, &costs));
    }
}
