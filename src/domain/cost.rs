// ==========================================
// 采购计划决策支持系统 - 成本表领域模型
// ==========================================
// 职责: 单品持有成本 / 缺货成本
// 主键: 裸产品ID (复合标识的最后一段)
// ==========================================

use crate::domain::forecast::product_key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CostEntry - 单品成本
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub holding_cost: f64,  // 单位持有成本
    pub shortage_cost: f64, // 单位缺货成本
}

impl CostEntry {
    pub fn new(holding_cost: f64, shortage_cost: f64) -> Self {
        Self {
            holding_cost,
            shortage_cost,
        }
    }

    /// 持有风险是否高于缺货风险（按数量加权）
    pub fn holding_risk_exceeds_shortage(&self, quantity: u32) -> bool {
        let q = quantity as f64;
        q * self.holding_cost > q * self.shortage_cost
    }
}

// ==========================================
// CostTable - 成本表快照
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostTable {
    entries: HashMap<String, CostEntry>,
}

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product_id: impl Into<String>, entry: CostEntry) {
        self.entries.insert(product_id.into(), entry);
    }

    /// 按裸产品ID查询
    pub fn get(&self, product_id: &str) -> Option<&CostEntry> {
        self.entries.get(product_id.trim())
    }

    /// 按复合 item 标识查询（取最后一段）
    pub fn for_item(&self, item_id: &str) -> Option<&CostEntry> {
        self.get(product_key(item_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, CostEntry)> for CostTable {
    fn from_iter<T: IntoIterator<Item = (String, CostEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
