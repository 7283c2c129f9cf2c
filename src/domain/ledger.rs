// ==========================================
// 采购计划决策支持系统 - 预算 / 仓容历史
// ==========================================
// 职责: 按日期索引的预算与仓容标量
// 规则: 当前值 = 日期最新的一条; 缺失时使用回退常量
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 预算缺失时的回退值
pub const DEFAULT_FALLBACK_BUDGET: f64 = 10_000.0;

/// 仓容缺失时的回退值
pub const DEFAULT_FALLBACK_CAPACITY: u32 = 1_000;

// ==========================================
// BudgetRecord - 预算记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub date: NaiveDate,
    pub budget: f64,
}

// ==========================================
// CapacityRecord - 仓容记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityRecord {
    pub date: NaiveDate,
    pub warehouse_id: String,
    pub capacity: u32,
}

// ==========================================
// BudgetHistory - 预算历史快照
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetHistory {
    records: Vec<BudgetRecord>,
}

impl BudgetHistory {
    pub fn new(records: Vec<BudgetRecord>) -> Self {
        Self { records }
    }

    /// 日期最新的预算（同日多条时取最后出现的一条）
    pub fn latest(&self) -> Option<&BudgetRecord> {
        self.records
            .iter()
            .fold(None, |acc: Option<&BudgetRecord>, r| match acc {
                Some(best) if best.date > r.date => Some(best),
                _ => Some(r),
            })
    }

    /// 当前可用预算（缺失时回退）
    pub fn current_or(&self, fallback: f64) -> f64 {
        self.latest().map(|r| r.budget).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ==========================================
// CapacityHistory - 仓容历史快照
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityHistory {
    records: Vec<CapacityRecord>,
}

impl CapacityHistory {
    pub fn new(records: Vec<CapacityRecord>) -> Self {
        Self { records }
    }

    /// 指定仓库日期最新的仓容
    pub fn latest_for(&self, warehouse_id: &str) -> Option<&CapacityRecord> {
        self.records
            .iter()
            .filter(|r| r.warehouse_id == warehouse_id)
            .fold(None, |acc: Option<&CapacityRecord>, r| match acc {
                Some(best) if best.date > r.date => Some(best),
                _ => Some(r),
            })
    }

    /// 当前仓容（仓库未知或无记录时回退）
    pub fn current_or(&self, warehouse_id: Option<&str>, fallback: u32) -> u32 {
        warehouse_id
            .and_then(|w| self.latest_for(w))
            .map(|r| r.capacity)
            .unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
