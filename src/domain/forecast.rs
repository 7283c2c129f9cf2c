// ==========================================
// 采购计划决策支持系统 - 需求预测领域模型
// ==========================================
// 职责: 预测记录 (一条记录对应一个 item + 日期)
// 红线: 加载后不可变; NaN 数值由导入层过滤,不会进入核心
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 复合标识分隔符 (client/warehouse/product)
pub const ITEM_ID_SEPARATOR: char = '/';

// ==========================================
// ItemId 辅助函数
// ==========================================

/// 取复合标识的最后一段作为产品ID（成本表主键）
///
/// # 示例
/// - "C01/W01/P001" → "P001"
/// - "P001" → "P001"
pub fn product_key(item_id: &str) -> &str {
    item_id
        .rsplit(ITEM_ID_SEPARATOR)
        .next()
        .unwrap_or(item_id)
        .trim()
}

/// 取复合标识中的仓库段（三段式标识的中间段）
pub fn warehouse_key(item_id: &str) -> Option<&str> {
    let parts: Vec<&str> = item_id.split(ITEM_ID_SEPARATOR).collect();
    if parts.len() >= 3 {
        Some(parts[parts.len() - 2].trim())
    } else {
        None
    }
}

// ==========================================
// ForecastRecord - 需求预测记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub item_id: String,              // 复合标识 client/warehouse/product
    pub client_id: Option<String>,    // 客户
    pub warehouse_id: Option<String>, // 仓库
    pub product_id: Option<String>,   // 产品
    pub date: NaiveDate,              // 观测日期
    pub yhat: f64,                    // 预测值
    pub yhat_lower: f64,              // 置信区间下限
    pub yhat_upper: f64,              // 置信区间上限
    pub confidence: Option<f64>,      // 直接提供的置信度评分
}

impl ForecastRecord {
    /// 置信区间宽度
    pub fn interval_width(&self) -> f64 {
        self.yhat_upper - self.yhat_lower
    }

    /// 成本表主键（item_id 最后一段，product_id 列只作描述）
    pub fn product_key(&self) -> &str {
        product_key(&self.item_id)
    }

    /// 仓库标识（优先使用显式 warehouse_id）
    pub fn warehouse_key(&self) -> Option<&str> {
        match self.warehouse_id.as_deref() {
            Some(w) if !w.trim().is_empty() => Some(w.trim()),
            _ => warehouse_key(&self.item_id),
        }
    }

    /// 展示名称（产品段）
    pub fn display_name(&self) -> String {
        self.product_key().to_string()
    }
}

/// 选取参与规划的预测记录
///
/// - 指定 `plan_date` 时只保留该日期的记录
/// - 否则每个 item 取日期最新的一条
/// - 结果按 item 首次出现的顺序排列 (预算准入依赖该顺序)
pub fn select_planning_records(
    records: &[ForecastRecord],
    plan_date: Option<NaiveDate>,
) -> Vec<ForecastRecord> {
    let mut order: Vec<&str> = Vec::new();
    let mut latest: std::collections::HashMap<&str, &ForecastRecord> = std::collections::HashMap::new();

    for record in records {
        if let Some(d) = plan_date {
            if record.date != d {
                continue;
            }
        }
        match latest.get(record.item_id.as_str()) {
            Some(existing) if existing.date > record.date => {}
            Some(_) => {
                latest.insert(record.item_id.as_str(), record);
            }
            None => {
                order.push(record.item_id.as_str());
                latest.insert(record.item_id.as_str(), record);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| latest.get(id).map(|r| (*r).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(item_id: &str) -> ForecastRecord {
        ForecastRecord {
            item_id: item_id.to_string(),
            client_id: None,
            warehouse_id: None,
            product_id: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            yhat: 10.0,
            yhat_lower: 8.0,
            yhat_upper: 12.0,
            confidence: None,
        }
    }

    #[test]
    fn test_product_key_from_composite_id() {
        assert_eq!(product_key("C01/W01/P001"), "P001");
        assert_eq!(product_key("P001"), "P001");
        assert_eq!(warehouse_key("C01/W01/P001"), Some("W01"));
        assert_eq!(warehouse_key("P001"), None);
    }

    #[test]
    fn test_cost_key_ignores_product_column() {
        let mut r = record("C01/W01/P001");
        assert_eq!(r.product_key(), "P001");
        assert_eq!(r.warehouse_key(), Some("W01"));

        r.product_id = Some("P999".to_string());
        r.warehouse_id = Some("W09".to_string());
        assert_eq!(r.product_key(), "P001");
        assert_eq!(r.warehouse_key(), Some("W09"));
        assert_eq!(r.interval_width(), 4.0);
    }

    #[test]
    fn test_select_latest_per_item_keeps_first_seen_order() {
        let mut a1 = record("C/W/A");
        let mut b1 = record("C/W/B");
        let mut a2 = record("C/W/A");
        a1.date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        b1.date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        a2.date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        a2.yhat = 99.0;

        let selected = select_planning_records(&[a1.clone(), b1.clone(), a2.clone()], None);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].item_id, "C/W/A");
        assert_eq!(selected[0].yhat, 99.0);
        assert_eq!(selected[1].item_id, "C/W/B");

        let on_date = select_planning_records(&[a1, b1, a2], NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(on_date.len(), 2);
        assert_eq!(on_date[0].yhat, 10.0);
    }
}
