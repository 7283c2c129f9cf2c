// ==========================================
// 采购计划决策支持系统 - CSV 数据加载器
// ==========================================
// 职责: 四张输入表 → 不可变快照
//   forecasts.csv : item_id, date, yhat, yhat_lower, yhat_upper [, confidence, client_id, warehouse_id, product_id]
//   costs.csv     : product_id, holding_cost, shortage_cost
//   budget.csv    : date, budget
//   capacity.csv  : date, warehouse_id, capacity
// 红线: 预测数值为 NaN / 无法解析的行在此过滤,不进入核心
// ==========================================

use crate::domain::cost::{CostEntry, CostTable};
use crate::domain::forecast::{product_key, warehouse_key, ForecastRecord};
use crate::domain::ledger::{BudgetHistory, BudgetRecord, CapacityHistory, CapacityRecord};
use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const FORECASTS_FILE: &str = "forecasts.csv";
pub const COSTS_FILE: &str = "costs.csv";
pub const BUDGET_FILE: &str = "budget.csv";
pub const CAPACITY_FILE: &str = "capacity.csv";

// 列名 (含常见别名)
const COL_ITEM_ID: &[&str] = &["item_id", "item", "unique_id"];
const COL_DATE: &[&str] = &["date", "ds"];
const COL_YHAT: &[&str] = &["yhat", "forecast"];
const COL_YHAT_LOWER: &[&str] = &["yhat_lower", "ci_low"];
const COL_YHAT_UPPER: &[&str] = &["yhat_upper", "ci_high"];
const COL_CONFIDENCE: &[&str] = &["confidence", "confidence_score"];
const COL_CLIENT_ID: &[&str] = &["client_id"];
const COL_WAREHOUSE_ID: &[&str] = &["warehouse_id", "warehouse"];
const COL_PRODUCT_ID: &[&str] = &["product_id", "product"];
const COL_HOLDING_COST: &[&str] = &["holding_cost"];
const COL_SHORTAGE_COST: &[&str] = &["shortage_cost"];
const COL_BUDGET: &[&str] = &["budget"];
const COL_CAPACITY: &[&str] = &["capacity"];

// ==========================================
// Dataset - 一次运行的全部输入快照
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub forecasts: Vec<ForecastRecord>,
    pub costs: CostTable,
    pub budgets: BudgetHistory,
    pub capacities: CapacityHistory,
}

// ==========================================
// 原始表读取
// ==========================================

/// 行号从 2 开始 (第 1 行为表头)
struct RawTable {
    file: String,
    headers: Vec<String>,
    rows: Vec<(usize, HashMap<String, String>)>,
}

impl RawTable {
    fn require(&self, columns: &[&[&str]]) -> ImportResult<()> {
        for aliases in columns {
            if !aliases.iter().any(|a| self.headers.iter().any(|h| h == a)) {
                return Err(ImportError::MissingColumn {
                    file: self.file.clone(),
                    column: aliases[0].to_string(),
                });
            }
        }
        Ok(())
    }
}

fn read_csv(path: &Path) -> ImportResult<RawTable> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    if let Some(ext) = path.extension() {
        if !ext.eq_ignore_ascii_case("csv") {
            return Err(ImportError::UnsupportedFormat(ext.to_string_lossy().to_string()));
        }
    }

    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let mut row_map = HashMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if let Some(header) = headers.get(col_idx) {
                row_map.insert(header.clone(), value.trim().to_string());
            }
        }

        // 跳过完全空白的行
        if row_map.values().all(|v| v.is_empty()) {
            continue;
        }
        rows.push((idx + 2, row_map));
    }

    debug!(file = %path.display(), rows = rows.len(), "CSV 读取完成");
    Ok(RawTable {
        file: path.display().to_string(),
        headers,
        rows,
    })
}

// ==========================================
// 字段解析
// ==========================================

/// 按别名取非空字段
fn field<'a>(row: &'a HashMap<String, String>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|a| row.get(*a))
        .map(|v| v.as_str())
        .filter(|v| !v.is_empty())
}

fn required<'a>(row_no: usize, row: &'a HashMap<String, String>, aliases: &[&str]) -> ImportResult<&'a str> {
    field(row, aliases).ok_or_else(|| ImportError::PrimaryKeyMissing {
        row: row_no,
        field: aliases[0].to_string(),
    })
}

/// 日期: YYYY-MM-DD,允许带时间部分 (如 "2026-03-01 00:00:00")
fn parse_date(row_no: usize, field_name: &str, value: &str) -> ImportResult<NaiveDate> {
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| ImportError::DateFormatError {
        row: row_no,
        field: field_name.to_string(),
        value: value.to_string(),
    })
}

/// 有限浮点数; NaN / inf / 无法解析均报错
fn parse_finite(row_no: usize, field_name: &str, value: &str) -> ImportResult<f64> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(ImportError::TypeConversionError {
            row: row_no,
            field: field_name.to_string(),
            message: format!("数值非有限: {}", v),
        }),
        Err(e) => Err(ImportError::TypeConversionError {
            row: row_no,
            field: field_name.to_string(),
            message: format!("无法解析 '{}': {}", value, e),
        }),
    }
}

fn optional_string(row: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
    field(row, aliases).map(|v| v.to_string())
}

// ==========================================
// 公开加载函数
// ==========================================

/// 加载预测表; 数值字段缺失 / NaN / 无法解析的行被过滤
#[instrument]
pub fn load_forecasts(path: &Path) -> ImportResult<Vec<ForecastRecord>> {
    let table = read_csv(path)?;
    table.require(&[COL_ITEM_ID, COL_DATE, COL_YHAT, COL_YHAT_LOWER, COL_YHAT_UPPER])?;

    let mut records = Vec::with_capacity(table.rows.len());
    let mut filtered = 0usize;

    for (row_no, row) in &table.rows {
        let item_id = required(*row_no, row, COL_ITEM_ID)?.to_string();
        let date = parse_date(*row_no, COL_DATE[0], required(*row_no, row, COL_DATE)?)?;

        let numbers = [COL_YHAT, COL_YHAT_LOWER, COL_YHAT_UPPER]
            .iter()
            .map(|aliases| {
                field(row, aliases).and_then(|v| parse_finite(*row_no, aliases[0], v).ok())
            })
            .collect::<Option<Vec<f64>>>();
        let Some(numbers) = numbers else {
            debug!(row = row_no, item_id = %item_id, "预测数值无效，过滤该行");
            filtered += 1;
            continue;
        };

        let confidence = field(row, COL_CONFIDENCE).and_then(|v| v.parse::<f64>().ok().filter(|c| c.is_finite()));

        let product_id = optional_string(row, COL_PRODUCT_ID).or_else(|| Some(product_key(&item_id).to_string()));
        let warehouse_id =
            optional_string(row, COL_WAREHOUSE_ID).or_else(|| warehouse_key(&item_id).map(|w| w.to_string()));

        records.push(ForecastRecord {
            client_id: optional_string(row, COL_CLIENT_ID),
            warehouse_id,
            product_id,
            date,
            yhat: numbers[0],
            yhat_lower: numbers[1],
            yhat_upper: numbers[2],
            confidence,
            item_id,
        });
    }

    if filtered > 0 {
        warn!(file = %table.file, filtered, "过滤了数值无效的预测行");
    }
    info!(file = %table.file, loaded = records.len(), filtered, "预测表加载完成");
    Ok(records)
}

/// 加载成本表（product_id 重复时后者覆盖前者）
#[instrument]
pub fn load_costs(path: &Path) -> ImportResult<CostTable> {
    let table = read_csv(path)?;
    table.require(&[COL_PRODUCT_ID, COL_HOLDING_COST, COL_SHORTAGE_COST])?;

    let mut costs = CostTable::new();
    for (row_no, row) in &table.rows {
        let product_id = required(*row_no, row, COL_PRODUCT_ID)?;
        let holding = parse_finite(*row_no, COL_HOLDING_COST[0], required(*row_no, row, COL_HOLDING_COST)?)?;
        let shortage = parse_finite(*row_no, COL_SHORTAGE_COST[0], required(*row_no, row, COL_SHORTAGE_COST)?)?;
        costs.insert(product_id, CostEntry::new(holding, shortage));
    }

    info!(file = %table.file, entries = costs.len(), "成本表加载完成");
    Ok(costs)
}

#[instrument]
pub fn load_budgets(path: &Path) -> ImportResult<BudgetHistory> {
    let table = read_csv(path)?;
    table.require(&[COL_DATE, COL_BUDGET])?;

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_no, row) in &table.rows {
        let date = parse_date(*row_no, COL_DATE[0], required(*row_no, row, COL_DATE)?)?;
        let budget = parse_finite(*row_no, COL_BUDGET[0], required(*row_no, row, COL_BUDGET)?)?;
        records.push(BudgetRecord { date, budget });
    }

    info!(file = %table.file, records = records.len(), "预算表加载完成");
    Ok(BudgetHistory::new(records))
}

#[instrument]
pub fn load_capacities(path: &Path) -> ImportResult<CapacityHistory> {
    let table = read_csv(path)?;
    table.require(&[COL_DATE, COL_WAREHOUSE_ID, COL_CAPACITY])?;

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_no, row) in &table.rows {
        let date = parse_date(*row_no, COL_DATE[0], required(*row_no, row, COL_DATE)?)?;
        let warehouse_id = required(*row_no, row, COL_WAREHOUSE_ID)?.to_string();
        let raw = parse_finite(*row_no, COL_CAPACITY[0], required(*row_no, row, COL_CAPACITY)?)?;
        if raw < 0.0 || raw > u32::MAX as f64 {
            return Err(ImportError::TypeConversionError {
                row: *row_no,
                field: COL_CAPACITY[0].to_string(),
                message: format!("仓容超出范围: {}", raw),
            });
        }
        records.push(CapacityRecord {
            date,
            warehouse_id,
            capacity: raw.floor() as u32,
        });
    }

    info!(file = %table.file, records = records.len(), "仓容表加载完成");
    Ok(CapacityHistory::new(records))
}

/// 从目录加载约定文件名的全部输入
///
/// - forecasts.csv / costs.csv 必需
/// - budget.csv / capacity.csv 缺失时返回空历史 (后续使用回退常量)
#[instrument]
pub fn load_dataset(dir: &Path) -> ImportResult<Dataset> {
    let forecasts = load_forecasts(&dir.join(FORECASTS_FILE))?;
    let costs = load_costs(&dir.join(COSTS_FILE))?;

    let budget_path = dir.join(BUDGET_FILE);
    let budgets = if budget_path.exists() {
        load_budgets(&budget_path)?
    } else {
        warn!(path = %budget_path.display(), "预算表不存在，使用空历史");
        BudgetHistory::default()
    };

    let capacity_path = dir.join(CAPACITY_FILE);
    let capacities = if capacity_path.exists() {
        load_capacities(&capacity_path)?
    } else {
        warn!(path = %capacity_path.display(), "仓容表不存在，使用空历史");
        CapacityHistory::default()
    };

    Ok(Dataset {
        forecasts,
        costs,
        budgets,
        capacities,
    })
}
