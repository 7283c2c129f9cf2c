// ==========================================
// 采购计划决策支持系统 - 规划配置
// ==========================================
// 职责: 配置加载 (JSON 文件) + 环境变量覆写 + 校验
// 说明: 所有字段均有默认值,缺省文件时即可运行
// ==========================================

use crate::domain::ledger::{DEFAULT_FALLBACK_BUDGET, DEFAULT_FALLBACK_CAPACITY};
use crate::domain::types::ConservatismLevel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ==========================================
// 配置错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: path={path}, error={source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置校验失败: key={key}, reason={reason}")]
    Invalid { key: String, reason: String },
}

// ==========================================
// 配置键 (环境变量)
// ==========================================
pub mod config_keys {
    pub const ENV_PREFIX: &str = "PROCUREMENT_PLANNER_";

    // 回退常量
    pub const FALLBACK_BUDGET: &str = "PROCUREMENT_PLANNER_FALLBACK_BUDGET";
    pub const FALLBACK_CAPACITY: &str = "PROCUREMENT_PLANNER_FALLBACK_CAPACITY";

    // 报童模型
    pub const PRICE_MARKUP: &str = "PROCUREMENT_PLANNER_PRICE_MARKUP";
    pub const INTERVAL_Z: &str = "PROCUREMENT_PLANNER_INTERVAL_Z";

    // 策略
    pub const CONSERVATISM: &str = "PROCUREMENT_PLANNER_CONSERVATISM";
    pub const WAREHOUSE_ID: &str = "PROCUREMENT_PLANNER_WAREHOUSE_ID";
    pub const PLAN_DATE: &str = "PROCUREMENT_PLANNER_PLAN_DATE";
    pub const LOCALE: &str = "PROCUREMENT_PLANNER_LOCALE";

    // 解释服务
    pub const REASONER_ENABLED: &str = "PROCUREMENT_PLANNER_REASONER_ENABLED";
    pub const REASONER_ENDPOINT: &str = "PROCUREMENT_PLANNER_REASONER_ENDPOINT";
    pub const REASONER_MODEL: &str = "PROCUREMENT_PLANNER_REASONER_MODEL";
    pub const REASONER_TIMEOUT_SECS: &str = "PROCUREMENT_PLANNER_REASONER_TIMEOUT_SECS";
}

// ==========================================
// ReasonerConfig - 解释服务配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// 是否启用 LLM 解释（关闭时只使用确定性文本）
    pub enabled: bool,
    /// OpenAI 兼容 chat-completions 地址
    pub endpoint: String,
    pub model: String,
    /// API Key 所在的环境变量名（密钥本身不写入配置）
    pub api_key_env: String,
    /// 单次调用截止时间（秒）
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            max_tokens: 160,
        }
    }
}

// ==========================================
// PlannerConfig - 规划配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// 无预算历史时的可用预算
    pub fallback_budget: f64,
    /// 无仓容历史时的仓容
    pub fallback_capacity: u32,
    /// 采购价 = 缺货成本 + 加价
    pub price_markup: f64,
    /// 残值
    pub salvage_value: f64,
    /// 置信区间对应的 z 值 (95% → 1.96)
    pub interval_z: f64,
    /// 目标数量保守度
    pub conservatism: ConservatismLevel,
    /// 固定仓库上下文（None 时取首条预测的仓库）
    pub warehouse_id: Option<String>,
    /// 规划日期（None 时每个 item 取最新预测）
    pub plan_date: Option<NaiveDate>,
    /// 文本语言 (en / zh-CN)
    pub locale: String,
    pub reasoner: ReasonerConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            fallback_budget: DEFAULT_FALLBACK_BUDGET,
            fallback_capacity: DEFAULT_FALLBACK_CAPACITY,
            price_markup: 10.0,
            salvage_value: 0.0,
            interval_z: 1.96,
            conservatism: ConservatismLevel::Medium,
            warehouse_id: None,
            plan_date: None,
            locale: "en".to_string(),
            reasoner: ReasonerConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// 从 JSON 文件加载（缺失字段使用默认值）
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: PlannerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置: 文件（存在时）→ 环境变量覆写 → 校验
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            Some(p) => {
                tracing::warn!(path = %p.display(), "配置文件不存在，使用默认配置");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 使用环境变量覆写配置
    ///
    /// 格式错误的值会被忽略并记录 warn 日志。
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// 按键查询覆写值（便于测试注入）
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        use config_keys::*;

        if let Some(v) = parse_override::<f64>(&lookup, FALLBACK_BUDGET) {
            self.fallback_budget = v;
        }
        if let Some(v) = parse_override::<u32>(&lookup, FALLBACK_CAPACITY) {
            self.fallback_capacity = v;
        }
        if let Some(v) = parse_override::<f64>(&lookup, PRICE_MARKUP) {
            self.price_markup = v;
        }
        if let Some(v) = parse_override::<f64>(&lookup, INTERVAL_Z) {
            self.interval_z = v;
        }
        if let Some(raw) = lookup(CONSERVATISM) {
            match ConservatismLevel::parse(&raw) {
                Some(level) => self.conservatism = level,
                None => tracing::warn!(config_key = CONSERVATISM, raw_value = %raw, "保守度配置格式错误，保留原值"),
            }
        }
        if let Some(raw) = lookup(WAREHOUSE_ID) {
            let raw = raw.trim();
            self.warehouse_id = if raw.is_empty() { None } else { Some(raw.to_string()) };
        }
        if let Some(raw) = lookup(PLAN_DATE) {
            match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(d) => self.plan_date = Some(d),
                Err(_) => tracing::warn!(config_key = PLAN_DATE, raw_value = %raw, "规划日期格式错误，期望 YYYY-MM-DD"),
            }
        }
        if let Some(raw) = lookup(LOCALE) {
            self.locale = raw.trim().to_string();
        }
        if let Some(raw) = lookup(REASONER_ENABLED) {
            self.reasoner.enabled = is_true(&raw);
        }
        if let Some(raw) = lookup(REASONER_ENDPOINT) {
            self.reasoner.endpoint = raw.trim().to_string();
        }
        if let Some(raw) = lookup(REASONER_MODEL) {
            self.reasoner.model = raw.trim().to_string();
        }
        if let Some(v) = parse_override::<u64>(&lookup, REASONER_TIMEOUT_SECS) {
            self.reasoner.timeout_secs = v;
        }
    }

    /// 配置校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fallback_budget.is_finite() || self.fallback_budget < 0.0 {
            return Err(invalid("fallback_budget", "必须为非负有限数"));
        }
        if !self.price_markup.is_finite() || self.price_markup < 0.0 {
            return Err(invalid("price_markup", "必须为非负有限数"));
        }
        if !self.salvage_value.is_finite() || self.salvage_value < 0.0 {
            return Err(invalid("salvage_value", "必须为非负有限数"));
        }
        if !self.interval_z.is_finite() || self.interval_z <= 0.0 {
            return Err(invalid("interval_z", "必须为正数"));
        }
        if self.reasoner.enabled && self.reasoner.timeout_secs == 0 {
            return Err(invalid("reasoner.timeout_secs", "启用解释服务时必须大于 0"));
        }
        if self.reasoner.enabled && self.reasoner.endpoint.trim().is_empty() {
            return Err(invalid("reasoner.endpoint", "启用解释服务时不能为空"));
        }
        Ok(())
    }
}

/// 默认配置文件路径（用户配置目录,取不到时回退到当前目录）
pub fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("procurement-planner").join("config.json"),
        None => PathBuf::from("./procurement_planner.json"),
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(config_key = key, raw_value = %raw, "配置覆写值格式错误，已忽略");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.fallback_budget, 10_000.0);
        assert_eq!(config.fallback_capacity, 1_000);
        assert_eq!(config.price_markup, 10.0);
        assert_eq!(config.interval_z, 1.96);
        assert_eq!(config.reasoner.timeout_secs, 30);
        assert!(!config.reasoner.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"fallback_budget": 650.0, "conservatism": "high"}}"#).unwrap();

        let config = PlannerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.fallback_budget, 650.0);
        assert_eq!(config.conservatism, ConservatismLevel::High);
        assert_eq!(config.fallback_capacity, 1_000);
    }

    #[test]
    fn test_overrides_ignore_malformed_values() {
        let env: HashMap<&str, &str> = [
            (config_keys::FALLBACK_CAPACITY, "250"),
            (config_keys::PRICE_MARKUP, "abc"),
            (config_keys::PLAN_DATE, "2026-03-09"),
            (config_keys::REASONER_ENABLED, "yes"),
        ]
        .into_iter()
        .collect();

        let mut config = PlannerConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.fallback_capacity, 250);
        assert_eq!(config.price_markup, 10.0);
        assert_eq!(config.plan_date, NaiveDate::from_ymd_opt(2026, 3, 9));
        assert!(config.reasoner.enabled);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = PlannerConfig::default();
        config.interval_z = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = PlannerConfig::default();
        config.reasoner.enabled = true;
        config.reasoner.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
