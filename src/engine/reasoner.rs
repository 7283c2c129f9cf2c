// ==========================================
// 采购计划决策支持系统 - 解释文本服务
// ==========================================
// 职责: 为需求分析结果生成自然语言解释
// 变体: LlmReasoner (外部 LLM) / DeterministicReasoner (确定性模板)
// 红线: 只影响解释文本,不影响任何数值输出
// 红线: LLM 调用带显式截止时间; 失败或超时即使用确定性文本,不重试
// ==========================================

use crate::config::planner_config::ReasonerConfig;
use crate::domain::types::{ConfidenceTier, ConservatismLevel, TargetAdjustment};
use crate::i18n::{t, t_with_args};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

// ==========================================
// ReasonerError
// ==========================================
#[derive(Error, Debug)]
pub enum ReasonerError {
    #[error("解释服务请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("解释服务超时: {0:?}")]
    Timeout(Duration),

    #[error("解释服务返回无效响应: {0}")]
    InvalidResponse(String),

    #[error("解释服务不可用: {0}")]
    Unavailable(String),
}

// ==========================================
// ExplanationFacts - 解释所需的数值事实
// ==========================================
// 只包含数值事实,不包含任何控制逻辑
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationFacts {
    pub item_id: String,
    pub name: String,
    pub forecast: f64,
    pub interval_low: f64,
    pub interval_high: f64,
    pub confidence: f64,
    pub tier: ConfidenceTier,
    pub conservatism: ConservatismLevel,
    pub target_quantity: u32,
    pub adjustment: TargetAdjustment,
}

impl ExplanationFacts {
    /// 构造 LLM 提示词
    pub fn to_prompt(&self) -> String {
        format!(
            "Item: {name} ({item_id})\n\
             Forecast demand: {forecast:.2} units (interval {low:.2} - {high:.2})\n\
             Confidence score: {confidence:.2} ({tier})\n\
             Conservatism policy: {conservatism}\n\
             Target quantity: {target} units ({adjustment} relative to forecast)\n\
             In at most two sentences, explain this target quantity to a procurement manager.",
            name = self.name,
            item_id = self.item_id,
            forecast = self.forecast,
            low = self.interval_low,
            high = self.interval_high,
            confidence = self.confidence,
            tier = self.tier,
            conservatism = self.conservatism,
            target = self.target_quantity,
            adjustment = self.adjustment,
        )
    }
}

// ==========================================
// Reasoner Trait
// ==========================================
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// 变体名称（日志用）
    fn name(&self) -> &'static str;

    /// 生成解释文本
    async fn explain(&self, facts: &ExplanationFacts) -> Result<String, ReasonerError>;
}

// ==========================================
// DeterministicReasoner - 确定性模板
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DeterministicReasoner;

impl DeterministicReasoner {
    pub fn render(&self, facts: &ExplanationFacts) -> String {
        let forecast = format!("{:.1}", facts.forecast);
        let confidence = format!("{:.2}", facts.confidence);
        let target = facts.target_quantity.to_string();
        let tier = t(facts.tier.i18n_key());
        let adjustment = t(facts.adjustment.i18n_key());
        t_with_args(
            "explanation.fallback",
            &[
                ("name", facts.name.as_str()),
                ("forecast", forecast.as_str()),
                ("tier", tier.as_str()),
                ("confidence", confidence.as_str()),
                ("adjustment", adjustment.as_str()),
                ("target", target.as_str()),
            ],
        )
    }
}

#[async_trait]
impl Reasoner for DeterministicReasoner {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    async fn explain(&self, facts: &ExplanationFacts) -> Result<String, ReasonerError> {
        Ok(self.render(facts))
    }
}

// ==========================================
// LlmReasoner - OpenAI 兼容 chat-completions
// ==========================================
pub struct LlmReasoner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl LlmReasoner {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl Reasoner for LlmReasoner {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn explain(&self, facts: &ExplanationFacts) -> Result<String, ReasonerError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": 0.2,
            "messages": [
                {"role": "system", "content": "You are an inventory planning assistant. Be concise and factual."},
                {"role": "user", "content": facts.to_prompt()},
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload = response.json::<serde_json::Value>().await?;

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ReasonerError::InvalidResponse("response missing choices[0].message.content".into()))?;
        if text.is_empty() {
            return Err(ReasonerError::InvalidResponse("empty content".into()));
        }
        Ok(text)
    }
}

// ==========================================
// ExplanationService - 解释服务
// ==========================================

/// 解释来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationSource {
    Reasoner,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub text: String,
    pub source: ExplanationSource,
}

/// 构造时一次性选定变体; 调用方只依赖 `explain`
#[derive(Clone)]
pub struct ExplanationService {
    primary: Arc<dyn Reasoner>,
    fallback: DeterministicReasoner,
    deadline: Duration,
}

impl ExplanationService {
    /// 纯确定性解释
    pub fn deterministic() -> Self {
        Self {
            primary: Arc::new(DeterministicReasoner),
            fallback: DeterministicReasoner,
            deadline: Duration::from_secs(30),
        }
    }

    /// 指定主解释器与截止时间
    pub fn with_reasoner(primary: Arc<dyn Reasoner>, deadline: Duration) -> Self {
        Self {
            primary,
            fallback: DeterministicReasoner,
            deadline,
        }
    }

    /// 按配置选择变体
    ///
    /// 未启用或缺少 API Key 时退化为确定性解释。
    pub fn from_config(config: &ReasonerConfig) -> Self {
        if !config.enabled {
            return Self::deterministic();
        }
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Self::with_reasoner(
                Arc::new(LlmReasoner::new(
                    config.endpoint.clone(),
                    config.model.clone(),
                    key.trim(),
                    config.max_tokens,
                )),
                Duration::from_secs(config.timeout_secs),
            ),
            _ => {
                warn!(
                    api_key_env = %config.api_key_env,
                    "未找到 LLM API Key，解释服务使用确定性文本"
                );
                Self::deterministic()
            }
        }
    }

    pub fn reasoner_name(&self) -> &'static str {
        self.primary.name()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// 生成解释文本
    ///
    /// 主解释器在截止时间内完成则使用其结果; 失败或超时使用确定性文本。
    pub async fn explain(&self, facts: &ExplanationFacts) -> Explanation {
        let result = match tokio::time::timeout(self.deadline, self.primary.explain(facts)).await {
            Ok(r) => r,
            Err(_) => Err(ReasonerError::Timeout(self.deadline)),
        };

        match result {
            Ok(text) => {
                debug!(item_id = %facts.item_id, reasoner = self.primary.name(), "解释文本已生成");
                Explanation {
                    text,
                    source: ExplanationSource::Reasoner,
                }
            }
            Err(e) => {
                warn!(
                    item_id = %facts.item_id,
                    reasoner = self.primary.name(),
                    error = %e,
                    "解释服务失败，使用确定性文本"
                );
                Explanation {
                    text: self.fallback.render(facts),
                    source: ExplanationSource::Fallback,
                }
            }
        }
    }
}

impl std::fmt::Debug for ExplanationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplanationService")
            .field("primary", &self.primary.name())
            .field("deadline", &self.deadline)
            .finish()
    }
}
