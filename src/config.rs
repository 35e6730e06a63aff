//! # 配置管理模块
//!
//! 提供Schema级别的行为配置，支持构建器模式
//! 严格遵循项目规范：所有配置项必须显式设置，严禁使用默认值

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// destroy 失败时的身份缓存驱逐策略
///
/// 原始实现在适配器报错时也会驱逐缓存条目（乐观驱逐），
/// 该行为作为可配置策略保留，而不是静默"修正"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyEvictionPolicy {
    /// 无论适配器成败都驱逐（乐观驱逐，源行为）
    Always,
    /// 仅在适配器删除成功后驱逐
    OnSuccess,
}

/// Schema行为配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// destroy 失败时的缓存驱逐策略
    pub destroy_eviction: DestroyEvictionPolicy,
}

impl SchemaConfig {
    /// 创建配置构建器
    pub fn builder() -> SchemaConfigBuilder {
        SchemaConfigBuilder::new()
    }
}

/// Schema配置构建器
///
/// 严格要求所有配置项必须显式设置，严禁使用默认值
#[derive(Debug)]
pub struct SchemaConfigBuilder {
    destroy_eviction: Option<DestroyEvictionPolicy>,
}

impl SchemaConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            destroy_eviction: None,
        }
    }

    /// 设置destroy失败时的缓存驱逐策略
    pub fn destroy_eviction(mut self, policy: DestroyEvictionPolicy) -> Self {
        self.destroy_eviction = Some(policy);
        self
    }

    /// 构建配置
    pub fn build(self) -> ModelResult<SchemaConfig> {
        let destroy_eviction = self.destroy_eviction.ok_or_else(|| ModelError::ConfigError {
            message: "缺少必填配置项: destroy_eviction".to_string(),
        })?;

        Ok(SchemaConfig { destroy_eviction })
    }
}

impl Default for SchemaConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 便捷配置：乐观驱逐（源行为）
pub fn optimistic_config() -> SchemaConfig {
    SchemaConfig {
        destroy_eviction: DestroyEvictionPolicy::Always,
    }
}

/// 便捷配置：仅成功后驱逐
pub fn strict_config() -> SchemaConfig {
    SchemaConfig {
        destroy_eviction: DestroyEvictionPolicy::OnSuccess,
    }
}
