//! 存储适配器模块
//!
//! 提供统一的持久化操作接口，屏蔽不同存储后端的实现差异
//! 核心只依赖这份固定契约，一个Schema绑定一个后端

use crate::error::ModelResult;
use crate::types::{ConditionMap, DataValue};
use async_trait::async_trait;
use std::collections::HashMap;

mod memory;

pub use memory::MemoryAdapter;

/// 存储适配器trait，定义统一的持久化操作接口
///
/// 所有操作按模型名寻址，记录以属性映射表示，ID为不透明字符串
/// 适配器错误原样向上透传，核心不重试、不解释
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// 创建记录，返回适配器分配的ID
    async fn create(
        &self,
        model: &str,
        data: &HashMap<String, DataValue>,
    ) -> ModelResult<String>;

    /// 根据ID查找记录；记录不存在返回 `Ok(None)`，不是错误
    async fn find_by_id(
        &self,
        model: &str,
        id: &str,
    ) -> ModelResult<Option<HashMap<String, DataValue>>>;

    /// 按条件查找记录，条件为None时返回全部
    async fn all(
        &self,
        model: &str,
        filter: Option<&ConditionMap>,
    ) -> ModelResult<Vec<HashMap<String, DataValue>>>;

    /// 统计记录数量
    async fn count(&self, model: &str) -> ModelResult<u64>;

    /// 检查记录是否存在
    async fn exists(&self, model: &str, id: &str) -> ModelResult<bool>;

    /// 删除记录
    async fn destroy(&self, model: &str, id: &str) -> ModelResult<()>;

    /// 删除模型的全部记录
    async fn destroy_all(&self, model: &str) -> ModelResult<()>;

    /// 整体保存已持久化记录（data中必须包含id）
    async fn save(&self, model: &str, data: &HashMap<String, DataValue>) -> ModelResult<()>;

    /// 部分更新记录属性
    async fn update_attributes(
        &self,
        model: &str,
        id: &str,
        data: &HashMap<String, DataValue>,
    ) -> ModelResult<()>;
}
