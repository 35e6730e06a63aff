//! 作用域查询模块
//!
//! 命名作用域绑定目标模型类与一份隐式条件；查询时隐式条件
//! 合并进调用方过滤器并在键冲突时获胜。子作用域访问将对方的
//! 条件累积合并进当前句柄（就地修改，不复制）

use crate::error::{ModelError, ModelResult};
use crate::model::instance::{ModelInstance, SaveOptions};
use crate::schema::ModelClass;
use crate::types::{ConditionMap, DataValue};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// 合并条件映射：update 的键覆盖 base 的同名键，返回新映射
pub fn merge_conditions(base: &ConditionMap, update: &ConditionMap) -> ConditionMap {
    let mut merged = base.clone();
    for (key, value) in update {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// 作用域查询句柄
///
/// 惰性构造的可调用对象的显式替身：条件在句柄内可变，
/// `sub` 的合并是累积的
pub struct ScopeHandle {
    target: ModelClass,
    condition: Mutex<ConditionMap>,
}

impl ScopeHandle {
    pub(crate) fn new(target: ModelClass, condition: ConditionMap) -> Self {
        Self {
            target,
            condition: Mutex::new(condition),
        }
    }

    /// 目标模型类
    pub fn target(&self) -> &ModelClass {
        &self.target
    }

    /// 当前隐式条件快照
    pub fn condition(&self) -> ConditionMap {
        self.condition.lock().clone()
    }

    /// 合并目标类上另一个命名作用域的条件（就地修改，可链式调用）
    pub fn sub(&self, name: &str) -> ModelResult<&Self> {
        let sub_condition = self
            .target
            .descriptor()
            .scope_condition(name)
            .ok_or_else(|| ModelError::ScopeNotFound {
                model: self.target.name().to_string(),
                scope: name.to_string(),
            })?;

        let mut condition = self.condition.lock();
        let merged = merge_conditions(&condition, &sub_condition);
        *condition = merged;
        Ok(self)
    }

    /// 按作用域查询：隐式条件并入调用方过滤器，键冲突时隐式条件获胜
    pub async fn all(
        &self,
        filter: Option<ConditionMap>,
    ) -> ModelResult<Vec<Arc<ModelInstance>>> {
        let implicit = self.condition();
        let merged = match filter {
            Some(filter) => merge_conditions(&filter, &implicit),
            None => implicit,
        };
        self.target.all(Some(merged)).await
    }

    /// 构造绑定隐式条件的草稿实例（不持久化；显式数据覆盖隐式条件）
    pub fn build(&self, data: HashMap<String, DataValue>) -> Arc<ModelInstance> {
        let merged = merge_conditions(&self.condition(), &data);
        self.target.build(merged)
    }

    /// 构造并保存
    pub async fn create(
        &self,
        data: HashMap<String, DataValue>,
    ) -> ModelResult<Arc<ModelInstance>> {
        let draft = self.build(data);
        draft.save(SaveOptions::default()).await?;
        Ok(draft)
    }
}
