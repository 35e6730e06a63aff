//! Schema注册表模块
//!
//! Schema是模型类、身份缓存与存储适配器的显式所有者：
//! 模型类是一等描述符对象（实体定义 + 关系 + 作用域 + 验证器），
//! 不存在挂在类型上的环境全局状态

use crate::cache::{CacheStatsSnapshot, IdentityCache};
use crate::config::SchemaConfig;
use crate::error::{ModelError, ModelResult};
use crate::model::definition::{EntityDefinition, PropertyDescriptor};
use crate::model::ModelInstance;
use crate::relation::RelationDefinition;
use crate::types::ConditionMap;
use crate::adapter::StorageAdapter;
use dashmap::DashMap;
use parking_lot::RwLock;
use rat_logger::info;
use std::collections::HashMap;
use std::sync::Arc;

mod model_class;

pub use model_class::ModelClass;

/// 外部验证能力：每实例谓词，false 即验证失败
pub type Validator = Arc<dyn Fn(&ModelInstance) -> bool + Send + Sync>;

/// 模型描述符：实体定义、关系、作用域与验证器的载体
pub struct ModelDescriptor {
    name: String,
    definition: RwLock<EntityDefinition>,
    validator: RwLock<Option<Validator>>,
    relations: RwLock<HashMap<String, RelationDefinition>>,
    scopes: RwLock<HashMap<String, ConditionMap>>,
}

impl ModelDescriptor {
    fn new(name: &str, definition: EntityDefinition) -> Self {
        Self {
            name: name.to_string(),
            definition: RwLock::new(definition),
            validator: RwLock::new(None),
            relations: RwLock::new(HashMap::new()),
            scopes: RwLock::new(HashMap::new()),
        }
    }

    /// 模型名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 导出实体定义快照
    pub fn definition_snapshot(&self) -> EntityDefinition {
        self.definition.read().clone()
    }

    /// 追加属性（外键注册路径），已存在时保持原描述符
    pub(crate) fn define_property(&self, name: &str, descriptor: PropertyDescriptor) {
        let mut definition = self.definition.write();
        if !definition.contains(name) {
            definition.define(name, descriptor);
        }
    }

    pub(crate) fn set_validator(&self, validator: Validator) {
        *self.validator.write() = Some(validator);
    }

    /// 运行验证器；未注册验证器时视为有效
    pub(crate) fn run_validator(&self, instance: &ModelInstance) -> bool {
        match self.validator.read().as_ref() {
            Some(validator) => validator(instance),
            None => true,
        }
    }

    pub(crate) fn add_relation(&self, accessor: &str, relation: RelationDefinition) {
        self.relations.write().insert(accessor.to_string(), relation);
    }

    /// 查找关系定义
    pub fn relation(&self, accessor: &str) -> Option<RelationDefinition> {
        self.relations.read().get(accessor).cloned()
    }

    pub(crate) fn add_scope(&self, name: &str, condition: ConditionMap) {
        self.scopes.write().insert(name.to_string(), condition);
    }

    /// 查找命名作用域的隐式条件
    pub fn scope_condition(&self, name: &str) -> Option<ConditionMap> {
        self.scopes.read().get(name).cloned()
    }
}

/// Schema：适配器 + 模型注册表 + 身份缓存
pub struct Schema {
    adapter: Arc<dyn StorageAdapter>,
    config: SchemaConfig,
    models: DashMap<String, Arc<ModelDescriptor>>,
    caches: DashMap<String, Arc<IdentityCache>>,
}

impl Schema {
    /// 创建绑定单一适配器的Schema
    pub fn new(adapter: Arc<dyn StorageAdapter>, config: SchemaConfig) -> Arc<Self> {
        Arc::new(Self {
            adapter,
            config,
            models: DashMap::new(),
            caches: DashMap::new(),
        })
    }

    /// 注册模型，返回模型类句柄
    pub fn define_model(
        self: &Arc<Self>,
        name: &str,
        definition: EntityDefinition,
    ) -> ModelResult<ModelClass> {
        if self.models.contains_key(name) {
            return Err(ModelError::ConfigError {
                message: format!("模型已注册: {}", name),
            });
        }

        let descriptor = Arc::new(ModelDescriptor::new(name, definition));
        self.models.insert(name.to_string(), descriptor.clone());
        self.caches.insert(name.to_string(), Arc::new(IdentityCache::new()));
        info!("注册模型: {}", name);

        Ok(ModelClass::new(self.clone(), descriptor))
    }

    /// 获取已注册模型的类句柄
    pub fn model(self: &Arc<Self>, name: &str) -> ModelResult<ModelClass> {
        let descriptor = self.descriptor(name)?;
        Ok(ModelClass::new(self.clone(), descriptor))
    }

    pub(crate) fn descriptor(&self, name: &str) -> ModelResult<Arc<ModelDescriptor>> {
        self.models
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ModelError::ModelNotRegistered {
                model: name.to_string(),
            })
    }

    /// 向已注册模型追加外键属性（幂等）
    pub fn define_foreign_key(&self, model: &str, foreign_key: &str) -> ModelResult<()> {
        let descriptor = self.descriptor(model)?;
        descriptor.define_property(foreign_key, PropertyDescriptor::new());
        Ok(())
    }

    /// 获取适配器
    pub fn adapter(&self) -> Arc<dyn StorageAdapter> {
        self.adapter.clone()
    }

    pub(crate) fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// 获取模型的身份缓存（显式驱逐API入口）
    pub fn cache(&self, model: &str) -> ModelResult<Arc<IdentityCache>> {
        self.caches
            .get(model)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ModelError::ModelNotRegistered {
                model: model.to_string(),
            })
    }

    /// 获取模型缓存的统计快照
    pub fn cache_stats(&self, model: &str) -> ModelResult<CacheStatsSnapshot> {
        Ok(self.cache(model)?.stats_snapshot())
    }
}
