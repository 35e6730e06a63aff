//! 模型实例：持久化生命周期
//!
//! 无ID的实例是草稿；一旦分配ID即不可变，并在身份缓存中可见
//! 所有持久化操作均为异步单次尝试，错误原样上抛，不重试

use crate::error::{ModelError, ModelResult};
use crate::model::attributes::AttributeSet;
use crate::model::definition::EntityDefinition;
use crate::model_error;
use crate::config::DestroyEvictionPolicy;
use crate::schema::{ModelClass, Schema};
use crate::types::DataValue;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rat_logger::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// save 操作选项
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// 是否在保存前运行验证谓词
    pub validate: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

/// 模型实例：一条逻辑记录（或一个未持久化草稿）
pub struct ModelInstance {
    model: String,
    schema: Arc<Schema>,
    /// 一次性写入的持久化ID
    id: OnceCell<String>,
    attributes: RwLock<AttributeSet>,
    /// 关系名 -> 已解析关联实例；惰性填充，从不自动失效
    relation_cache: RwLock<HashMap<String, Arc<ModelInstance>>>,
}

impl ModelInstance {
    /// 从原始数据映射构造实例（数据中的"id"键触发ID分配）
    pub(crate) fn new(
        schema: Arc<Schema>,
        model: &str,
        definition: &EntityDefinition,
        data: &HashMap<String, DataValue>,
    ) -> Arc<Self> {
        let id = OnceCell::new();
        if let Some(DataValue::String(value)) = data.get("id") {
            let _ = id.set(value.clone());
        }

        Arc::new(Self {
            model: model.to_string(),
            schema,
            id,
            attributes: RwLock::new(AttributeSet::materialize(definition, data)),
            relation_cache: RwLock::new(HashMap::new()),
        })
    }

    /// 模型名
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// 持久化ID（草稿返回None）
    pub fn id(&self) -> Option<String> {
        self.id.get().cloned()
    }

    /// 是否为未持久化草稿
    pub fn is_new_record(&self) -> bool {
        self.id.get().is_none()
    }

    /// 分配一次性ID；重复分配是错误
    pub(crate) fn assign_id(&self, id: String) -> ModelResult<()> {
        self.id.set(id).map_err(|_| ModelError::IdAlreadyAssigned {
            model: self.model.clone(),
        })
    }

    /// 读取属性当前值
    pub fn get(&self, name: &str) -> DataValue {
        self.attributes.read().get(name)
    }

    /// 写入属性当前值（基线不动）
    pub fn set(&self, name: &str, value: DataValue) {
        self.attributes.write().set(name, value);
    }

    /// 读取属性基线值（构造/刷新时捕获）
    pub fn was(&self, name: &str) -> DataValue {
        self.attributes.read().was(name)
    }

    /// 属性是否相对基线已修改
    ///
    /// 仅暴露给调用方/验证逻辑使用；save 不会据此跳过无变化写入
    pub fn property_changed(&self, name: &str) -> bool {
        self.attributes.read().property_changed(name)
    }

    /// 序列化为属性映射（含已分配的ID），作为发往适配器的载荷
    pub fn to_object(&self) -> HashMap<String, DataValue> {
        let mut data = self.attributes.read().to_map();
        if let Some(id) = self.id() {
            data.insert("id".to_string(), DataValue::String(id));
        }
        data
    }

    /// 运行外部验证谓词；模型未注册验证器时视为有效
    pub fn is_valid(&self) -> bool {
        match self.schema.descriptor(&self.model) {
            Ok(descriptor) => descriptor.run_validator(self),
            Err(_) => {
                warn!("验证时模型未注册，按有效处理: {}", self.model);
                true
            }
        }
    }

    /// 获取本实例对应的模型类句柄
    pub fn class(&self) -> ModelResult<ModelClass> {
        self.schema.model(&self.model)
    }

    pub(crate) fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// 在原实例上重新执行构造式赋值（身份缓存命中刷新、save 成功后）
    pub(crate) fn reapply(&self, data: &HashMap<String, DataValue>) -> ModelResult<()> {
        let definition = self.schema.descriptor(&self.model)?.definition_snapshot();
        self.attributes.write().reapply(&definition, data);
        Ok(())
    }

    /// 缓存已解析的关联实例
    pub(crate) fn cache_related(&self, accessor: &str, instance: Arc<ModelInstance>) {
        self.relation_cache
            .write()
            .insert(accessor.to_string(), instance);
    }

    /// 读取关系缓存
    pub(crate) fn cached_relation(&self, accessor: &str) -> Option<Arc<ModelInstance>> {
        self.relation_cache.read().get(accessor).cloned()
    }

    /// 清除单个关系缓存条目（缓存从不自动失效，由调用方显式清除）
    pub fn forget_related(&self, accessor: &str) {
        self.relation_cache.write().remove(accessor);
    }

    /// 保存实例
    ///
    /// 已持久化：整体序列化后交给适配器 save，成功后在本实例上
    /// 重新执行构造式赋值（基线随之刷新）；
    /// 草稿：整体委托给类级 create 路径并以自身为种子，create 不再重复验证
    pub async fn save(self: &Arc<Self>, options: SaveOptions) -> ModelResult<()> {
        if options.validate && !self.is_valid() {
            return Err(model_error!(validation, &self.model, "属性验证未通过"));
        }

        match self.id() {
            Some(id) => {
                let data = self.to_object();
                self.schema.adapter().save(&self.model, &data).await?;
                self.reapply(&data)?;
                debug!("保存记录: model={}, id={}", self.model, id);
                Ok(())
            }
            None => {
                let class = self.class()?;
                class.create_from_draft(self.clone()).await?;
                Ok(())
            }
        }
    }

    /// 更新单个属性
    pub async fn update_attribute(
        self: &Arc<Self>,
        name: &str,
        value: DataValue,
    ) -> ModelResult<()> {
        let data = HashMap::from([(name.to_string(), value)]);
        self.update_attributes(data).await
    }

    /// 批量更新属性
    ///
    /// 赋值先于验证（验证失败时赋值在实例上仍然可见，适配器不被调用）；
    /// 适配器成功后重新赋值并推进对应属性的基线，这是唯一
    /// 不经整体刷新就推进基线的路径
    pub async fn update_attributes(
        self: &Arc<Self>,
        data: HashMap<String, DataValue>,
    ) -> ModelResult<()> {
        {
            let mut attributes = self.attributes.write();
            for (name, value) in &data {
                attributes.set(name, value.clone());
            }
        }

        if !self.is_valid() {
            return Err(model_error!(validation, &self.model, "属性验证未通过"));
        }

        let id = self.id().ok_or_else(|| ModelError::MissingId {
            model: self.model.clone(),
        })?;

        self.schema
            .adapter()
            .update_attributes(&self.model, &id, &data)
            .await?;

        let mut attributes = self.attributes.write();
        for (name, value) in data {
            attributes.advance_baseline(&name, value);
        }
        Ok(())
    }

    /// 删除记录
    ///
    /// 缓存驱逐时机由Schema配置的策略决定：
    /// `Always` 在适配器报错时也驱逐（源行为），`OnSuccess` 仅成功后驱逐
    pub async fn destroy(&self) -> ModelResult<()> {
        let id = self.id().ok_or_else(|| ModelError::MissingId {
            model: self.model.clone(),
        })?;

        let result = self.schema.adapter().destroy(&self.model, &id).await;

        let evict = match self.schema.config().destroy_eviction {
            DestroyEvictionPolicy::Always => true,
            DestroyEvictionPolicy::OnSuccess => result.is_ok(),
        };
        if evict {
            self.schema.cache(&self.model)?.remove(&id);
        }

        result
    }

    /// 重新加载：经类级 find 走身份缓存的常规读取路径
    pub async fn reload(&self) -> ModelResult<Option<Arc<ModelInstance>>> {
        let id = self.id().ok_or_else(|| ModelError::MissingId {
            model: self.model.clone(),
        })?;
        self.class()?.find(&id).await
    }
}
