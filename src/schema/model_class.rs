//! 模型类句柄：类级CRUD入口
//!
//! create/find/all/exists/count/destroy_all 协调属性集、身份缓存与适配器；
//! 读取路径统一经过 canonicalize，保证同一ID只产生一个活动实例

use crate::debug_log;
use crate::error::ModelResult;
use crate::model::instance::ModelInstance;
use crate::model_error;
use crate::relation::RelationParams;
use crate::scope::ScopeHandle;
use crate::types::{ConditionMap, DataValue};
use rat_logger::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ModelDescriptor, Schema, Validator};

/// 模型类句柄（类级静态侧）
#[derive(Clone)]
pub struct ModelClass {
    schema: Arc<Schema>,
    descriptor: Arc<ModelDescriptor>,
}

impl ModelClass {
    pub(crate) fn new(schema: Arc<Schema>, descriptor: Arc<ModelDescriptor>) -> Self {
        Self { schema, descriptor }
    }

    /// 模型名
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// 所属Schema
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// 模型描述符
    pub fn descriptor(&self) -> &Arc<ModelDescriptor> {
        &self.descriptor
    }

    /// 构造未持久化的草稿实例（不触碰适配器）
    pub fn build(&self, data: HashMap<String, DataValue>) -> Arc<ModelInstance> {
        let definition = self.descriptor.definition_snapshot();
        ModelInstance::new(self.schema.clone(), self.name(), &definition, &data)
    }

    /// 创建并持久化记录
    ///
    /// 验证失败返回验证错误，适配器不被调用；成功后分配一次性ID
    /// 并登记到身份缓存
    pub async fn create(&self, data: HashMap<String, DataValue>) -> ModelResult<Arc<ModelInstance>> {
        let instance = self.build(data);
        self.create_instance(instance, true).await
    }

    /// 草稿保存委托入口：实例在 save 中已验证过，此处跳过重复验证
    pub(crate) async fn create_from_draft(
        &self,
        draft: Arc<ModelInstance>,
    ) -> ModelResult<Arc<ModelInstance>> {
        self.create_instance(draft, false).await
    }

    async fn create_instance(
        &self,
        instance: Arc<ModelInstance>,
        validate: bool,
    ) -> ModelResult<Arc<ModelInstance>> {
        if validate && !instance.is_valid() {
            return Err(model_error!(validation, self.name(), "属性验证未通过"));
        }

        // 持久化解析后的属性映射（默认值已求值）
        let data = instance.to_object();
        let id = self.schema.adapter().create(self.name(), &data).await?;
        instance.assign_id(id.clone())?;
        self.schema.cache(self.name())?.insert(&id, instance.clone());
        debug!("创建记录: model={}, id={}", self.name(), id);
        Ok(instance)
    }

    /// 根据ID查找记录
    ///
    /// 记录不存在返回 `Ok(None)`；缓存命中时就地刷新并返回原实例
    pub async fn find(&self, id: &str) -> ModelResult<Option<Arc<ModelInstance>>> {
        match self.schema.adapter().find_by_id(self.name(), id).await? {
            Some(data) => Ok(Some(self.canonicalize(data)?)),
            None => Ok(None),
        }
    }

    /// 按条件查找记录，逐行执行缓存命中或物化策略
    pub async fn all(&self, filter: Option<ConditionMap>) -> ModelResult<Vec<Arc<ModelInstance>>> {
        let rows = self
            .schema
            .adapter()
            .all(self.name(), filter.as_ref())
            .await?;
        rows.into_iter().map(|row| self.canonicalize(row)).collect()
    }

    /// 检查记录是否存在（纯透传）
    pub async fn exists(&self, id: &str) -> ModelResult<bool> {
        self.schema.adapter().exists(self.name(), id).await
    }

    /// 统计记录数量（纯透传）
    pub async fn count(&self) -> ModelResult<u64> {
        self.schema.adapter().count(self.name()).await
    }

    /// 批量删除；仅在适配器成功后清空本模型的身份缓存
    pub async fn destroy_all(&self) -> ModelResult<()> {
        self.schema.adapter().destroy_all(self.name()).await?;
        self.schema.cache(self.name())?.clear();
        debug!("批量删除完成: model={}", self.name());
        Ok(())
    }

    /// 注册外部验证谓词
    pub fn set_validator<F>(&self, validator: F)
    where
        F: Fn(&ModelInstance) -> bool + Send + Sync + 'static,
    {
        let validator: Validator = Arc::new(validator);
        self.descriptor.set_validator(validator);
    }

    /// 注册命名作用域
    pub fn scope(&self, name: &str, condition: ConditionMap) {
        self.descriptor.add_scope(name, condition);
    }

    /// 构造命名作用域的查询句柄
    pub fn scoped(&self, name: &str) -> ModelResult<ScopeHandle> {
        let condition = self
            .descriptor
            .scope_condition(name)
            .ok_or_else(|| crate::error::ModelError::ScopeNotFound {
                model: self.name().to_string(),
                scope: name.to_string(),
            })?;
        Ok(ScopeHandle::new(self.clone(), condition))
    }

    /// 声明一对多关系（向对方模型追加外键属性）
    pub fn has_many(&self, related: &ModelClass, params: RelationParams) -> ModelResult<()> {
        crate::relation::register_has_many(self, related, params)
    }

    /// 声明从属关系（向本模型追加外键属性）
    pub fn belongs_to(&self, related: &ModelClass, params: RelationParams) -> ModelResult<()> {
        crate::relation::register_belongs_to(self, related, params)
    }

    /// 将适配器返回的行转换为规范实例
    ///
    /// 缓存命中：在原实例上重新执行构造式赋值，保持引用同一性；
    /// 未命中：物化新实例并登记缓存
    fn canonicalize(&self, data: HashMap<String, DataValue>) -> ModelResult<Arc<ModelInstance>> {
        let row_id = match data.get("id") {
            Some(DataValue::String(id)) => id.clone(),
            _ => {
                return Err(model_error!(
                    adapter,
                    format!("适配器返回的记录缺少字符串ID: model={}", self.name())
                ));
            }
        };

        let cache = self.schema.cache(self.name())?;
        if let Some(existing) = cache.get(&row_id) {
            existing.reapply(&data)?;
            debug_log!("缓存命中，就地刷新: model={}, id={}", self.name(), row_id);
            return Ok(existing);
        }

        let instance = self.build(data);
        cache.insert(&row_id, instance.clone());
        debug_log!("物化新实例: model={}, id={}", self.name(), row_id);
        Ok(instance)
    }
}
