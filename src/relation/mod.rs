//! 关系声明模块
//!
//! has_many/belongs_to 只做声明性元数据登记、外键属性追加与
//! 访问器生成，不参与CRUD路径：没有连接解析、没有预加载、
//! 没有级联删除
//!
//! belongs_to 访问器按参数形态分派的源行为拆分为三个显式操作：
//! `set_related` / `get_related`（异步）/ `get_related_cached`

use crate::error::{ModelError, ModelResult};
use crate::model::instance::ModelInstance;
use crate::model_error;
use crate::schema::ModelClass;
use crate::scope::ScopeHandle;
use crate::types::{ConditionMap, DataValue};
use rat_logger::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// 关系种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// 一对多：本模型拥有多个对方实例，外键在对方模型上
    HasMany,
    /// 从属：外键在本模型上，指向对方实例
    BelongsTo,
}

/// 关系声明记录
#[derive(Debug, Clone)]
pub struct RelationDefinition {
    /// 关系种类
    pub kind: RelationKind,
    /// 对方模型名
    pub related_model: String,
    /// 外键属性名
    pub foreign_key: String,
}

/// 关系声明参数
#[derive(Debug, Clone)]
pub struct RelationParams {
    /// 访问器名称
    pub accessor: String,
    /// 外键属性名
    pub foreign_key: String,
}

impl RelationParams {
    /// 创建关系参数
    pub fn new(accessor: &str, foreign_key: &str) -> Self {
        Self {
            accessor: accessor.to_string(),
            foreign_key: foreign_key.to_string(),
        }
    }
}

/// 注册一对多关系：外键追加到对方模型的实体定义
pub(crate) fn register_has_many(
    owner: &ModelClass,
    related: &ModelClass,
    params: RelationParams,
) -> ModelResult<()> {
    owner
        .schema()
        .define_foreign_key(related.name(), &params.foreign_key)?;
    owner.descriptor().add_relation(
        &params.accessor,
        RelationDefinition {
            kind: RelationKind::HasMany,
            related_model: related.name().to_string(),
            foreign_key: params.foreign_key.clone(),
        },
    );
    debug!(
        "注册一对多关系: {}.{} -> {} (外键 {})",
        owner.name(),
        params.accessor,
        related.name(),
        params.foreign_key
    );
    Ok(())
}

/// 注册从属关系：外键追加到本模型的实体定义
pub(crate) fn register_belongs_to(
    owner: &ModelClass,
    related: &ModelClass,
    params: RelationParams,
) -> ModelResult<()> {
    owner
        .schema()
        .define_foreign_key(owner.name(), &params.foreign_key)?;
    owner.descriptor().add_relation(
        &params.accessor,
        RelationDefinition {
            kind: RelationKind::BelongsTo,
            related_model: related.name().to_string(),
            foreign_key: params.foreign_key.clone(),
        },
    );
    debug!(
        "注册从属关系: {}.{} -> {} (外键 {})",
        owner.name(),
        params.accessor,
        related.name(),
        params.foreign_key
    );
    Ok(())
}

/// 一对多关系访问器
///
/// 背后是一个隐式条件为 `{外键: 所有者ID}` 的作用域句柄，
/// 附带经外键授权的 find/destroy 子操作
pub struct HasManyAccessor {
    scope: ScopeHandle,
    related: ModelClass,
    owner_id: String,
    foreign_key: String,
}

impl HasManyAccessor {
    /// 查询全部关联记录（可叠加调用方过滤器）
    pub async fn all(
        &self,
        filter: Option<ConditionMap>,
    ) -> ModelResult<Vec<Arc<ModelInstance>>> {
        self.scope.all(filter).await
    }

    /// 构造外键已绑定的草稿实例
    pub fn build(&self, data: HashMap<String, DataValue>) -> Arc<ModelInstance> {
        self.scope.build(data)
    }

    /// 构造并保存外键已绑定的记录
    pub async fn create(
        &self,
        data: HashMap<String, DataValue>,
    ) -> ModelResult<Arc<ModelInstance>> {
        self.scope.create(data).await
    }

    /// 底层作用域句柄（可继续做子作用域合并）
    pub fn as_scope(&self) -> &ScopeHandle {
        &self.scope
    }

    /// 经授权的查找：目标记录的外键必须等于所有者ID
    ///
    /// 记录不存在返回 NotFound；外键不匹配返回 PermissionDenied，
    /// 绝不返回不属于所有者的实例
    pub async fn find(&self, id: &str) -> ModelResult<Arc<ModelInstance>> {
        match self.related.find(id).await? {
            None => Err(model_error!(not_found, self.related.name(), id)),
            Some(instance) => {
                let expected = DataValue::String(self.owner_id.clone());
                if instance.get(&self.foreign_key) == expected {
                    Ok(instance)
                } else {
                    Err(model_error!(permission, self.related.name(), id))
                }
            }
        }
    }

    /// 经授权的删除：先 find 完成外键授权，再委托实例自身的 destroy
    pub async fn destroy(&self, id: &str) -> ModelResult<()> {
        let instance = self.find(id).await?;
        instance.destroy().await
    }
}

impl ModelInstance {
    /// 获取一对多关系访问器（要求所有者已持久化）
    pub fn relation(&self, accessor: &str) -> ModelResult<HasManyAccessor> {
        let class = self.class()?;
        let definition = class
            .descriptor()
            .relation(accessor)
            .filter(|relation| relation.kind == RelationKind::HasMany)
            .ok_or_else(|| ModelError::RelationNotFound {
                model: self.model_name().to_string(),
                relation: accessor.to_string(),
            })?;

        let owner_id = self.id().ok_or_else(|| ModelError::MissingId {
            model: self.model_name().to_string(),
        })?;
        let related = self.schema().model(&definition.related_model)?;

        let mut condition = ConditionMap::new();
        condition.insert(
            definition.foreign_key.clone(),
            DataValue::String(owner_id.clone()),
        );

        Ok(HasManyAccessor {
            scope: ScopeHandle::new(related.clone(), condition),
            related,
            owner_id,
            foreign_key: definition.foreign_key,
        })
    }

    /// 从属关系设置器：写入外键并缓存关联实例（对方必须已持久化）
    pub fn set_related(&self, accessor: &str, related: &Arc<ModelInstance>) -> ModelResult<()> {
        let definition = self.belongs_to_definition(accessor)?;
        let related_id = related.id().ok_or_else(|| ModelError::MissingId {
            model: related.model_name().to_string(),
        })?;

        self.set(&definition.foreign_key, DataValue::String(related_id));
        self.cache_related(accessor, related.clone());
        Ok(())
    }

    /// 从属关系异步获取器：按外键经常规 find 路径解析并缓存结果
    ///
    /// 外键为空时返回 `Ok(None)`
    pub async fn get_related(&self, accessor: &str) -> ModelResult<Option<Arc<ModelInstance>>> {
        let definition = self.belongs_to_definition(accessor)?;

        let related_id = match self.get(&definition.foreign_key) {
            DataValue::String(id) => id,
            _ => return Ok(None),
        };

        let related_class = self.schema().model(&definition.related_model)?;
        let found = related_class.find(&related_id).await?;
        if let Some(instance) = &found {
            self.cache_related(accessor, instance.clone());
        }
        Ok(found)
    }

    /// 从属关系同步缓存获取器：只读关系缓存，不触碰适配器
    pub fn get_related_cached(&self, accessor: &str) -> ModelResult<Option<Arc<ModelInstance>>> {
        self.belongs_to_definition(accessor)?;
        Ok(self.cached_relation(accessor))
    }

    fn belongs_to_definition(&self, accessor: &str) -> ModelResult<RelationDefinition> {
        let class = self.class()?;
        class
            .descriptor()
            .relation(accessor)
            .filter(|relation| relation.kind == RelationKind::BelongsTo)
            .ok_or_else(|| ModelError::RelationNotFound {
                model: self.model_name().to_string(),
                relation: accessor.to_string(),
            })
    }
}
