//! 实体定义系统
//!
//! 模型在注册时声明一组有序命名属性，每个属性携带可选默认值
//! 默认值可以是固定值，也可以是零参生产者（每个实例独立求值）
//! 外键属性允许在关系注册时追加（见 `Schema::define_foreign_key`）

use crate::types::DataValue;
use std::fmt;
use std::sync::Arc;

/// 属性默认值
#[derive(Clone)]
pub enum DefaultValue {
    /// 固定默认值
    Value(DataValue),
    /// 零参生产者，构造实例时求值，两个实例不共享可变默认引用
    Producer(Arc<dyn Fn() -> DataValue + Send + Sync>),
}

impl DefaultValue {
    /// 解析默认值（生产者在此处被调用）
    pub fn resolve(&self) -> DataValue {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Producer(producer) => producer(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => write!(f, "Value({:?})", value),
            DefaultValue::Producer(_) => write!(f, "Producer(..)"),
        }
    }
}

/// 属性描述符
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    /// 默认值，未声明时属性初始化为Null
    pub default: Option<DefaultValue>,
}

impl PropertyDescriptor {
    /// 创建无默认值的属性描述符
    pub fn new() -> Self {
        Self { default: None }
    }

    /// 设置固定默认值
    pub fn with_default(mut self, value: DataValue) -> Self {
        self.default = Some(DefaultValue::Value(value));
        self
    }

    /// 设置默认值生产者
    pub fn with_producer<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> DataValue + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(producer)));
        self
    }

    /// 解析该属性的初始值（无默认值时为Null）
    pub fn resolve_default(&self) -> DataValue {
        match &self.default {
            Some(default) => default.resolve(),
            None => DataValue::Null,
        }
    }
}

/// 实体定义：属性名到描述符的有序映射
///
/// 注册后通常不再变化，唯一例外是关系注册追加外键属性
#[derive(Debug, Clone, Default)]
pub struct EntityDefinition {
    properties: Vec<(String, PropertyDescriptor)>,
}

impl EntityDefinition {
    /// 创建空的实体定义
    pub fn new() -> Self {
        Self {
            properties: Vec::new(),
        }
    }

    /// 声明一个属性；重复声明覆盖描述符但保持原有顺序
    pub fn define(&mut self, name: &str, descriptor: PropertyDescriptor) {
        if let Some(slot) = self.properties.iter_mut().find(|(n, _)| n == name) {
            slot.1 = descriptor;
        } else {
            self.properties.push((name.to_string(), descriptor));
        }
    }

    /// 是否已声明指定属性
    pub fn contains(&self, name: &str) -> bool {
        self.properties.iter().any(|(n, _)| n == name)
    }

    /// 获取属性描述符
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    /// 按声明顺序遍历属性
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.properties.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// 按声明顺序遍历属性名
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(n, _)| n.as_str())
    }

    /// 属性数量
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// 是否为空定义
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// 便捷宏：定义实体属性
///
/// ```rust
/// use rat_quickmodel::{properties, DataValue, PropertyDescriptor};
///
/// let definition = properties! {
///     title: PropertyDescriptor::new().with_default(DataValue::String("未命名".to_string())),
///     views: PropertyDescriptor::new().with_default(DataValue::Int(0)),
///     body: PropertyDescriptor::new(),
/// };
/// assert_eq!(definition.len(), 3);
/// ```
#[macro_export]
macro_rules! properties {
    ( $( $name:ident : $descriptor:expr ),* $(,)? ) => {{
        #[allow(unused_mut)]
        let mut definition = $crate::model::EntityDefinition::new();
        $( definition.define(stringify!($name), $descriptor); )*
        definition
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_preserves_order() {
        let mut definition = EntityDefinition::new();
        definition.define("title", PropertyDescriptor::new());
        definition.define("views", PropertyDescriptor::new());
        definition.define("body", PropertyDescriptor::new());

        let names: Vec<&str> = definition.names().collect();
        assert_eq!(names, vec!["title", "views", "body"]);

        // 重复声明覆盖描述符但不改变顺序
        definition.define("title", PropertyDescriptor::new().with_default(DataValue::Int(1)));
        let names: Vec<&str> = definition.names().collect();
        assert_eq!(names, vec!["title", "views", "body"]);
    }

    #[test]
    fn test_producer_default_fresh_per_call() {
        let descriptor = PropertyDescriptor::new()
            .with_producer(|| DataValue::Uuid(uuid::Uuid::new_v4()));

        let first = descriptor.resolve_default();
        let second = descriptor.resolve_default();
        assert_ne!(first, second);
    }

    #[test]
    fn test_missing_default_resolves_to_null() {
        let descriptor = PropertyDescriptor::new();
        assert!(descriptor.resolve_default().is_null());
    }
}
