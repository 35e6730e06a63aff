//! 属性集：当前值与基线值的显式值对象
//!
//! 对应"隐藏字段 + 访问器"的属性存储：当前值可变，基线值（was）
//! 在构造/整体刷新时捕获，二者不相等即视为属性已修改
//! `advance_baseline` 是唯一的单属性基线推进路径（update_attributes 成功后）

use crate::model::definition::EntityDefinition;
use crate::types::DataValue;
use std::collections::HashMap;

/// 每实例属性存储
#[derive(Debug, Clone)]
pub struct AttributeSet {
    /// 当前值
    current: HashMap<String, DataValue>,
    /// 构造/刷新时捕获的基线值
    original: HashMap<String, DataValue>,
}

impl AttributeSet {
    /// 按实体定义构造属性集
    ///
    /// 初始值优先级：显式数据 -> 声明默认值（生产者即时求值）-> Null
    /// 基线值捕获解析后的初始值，因此构造后 property_changed 恒为false
    pub fn materialize(definition: &EntityDefinition, data: &HashMap<String, DataValue>) -> Self {
        let mut current = HashMap::new();
        for (name, descriptor) in definition.iter() {
            let value = match data.get(name) {
                Some(value) => value.clone(),
                None => descriptor.resolve_default(),
            };
            current.insert(name.to_string(), value);
        }
        let original = current.clone();
        Self { current, original }
    }

    /// 重新执行构造式赋值（find/all 就地刷新、save 成功后、reload）
    ///
    /// 优先级：显式数据 -> 既有当前值 -> 声明默认值 -> Null，
    /// 之后基线值整体重置为新的当前值
    pub fn reapply(&mut self, definition: &EntityDefinition, data: &HashMap<String, DataValue>) {
        let mut next = HashMap::new();
        for (name, descriptor) in definition.iter() {
            let value = match data.get(name) {
                Some(value) => value.clone(),
                None => match self.current.get(name) {
                    Some(existing) => existing.clone(),
                    None => descriptor.resolve_default(),
                },
            };
            next.insert(name.to_string(), value);
        }
        self.original = next.clone();
        self.current = next;
    }

    /// 读取当前值（未知属性返回Null）
    pub fn get(&self, name: &str) -> DataValue {
        self.current.get(name).cloned().unwrap_or(DataValue::Null)
    }

    /// 写入当前值；基线值不动
    pub fn set(&mut self, name: &str, value: DataValue) {
        self.current.insert(name.to_string(), value);
    }

    /// 读取基线值（构造时捕获的"was"值）
    pub fn was(&self, name: &str) -> DataValue {
        self.original.get(name).cloned().unwrap_or(DataValue::Null)
    }

    /// 属性是否相对基线已修改
    pub fn property_changed(&self, name: &str) -> bool {
        self.get(name) != self.was(name)
    }

    /// 同时写入当前值与基线值（update_attributes 成功路径专用）
    pub fn advance_baseline(&mut self, name: &str, value: DataValue) {
        self.current.insert(name.to_string(), value.clone());
        self.original.insert(name.to_string(), value);
    }

    /// 导出当前值映射
    pub fn to_map(&self) -> HashMap<String, DataValue> {
        self.current.clone()
    }
}
