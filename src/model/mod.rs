//! 模型定义与实例模块
//!
//! 实体定义描述模型有哪些属性及其默认值；属性集负责当前值/基线值
//! 与脏跟踪；模型实例承载持久化生命周期

pub mod attributes;
pub mod definition;
pub mod instance;

// 重新导出主要的公共类型和结构体
pub use attributes::AttributeSet;
pub use definition::{DefaultValue, EntityDefinition, PropertyDescriptor};
pub use instance::{ModelInstance, SaveOptions};
