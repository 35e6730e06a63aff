//! 错误类型定义
//!
//! 模型运行时的统一错误分类：验证失败、权限拒绝、记录不存在、
//! 适配器透传错误以及注册/配置类错误
//!
//! 注意：find 查不到记录不是错误，读取路径返回 `Ok(None)`

use thiserror::Error;

/// 模型运行时统一结果类型
pub type ModelResult<T> = Result<T, ModelError>;

/// 模型运行时错误
#[derive(Error, Debug)]
pub enum ModelError {
    /// 属性验证未通过（is_valid 谓词返回 false）
    #[error("验证失败: 模型 {model}: {message}")]
    ValidationError { model: String, message: String },

    /// has_many 嵌套 find/destroy：外键与所有者不匹配
    #[error("权限拒绝: 模型 {model} 记录 {id} 不属于当前所有者")]
    PermissionDenied { model: String, id: String },

    /// has_many 嵌套操作要求的记录不存在
    #[error("记录不存在: 模型 {model} 记录 {id}")]
    NotFound { model: String, id: String },

    /// 适配器错误，原样透传，不做解释
    #[error("适配器错误: {message}")]
    AdapterError { message: String },

    /// 模型未在Schema注册
    #[error("模型未注册: {model}")]
    ModelNotRegistered { model: String },

    /// 关系未声明或类型不匹配
    #[error("关系未定义: {model}.{relation}")]
    RelationNotFound { model: String, relation: String },

    /// 作用域未注册
    #[error("作用域未定义: {model}.{scope}")]
    ScopeNotFound { model: String, scope: String },

    /// ID为一次性写入字段，禁止二次分配
    #[error("ID已分配，禁止重复分配: 模型 {model}")]
    IdAlreadyAssigned { model: String },

    /// 操作要求记录已持久化（存在ID）
    #[error("记录缺少ID: 模型 {model}")]
    MissingId { model: String },

    /// 序列化/数据格式错误
    #[error("序列化错误: {message}")]
    SerializationError { message: String },

    /// 配置错误（构建器缺少必填项等）
    #[error("配置错误: {message}")]
    ConfigError { message: String },
}

/// 便捷错误构造宏
///
/// 与错误枚举的结构体变体配套，省去重复的 to_string 样板
#[macro_export]
macro_rules! model_error {
    (validation, $model:expr, $msg:expr) => {
        $crate::error::ModelError::ValidationError {
            model: $model.to_string(),
            message: $msg.to_string(),
        }
    };
    (permission, $model:expr, $id:expr) => {
        $crate::error::ModelError::PermissionDenied {
            model: $model.to_string(),
            id: $id.to_string(),
        }
    };
    (not_found, $model:expr, $id:expr) => {
        $crate::error::ModelError::NotFound {
            model: $model.to_string(),
            id: $id.to_string(),
        }
    };
    (adapter, $msg:expr) => {
        $crate::error::ModelError::AdapterError {
            message: $msg.to_string(),
        }
    };
    (serialization, $msg:expr) => {
        $crate::error::ModelError::SerializationError {
            message: $msg.to_string(),
        }
    };
    (config, $msg:expr) => {
        $crate::error::ModelError::ConfigError {
            message: $msg.to_string(),
        }
    };
}
