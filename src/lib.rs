//! rat_quickmodel - 模型运行时核心
//!
//! 提供模型类的持久化生命周期（create/find/save/destroy）、属性脏跟踪、
//! 身份缓存、关系声明（has_many/belongs_to）与可链式合并的作用域查询，
//! 全部操作委托给可插拔的存储适配器

// 导出所有公共模块
pub mod error;
pub mod types;
pub mod config;
pub mod adapter;
pub mod model;
pub mod cache;
pub mod schema;
pub mod relation;
pub mod scope;

// 重新导出常用类型和函数
pub use error::{ModelError, ModelResult};
pub use types::*;
pub use config::{
    DestroyEvictionPolicy, SchemaConfig, SchemaConfigBuilder, optimistic_config, strict_config,
};
pub use adapter::{MemoryAdapter, StorageAdapter};
pub use model::{
    AttributeSet, DefaultValue, EntityDefinition, ModelInstance, PropertyDescriptor, SaveOptions,
};
pub use cache::{CacheStats, CacheStatsSnapshot, IdentityCache};
pub use schema::{ModelClass, Schema, Validator};
pub use relation::{HasManyAccessor, RelationDefinition, RelationKind, RelationParams};
pub use scope::{ScopeHandle, merge_conditions};

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 初始化rat_quickmodel库
///
/// 注意：日志系统由调用者自行初始化，本库不再自动初始化日志
pub fn init() {
    // 库的基本初始化逻辑
    // 日志系统由调用者负责初始化
}

/// 生成ObjectId字符串
///
/// 生成类似MongoDB ObjectId的24位十六进制字符串，内存适配器用它分配记录ID
/// 格式：时间戳(4字节) + 机器ID(3字节) + 进程ID(2字节) + 计数器(3字节)
///
/// # 返回值
/// 返回24位十六进制字符串
pub fn generate_object_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    // 获取当前时间戳（秒）
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    // 获取计数器值
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);

    // 简单的机器ID（基于进程ID）
    let machine_id = std::process::id() % 0xFFFFFF;

    // 格式化为24位十六进制字符串
    format!(
        "{:08x}{:06x}{:04x}{:06x}",
        timestamp,
        machine_id,
        (machine_id >> 8) & 0xFFFF,
        counter % 0xFFFFFF
    )
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
