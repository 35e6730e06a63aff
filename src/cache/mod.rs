//! 身份缓存模块
//!
//! 每个模型一张 ID -> 活动实例 的映射，保证同一(模型, ID)在内存中
//! 至多存在一个实例；读取路径命中后就地刷新而不是构造副本

pub mod identity_cache;
pub mod stats;

// 重新导出主要的公共类型和结构体
pub use identity_cache::IdentityCache;
pub use stats::{CacheStats, CacheStatsSnapshot};
