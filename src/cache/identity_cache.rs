//! 身份缓存实现

use crate::debug_log;
use crate::model::ModelInstance;
use dashmap::DashMap;
use std::sync::Arc;

use super::stats::{CacheStats, CacheStatsSnapshot};

/// 单个模型的身份缓存：持久化ID -> 活动实例
///
/// 不变量：同一ID至多对应一个活动实例；find/all 必须先查缓存，
/// 命中时在原实例上就地刷新属性，保持外部持有引用的同一性
pub struct IdentityCache {
    entries: DashMap<String, Arc<ModelInstance>>,
    stats: CacheStats,
}

impl IdentityCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            stats: CacheStats::new(),
        }
    }

    /// 查找活动实例
    pub fn get(&self, id: &str) -> Option<Arc<ModelInstance>> {
        match self.entries.get(id) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value().clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// 登记活动实例
    pub fn insert(&self, id: &str, instance: Arc<ModelInstance>) {
        self.entries.insert(id.to_string(), instance);
    }

    /// 驱逐单个条目
    pub fn remove(&self, id: &str) -> Option<Arc<ModelInstance>> {
        let removed = self.entries.remove(id).map(|(_, instance)| instance);
        if removed.is_some() {
            self.stats.record_evictions(1);
            debug_log!("身份缓存驱逐条目: id={}", id);
        }
        removed
    }

    /// 清空全部条目（destroy_all 成功路径）
    pub fn clear(&self) {
        let evicted = self.entries.len() as u64;
        self.entries.clear();
        self.stats.record_evictions(evicted);
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否存在指定条目（不计入统计）
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// 导出统计快照
    pub fn stats_snapshot(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}
