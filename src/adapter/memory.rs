//! 内存存储适配器
//!
//! 基于DashMap的进程内参考后端，表按模型名划分，记录按ID寻址
//! 主要服务于测试与演示；并记录操作日志供断言"适配器未被调用"类属性

use crate::debug_log;
use crate::error::ModelResult;
use crate::model_error;
use crate::types::{ConditionMap, DataValue};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::StorageAdapter;

/// 内存适配器
pub struct MemoryAdapter {
    /// 模型名 -> (记录ID -> 记录属性映射，含"id"键)
    tables: DashMap<String, DashMap<String, HashMap<String, DataValue>>>,
    /// 操作日志，格式 "操作:模型名"
    op_log: Mutex<Vec<String>>,
}

impl MemoryAdapter {
    /// 创建空的内存适配器
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            op_log: Mutex::new(Vec::new()),
        }
    }

    /// 获取已记录的操作日志快照
    pub fn logged_operations(&self) -> Vec<String> {
        self.op_log.lock().clone()
    }

    fn log(&self, op: &str, model: &str) {
        self.op_log.lock().push(format!("{}:{}", op, model));
    }

    fn matches(row: &HashMap<String, DataValue>, filter: &ConditionMap) -> bool {
        filter.iter().all(|(key, expected)| {
            let actual = row.get(key).cloned().unwrap_or(DataValue::Null);
            actual == *expected
        })
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn create(
        &self,
        model: &str,
        data: &HashMap<String, DataValue>,
    ) -> ModelResult<String> {
        self.log("create", model);
        let id = crate::generate_object_id();
        let mut row = data.clone();
        row.insert("id".to_string(), DataValue::String(id.clone()));

        let table = self.tables.entry(model.to_string()).or_default();
        table.insert(id.clone(), row);
        debug_log!("内存适配器创建记录: model={}, id={}", model, id);
        Ok(id)
    }

    async fn find_by_id(
        &self,
        model: &str,
        id: &str,
    ) -> ModelResult<Option<HashMap<String, DataValue>>> {
        self.log("find_by_id", model);
        let row = self
            .tables
            .get(model)
            .and_then(|table| table.get(id).map(|entry| entry.value().clone()));
        Ok(row)
    }

    async fn all(
        &self,
        model: &str,
        filter: Option<&ConditionMap>,
    ) -> ModelResult<Vec<HashMap<String, DataValue>>> {
        self.log("all", model);
        let rows = match self.tables.get(model) {
            Some(table) => table
                .iter()
                .filter(|entry| match filter {
                    Some(f) => Self::matches(entry.value(), f),
                    None => true,
                })
                .map(|entry| entry.value().clone())
                .collect(),
            None => Vec::new(),
        };
        Ok(rows)
    }

    async fn count(&self, model: &str) -> ModelResult<u64> {
        self.log("count", model);
        Ok(self.tables.get(model).map(|table| table.len() as u64).unwrap_or(0))
    }

    async fn exists(&self, model: &str, id: &str) -> ModelResult<bool> {
        self.log("exists", model);
        Ok(self
            .tables
            .get(model)
            .map(|table| table.contains_key(id))
            .unwrap_or(false))
    }

    async fn destroy(&self, model: &str, id: &str) -> ModelResult<()> {
        self.log("destroy", model);
        if let Some(table) = self.tables.get(model) {
            table.remove(id);
        }
        Ok(())
    }

    async fn destroy_all(&self, model: &str) -> ModelResult<()> {
        self.log("destroy_all", model);
        if let Some(table) = self.tables.get(model) {
            table.clear();
        }
        Ok(())
    }

    async fn save(&self, model: &str, data: &HashMap<String, DataValue>) -> ModelResult<()> {
        self.log("save", model);
        let id = match data.get("id") {
            Some(DataValue::String(id)) => id.clone(),
            _ => return Err(model_error!(adapter, "save要求数据中包含字符串ID")),
        };

        let table = self.tables.entry(model.to_string()).or_default();
        table.insert(id, data.clone());
        Ok(())
    }

    async fn update_attributes(
        &self,
        model: &str,
        id: &str,
        data: &HashMap<String, DataValue>,
    ) -> ModelResult<()> {
        self.log("update_attributes", model);
        let table = self
            .tables
            .get(model)
            .ok_or_else(|| model_error!(not_found, model, id))?;

        let mut row = table
            .get_mut(id)
            .ok_or_else(|| model_error!(not_found, model, id))?;
        for (key, value) in data {
            row.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    #[test]
    fn test_create_and_find() {
        let adapter = MemoryAdapter::new();
        let data = HashMap::from([("title".to_string(), DataValue::String("测试".to_string()))]);

        let id = block_on(adapter.create("post", &data)).unwrap();
        let row = block_on(adapter.find_by_id("post", &id)).unwrap().unwrap();
        assert_eq!(row.get("title"), Some(&DataValue::String("测试".to_string())));
        assert_eq!(row.get("id"), Some(&DataValue::String(id.clone())));

        assert!(block_on(adapter.exists("post", &id)).unwrap());
        assert_eq!(block_on(adapter.count("post")).unwrap(), 1);
    }

    #[test]
    fn test_filter_matching() {
        let adapter = MemoryAdapter::new();
        let published =
            HashMap::from([("published".to_string(), DataValue::Bool(true))]);
        let draft = HashMap::from([("published".to_string(), DataValue::Bool(false))]);

        block_on(adapter.create("post", &published)).unwrap();
        block_on(adapter.create("post", &draft)).unwrap();

        let filter = HashMap::from([("published".to_string(), DataValue::Bool(true))]);
        let rows = block_on(adapter.all("post", Some(&filter))).unwrap();
        assert_eq!(rows.len(), 1);

        let rows = block_on(adapter.all("post", None)).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_operation_log() {
        let adapter = MemoryAdapter::new();
        block_on(adapter.count("post")).unwrap();
        assert_eq!(adapter.logged_operations(), vec!["count:post".to_string()]);
    }
}
