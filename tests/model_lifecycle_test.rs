//! 模型生命周期集成测试
//!
//! 覆盖默认值求值、脏跟踪、身份缓存同一性、草稿保存委托、
//! 属性更新基线推进与删除驱逐策略

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rat_quickmodel::{
        DataValue, DestroyEvictionPolicy, EntityDefinition, MemoryAdapter, ModelResult,
        PropertyDescriptor, SaveOptions, Schema, SchemaConfig, StorageAdapter, condition_map,
        optimistic_config, properties,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn post_definition() -> EntityDefinition {
        properties! {
            title: PropertyDescriptor::new().with_default(DataValue::String("未命名".to_string())),
            views: PropertyDescriptor::new().with_default(DataValue::Int(0)),
            token: PropertyDescriptor::new().with_producer(|| DataValue::Uuid(uuid::Uuid::new_v4())),
            body: PropertyDescriptor::new(),
        }
    }

    #[test]
    fn test_defaults_applied_per_instance() {
        println!("🔍 测试每实例默认值求值");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter, optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let first = posts.build(HashMap::new());
        let second = posts.build(HashMap::new());

        assert_eq!(first.get("title"), DataValue::String("未命名".to_string()));
        assert_eq!(first.get("views"), DataValue::Int(0));
        assert!(first.get("body").is_null());

        // 生产者默认值每实例独立求值，两个实例不共享引用
        assert_ne!(first.get("token"), second.get("token"));
        println!("✅ 默认值测试完成");
    }

    #[test]
    fn test_property_changed_tracking() {
        println!("🔍 测试脏跟踪");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter, optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let post = posts.build(condition_map! { "views" => DataValue::Int(1) });
        assert!(!post.property_changed("views"));
        assert!(!post.property_changed("title"));

        post.set("views", DataValue::Int(2));
        assert!(post.property_changed("views"));
        assert_eq!(post.was("views"), DataValue::Int(1));

        post.set("views", DataValue::Int(1));
        assert!(!post.property_changed("views"));
        println!("✅ 脏跟踪测试完成");
    }

    #[tokio::test]
    async fn test_create_then_find_identity() {
        println!("🔍 测试身份缓存同一性");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter, optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let created = posts
            .create(condition_map! { "title" => DataValue::String("标题".to_string()) })
            .await
            .unwrap();
        let id = created.id().unwrap();
        assert!(!created.is_new_record());

        let found = posts.find(&id).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&created, &found));

        let listed = posts.all(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(Arc::ptr_eq(&created, &listed[0]));

        let stats = schema.cache_stats("post").unwrap();
        assert!(stats.hits >= 2);
        println!("✅ 身份缓存测试完成");
    }

    #[tokio::test]
    async fn test_find_refreshes_in_place() {
        println!("🔍 测试缓存命中就地刷新");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter.clone(), optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let post = posts
            .create(condition_map! { "views" => DataValue::Int(1) })
            .await
            .unwrap();
        let id = post.id().unwrap();

        // 绕过核心直接改底层数据，模拟外部写入
        adapter
            .update_attributes("post", &id, &condition_map! { "views" => DataValue::Int(42) })
            .await
            .unwrap();

        let reloaded = post.reload().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&post, &reloaded));
        assert_eq!(post.get("views"), DataValue::Int(42));
        // 刷新重置基线，不视为本地修改
        assert!(!post.property_changed("views"));
        println!("✅ 就地刷新测试完成");
    }

    #[tokio::test]
    async fn test_draft_save_delegates_to_create() {
        println!("🔍 测试草稿保存委托create且只验证一次");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter, optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let validations = Arc::new(AtomicUsize::new(0));
        let counter = validations.clone();
        posts.set_validator(move |_instance| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        let draft = posts.build(condition_map! { "title" => DataValue::String("草稿".to_string()) });
        assert!(draft.is_new_record());

        draft.save(SaveOptions::default()).await.unwrap();

        // save 验证一次，create 路径识别草稿种子后不再重复验证
        assert_eq!(validations.load(Ordering::SeqCst), 1);
        let id = draft.id().unwrap();

        let found = posts.find(&id).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&draft, &found));
        println!("✅ 草稿保存测试完成");
    }

    #[tokio::test]
    async fn test_save_persisted_resets_baseline() {
        println!("🔍 测试已持久化实例的保存");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter.clone(), optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let post = posts
            .create(condition_map! { "views" => DataValue::Int(1) })
            .await
            .unwrap();
        let id = post.id().unwrap();

        post.set("views", DataValue::Int(5));
        assert!(post.property_changed("views"));

        post.save(SaveOptions::default()).await.unwrap();

        assert!(!post.property_changed("views"));
        let row = adapter.find_by_id("post", &id).await.unwrap().unwrap();
        assert_eq!(row.get("views"), Some(&DataValue::Int(5)));
        println!("✅ 保存测试完成");
    }

    #[tokio::test]
    async fn test_update_attributes_invalid_skips_adapter() {
        println!("🔍 测试无效更新不触碰适配器");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter.clone(), optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        posts.set_validator(|instance| {
            instance.get("views").as_int().map_or(true, |views| views >= 0)
        });

        let post = posts
            .create(condition_map! { "views" => DataValue::Int(1) })
            .await
            .unwrap();
        let id = post.id().unwrap();
        let ops_before = adapter.logged_operations().len();

        let result = post
            .update_attributes(condition_map! { "views" => DataValue::Int(-5) })
            .await;
        assert!(result.is_err());

        // 赋值先于验证，失败后赋值在实例上仍然可见
        assert_eq!(post.get("views"), DataValue::Int(-5));
        // 适配器未被调用，底层记录保持原值
        assert_eq!(adapter.logged_operations().len(), ops_before);
        let row = adapter.find_by_id("post", &id).await.unwrap().unwrap();
        assert_eq!(row.get("views"), Some(&DataValue::Int(1)));
        println!("✅ 无效更新测试完成");
    }

    #[tokio::test]
    async fn test_update_attributes_advances_baseline() {
        println!("🔍 测试有效更新推进基线");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter.clone(), optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let post = posts
            .create(condition_map! { "views" => DataValue::Int(1) })
            .await
            .unwrap();
        let id = post.id().unwrap();

        post.update_attribute("views", DataValue::Int(9)).await.unwrap();

        assert_eq!(post.get("views"), DataValue::Int(9));
        assert_eq!(post.was("views"), DataValue::Int(9));
        assert!(!post.property_changed("views"));

        let row = adapter.find_by_id("post", &id).await.unwrap().unwrap();
        assert_eq!(row.get("views"), Some(&DataValue::Int(9)));
        println!("✅ 基线推进测试完成");
    }

    #[tokio::test]
    async fn test_destroy_all_then_find_returns_none() {
        println!("🔍 测试批量删除后查找");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter, optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let first = posts.create(HashMap::new()).await.unwrap();
        let second = posts.create(HashMap::new()).await.unwrap();
        let first_id = first.id().unwrap();

        assert_eq!(posts.count().await.unwrap(), 2);
        assert!(posts.exists(&second.id().unwrap()).await.unwrap());

        posts.destroy_all().await.unwrap();

        // 记录不存在不是错误
        let found = posts.find(&first_id).await.unwrap();
        assert!(found.is_none());
        assert_eq!(posts.count().await.unwrap(), 0);
        println!("✅ 批量删除测试完成");
    }

    /// 包装内存适配器，可开关destroy失败，用于驱逐策略验证
    struct FlakyDestroyAdapter {
        inner: MemoryAdapter,
        fail_destroy: AtomicBool,
    }

    #[async_trait]
    impl StorageAdapter for FlakyDestroyAdapter {
        async fn create(
            &self,
            model: &str,
            data: &HashMap<String, DataValue>,
        ) -> ModelResult<String> {
            self.inner.create(model, data).await
        }

        async fn find_by_id(
            &self,
            model: &str,
            id: &str,
        ) -> ModelResult<Option<HashMap<String, DataValue>>> {
            self.inner.find_by_id(model, id).await
        }

        async fn all(
            &self,
            model: &str,
            filter: Option<&HashMap<String, DataValue>>,
        ) -> ModelResult<Vec<HashMap<String, DataValue>>> {
            self.inner.all(model, filter).await
        }

        async fn count(&self, model: &str) -> ModelResult<u64> {
            self.inner.count(model).await
        }

        async fn exists(&self, model: &str, id: &str) -> ModelResult<bool> {
            self.inner.exists(model, id).await
        }

        async fn destroy(&self, model: &str, id: &str) -> ModelResult<()> {
            if self.fail_destroy.load(Ordering::SeqCst) {
                return Err(rat_quickmodel::ModelError::AdapterError {
                    message: "模拟删除失败".to_string(),
                });
            }
            self.inner.destroy(model, id).await
        }

        async fn destroy_all(&self, model: &str) -> ModelResult<()> {
            self.inner.destroy_all(model).await
        }

        async fn save(&self, model: &str, data: &HashMap<String, DataValue>) -> ModelResult<()> {
            self.inner.save(model, data).await
        }

        async fn update_attributes(
            &self,
            model: &str,
            id: &str,
            data: &HashMap<String, DataValue>,
        ) -> ModelResult<()> {
            self.inner.update_attributes(model, id, data).await
        }
    }

    #[tokio::test]
    async fn test_destroy_eviction_policies() {
        println!("🔍 测试删除驱逐策略");
        // 乐观驱逐：适配器失败也驱逐，下次find物化新实例
        let adapter = Arc::new(FlakyDestroyAdapter {
            inner: MemoryAdapter::new(),
            fail_destroy: AtomicBool::new(true),
        });
        let schema = Schema::new(adapter, optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        let post = posts.create(HashMap::new()).await.unwrap();
        let id = post.id().unwrap();
        assert!(post.destroy().await.is_err());

        let found = posts.find(&id).await.unwrap().unwrap();
        assert!(!Arc::ptr_eq(&post, &found));

        // 仅成功后驱逐：适配器失败时缓存条目保留，同一实例继续可见
        let adapter = Arc::new(FlakyDestroyAdapter {
            inner: MemoryAdapter::new(),
            fail_destroy: AtomicBool::new(true),
        });
        let config = SchemaConfig::builder()
            .destroy_eviction(DestroyEvictionPolicy::OnSuccess)
            .build()
            .unwrap();
        let schema = Schema::new(adapter, config);
        let posts = schema.define_model("post", post_definition()).unwrap();

        let post = posts.create(HashMap::new()).await.unwrap();
        let id = post.id().unwrap();
        assert!(post.destroy().await.is_err());

        let found = posts.find(&id).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&post, &found));
        println!("✅ 驱逐策略测试完成");
    }

    #[tokio::test]
    async fn test_create_validation_failure_skips_adapter() {
        println!("🔍 测试创建时验证失败");
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter.clone(), optimistic_config());
        let posts = schema.define_model("post", post_definition()).unwrap();

        posts.set_validator(|instance| !instance.get("title").is_null());

        let result = posts
            .create(condition_map! { "title" => DataValue::Null })
            .await;
        assert!(matches!(
            result,
            Err(rat_quickmodel::ModelError::ValidationError { .. })
        ));
        assert_eq!(posts.count().await.unwrap(), 0);
        println!("✅ 创建验证测试完成");
    }
}
