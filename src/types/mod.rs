//! 通用类型定义
//!
//! 定义跨适配器的数据值类型与查询条件映射

pub mod data_value;

// 重新导出所有公共类型以保持API兼容性
pub use data_value::DataValue;

use std::collections::HashMap;

/// 查询条件映射（属性名 -> 期望值）
///
/// 过滤语义由适配器解释，核心只负责透传与合并
pub type ConditionMap = HashMap<String, DataValue>;

/// 便捷宏：构造查询条件映射
///
/// ```rust
/// use rat_quickmodel::{condition_map, DataValue};
///
/// let cond = condition_map! { "published" => DataValue::Bool(true) };
/// assert_eq!(cond.get("published"), Some(&DataValue::Bool(true)));
/// ```
#[macro_export]
macro_rules! condition_map {
    ( $( $key:expr => $value:expr ),* $(,)? ) => {{
        #[allow(unused_mut)]
        let mut map: $crate::types::ConditionMap = std::collections::HashMap::new();
        $( map.insert($key.to_string(), $value); )*
        map
    }};
}
