//! 实体池
//!
//! 每个上下文持有一个实体池，同一上下文中的 `(kind, variant)` 只构建一次。

use di_abstractions::Instance;
use infrastructure_common::{EntityKey, Kind, Variant};
use parking_lot::Mutex;
use std::collections::HashMap;

/// 按 kind 和 variant 组织的已构建实例
#[derive(Debug, Default)]
pub struct EntityPool {
    entities: Mutex<HashMap<Kind, HashMap<Variant, Instance>>>,
}

impl EntityPool {
    /// 创建空的实体池
    pub fn new() -> Self {
        Self::default()
    }

    /// 查找已构建的实例
    pub fn get(&self, key: &EntityKey) -> Option<Instance> {
        self.entities
            .lock()
            .get(&key.kind)
            .and_then(|variants| variants.get(&key.variant))
            .cloned()
    }

    /// 放入实例；已有实例时保留先放入的一个并返回它
    pub fn get_or_insert(&self, key: &EntityKey, instance: Instance) -> Instance {
        self.entities
            .lock()
            .entry(key.kind.clone())
            .or_default()
            .entry(key.variant.clone())
            .or_insert(instance)
            .clone()
    }

    /// 是否已缓存 `key` 对应的实例
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.get(key).is_some()
    }

    /// 已构建实例的数量
    pub fn len(&self) -> usize {
        self.entities.lock().values().map(HashMap::len).sum()
    }

    /// 实体池是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
