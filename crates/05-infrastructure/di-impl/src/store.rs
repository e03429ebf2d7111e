//! 实体注册表
//!
//! [`Store`] 按 `作用域 → kind → variant` 三级保存工厂，并负责创建解析上下文。

use crate::context::Context;
use crate::plugin::Plugin;
use di_abstractions::{ContainerConfig, Factory, Register, RegisterOptions};
use indexmap::IndexMap;
use infrastructure_common::{DependencyError, EntityKey, Kind, ScopePath, Variant};
use std::collections::HashMap;
use tracing::debug;

/// 单个作用域内的绑定，同一 kind 的变体按注册顺序保存
type ScopeRegistry = HashMap<Kind, IndexMap<Variant, Factory>>;

/// 实体注册表
///
/// 克隆得到新的映射结构，工厂句柄在原注册表与克隆之间共享：
/// 之后在任何一方的注册都不会影响另一方。
#[derive(Debug, Clone, Default)]
pub struct Store {
    registry: HashMap<String, ScopeRegistry>,
    config: ContainerConfig,
    next_variant: u64,
}

impl Store {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定配置创建注册表
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 返回在指定作用域内注册的构建器
    pub fn scope(&mut self, scope: impl Into<ScopePath>) -> ScopedStore<'_> {
        ScopedStore {
            store: self,
            scope: scope.into(),
        }
    }

    /// 查找绑定，只在给定作用域内查找
    pub fn get(&self, key: &EntityKey, scope: &ScopePath) -> Option<&Factory> {
        self.registry
            .get(&scope.stringify())?
            .get(&key.kind)?
            .get(&key.variant)
    }

    /// 查找 `key` 所属 kind 的全部绑定，按注册顺序返回副本
    pub fn get_all(&self, key: &EntityKey, scope: &ScopePath) -> IndexMap<Variant, Factory> {
        self.registry
            .get(&scope.stringify())
            .and_then(|kinds| kinds.get(&key.kind))
            .cloned()
            .unwrap_or_default()
    }

    /// 给定作用域内是否存在绑定
    pub fn contains(&self, key: &EntityKey, scope: &ScopePath) -> bool {
        self.get(key, scope).is_some()
    }

    /// 作用域内已注册的 kind
    pub fn kinds(&self, scope: &ScopePath) -> Vec<Kind> {
        let mut kinds: Vec<Kind> = self
            .registry
            .get(&scope.stringify())
            .map(|kinds| kinds.keys().cloned().collect())
            .unwrap_or_default();
        kinds.sort();
        kinds
    }

    /// 生成本注册表内唯一的变体名
    pub fn unique_variant(&mut self) -> Variant {
        self.next_variant += 1;
        self.next_variant.to_string().into()
    }

    /// 创建根作用域上下文
    pub fn context(&self) -> Context {
        self.scoped_context(ScopePath::root(), None)
    }

    /// 创建指定作用域的上下文，`parent` 用于在本作用域未注册时委托查找
    ///
    /// 上下文持有注册表的快照，之后的注册对它不可见。
    pub fn scoped_context(&self, scope: impl Into<ScopePath>, parent: Option<&Context>) -> Context {
        Context::new(self, scope.into(), parent.cloned())
    }

    /// 安装插件
    pub fn install<P: Plugin + ?Sized>(&mut self, plugin: &P) -> Result<&mut Self, DependencyError> {
        debug!("安装插件: {}", plugin.name());
        plugin.register(self)?;
        Ok(self)
    }

    /// 按顺序安装一组插件
    pub fn install_all(&mut self, plugins: &[Box<dyn Plugin>]) -> Result<&mut Self, DependencyError> {
        for plugin in plugins {
            self.install(plugin.as_ref())?;
        }
        Ok(self)
    }

    fn insert_factory(
        &mut self,
        key: EntityKey,
        factory: Factory,
        options: RegisterOptions,
    ) -> Result<(), DependencyError> {
        let scope = options.target_scope();
        let variants = self
            .registry
            .entry(scope.stringify())
            .or_default()
            .entry(key.kind.clone())
            .or_default();

        if variants.contains_key(&key.variant) {
            if !options.override_existing {
                return Err(DependencyError::RegistrationConflict { key, scope });
            }
            debug!("替换实体绑定: {}, 作用域: {}", key, scope);
        } else {
            debug!("注册实体: {}, 作用域: {}", key, scope);
        }
        variants.insert(key.variant, factory);
        Ok(())
    }

    /// 无条件写入绑定，用于上下文自身的绑定
    pub(crate) fn replace_factory(&mut self, scope: &ScopePath, key: EntityKey, factory: Factory) {
        self.registry
            .entry(scope.stringify())
            .or_default()
            .entry(key.kind)
            .or_default()
            .insert(key.variant, factory);
    }
}

impl Register for Store {
    fn register(
        &mut self,
        key: EntityKey,
        factory: Factory,
        options: RegisterOptions,
    ) -> Result<&mut Self, DependencyError> {
        self.insert_factory(key, factory, options)?;
        Ok(self)
    }
}

/// 限定作用域的注册构建器
///
/// 通过它注册的绑定总是落在构建器的作用域中，忽略选项里的作用域。
#[derive(Debug)]
pub struct ScopedStore<'a> {
    store: &'a mut Store,
    scope: ScopePath,
}

impl ScopedStore<'_> {
    /// 构建器的目标作用域
    pub fn scope(&self) -> &ScopePath {
        &self.scope
    }

    /// 子作用域构建器
    pub fn child(&mut self, segment: impl Into<String>) -> ScopedStore<'_> {
        let scope = self.scope.child(segment);
        ScopedStore {
            store: &mut *self.store,
            scope,
        }
    }
}

impl Register for ScopedStore<'_> {
    fn register(
        &mut self,
        key: EntityKey,
        factory: Factory,
        mut options: RegisterOptions,
    ) -> Result<&mut Self, DependencyError> {
        options.scope = Some(self.scope.clone());
        self.store.insert_factory(key, factory, options)?;
        Ok(self)
    }
}
