//! 解析上下文
//!
//! 上下文是实体的生命周期边界：同一上下文内每个 `(kind, variant)` 只构建一次，
//! 子上下文在本作用域找不到绑定时委托给父上下文。
//!
//! 上下文在自己的作用域中绑定 [`ContextRef`]，工厂可以把它作为依赖保存下来，
//! 之后再按需解析其它实体。`ContextRef` 不持有上下文，实体池中的实体因此不会让上下文无法释放。

use crate::pool::EntityPool;
use crate::resolver::Resolver;
use crate::store::Store;
use di_abstractions::{Factory, Identifier, Instance, InstanceMap, Resolve, ResolveOptions};
use infrastructure_common::{DependencyError, EntityKey, ScopePath};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// 解析上下文
///
/// 克隆只复制句柄；比较按身份进行。需要长期保存上下文的实体应持有 [`ContextRef`]。
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    store: Store,
    scope: ScopePath,
    parent: Option<Context>,
    pool: EntityPool,
}

impl Context {
    pub(crate) fn new(store: &Store, scope: ScopePath, parent: Option<Context>) -> Self {
        debug!(
            "创建上下文, 作用域: {}, 父作用域: {}",
            scope,
            parent
                .as_ref()
                .map_or_else(|| String::from("-"), |parent| parent.scope().to_string())
        );

        let inner = Arc::new_cyclic(|weak: &Weak<ContextInner>| {
            let mut store = store.clone();
            let binding = self_binding(weak.clone(), &scope);
            store.replace_factory(&scope, Identifier::<ContextRef>::of().key().clone(), binding);
            ContextInner {
                store,
                scope,
                parent,
                pool: EntityPool::new(),
            }
        });
        Self { inner }
    }

    /// 上下文持有的注册表快照
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// 上下文所在的作用域
    pub fn scope(&self) -> &ScopePath {
        &self.inner.scope
    }

    /// 父上下文
    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    /// 本上下文的实体池
    pub fn pool(&self) -> &EntityPool {
        &self.inner.pool
    }

    /// 创建不持有上下文的引用
    pub fn downgrade(&self) -> ContextRef {
        ContextRef {
            inner: Arc::downgrade(&self.inner),
            scope: self.inner.scope.clone(),
        }
    }

    /// 以当前上下文为父上下文，创建下一级作用域的上下文
    pub fn child(&self, segment: impl Into<String>) -> Context {
        self.store().scoped_context(self.scope().child(segment), Some(self))
    }
}

/// 上下文对自身的绑定
fn self_binding(weak: Weak<ContextInner>, scope: &ScopePath) -> Factory {
    let scope = scope.clone();
    Factory::new(move |_: &dyn Resolve| {
        Ok(Arc::new(ContextRef {
            inner: weak.clone(),
            scope: scope.clone(),
        }))
    })
}

/// 上下文的弱引用
///
/// 上下文释放后，通过它的解析返回 [`DependencyError::ContextReleased`]。
#[derive(Clone)]
pub struct ContextRef {
    inner: Weak<ContextInner>,
    scope: ScopePath,
}

impl ContextRef {
    /// 上下文仍存活时返回它的句柄
    pub fn upgrade(&self) -> Option<Context> {
        self.inner.upgrade().map(|inner| Context { inner })
    }

    /// 被引用上下文的作用域
    pub fn scope(&self) -> &ScopePath {
        &self.scope
    }

    fn context(&self) -> Result<Context, DependencyError> {
        self.upgrade().ok_or_else(|| DependencyError::ContextReleased {
            scope: self.scope.clone(),
        })
    }
}

impl Resolve for ContextRef {
    fn resolve_instance(
        &self,
        key: &EntityKey,
        options: &ResolveOptions,
    ) -> Result<Option<Instance>, DependencyError> {
        self.context()?.resolve_instance(key, options)
    }

    fn resolve_all_instances(
        &self,
        key: &EntityKey,
        options: &ResolveOptions,
    ) -> Result<InstanceMap, DependencyError> {
        self.context()?.resolve_all_instances(key, options)
    }

    fn scope(&self) -> &ScopePath {
        &self.scope
    }
}

impl PartialEq<Context> for ContextRef {
    fn eq(&self, other: &Context) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&other.inner))
    }
}

impl fmt::Debug for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextRef")
            .field("scope", &self.scope)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Resolve for Context {
    fn resolve_instance(
        &self,
        key: &EntityKey,
        options: &ResolveOptions,
    ) -> Result<Option<Instance>, DependencyError> {
        Resolver::new(self).resolve(key, options)
    }

    fn resolve_all_instances(
        &self,
        key: &EntityKey,
        options: &ResolveOptions,
    ) -> Result<InstanceMap, DependencyError> {
        Resolver::new(self).resolve_all(key, options)
    }

    fn scope(&self) -> &ScopePath {
        &self.inner.scope
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("scope", &self.inner.scope)
            .field("parent", &self.inner.parent.as_ref().map(Context::scope))
            .field("pooled", &self.inner.pool.len())
            .finish()
    }
}
