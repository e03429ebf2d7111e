//! 实体解析器
//!
//! 每次解析请求都对应一个 [`Resolver`]，它记录正在构建的实体链，
//! 用于检测循环依赖并限制解析深度。工厂拿到的 `&dyn Resolve` 就是下一级解析器。

use crate::context::Context;
use di_abstractions::{Factory, Instance, InstanceMap, Resolve, ResolveOptions};
use infrastructure_common::{DependencyError, EntityKey, ScopePath};
use tracing::trace;

/// 单次解析过程
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    context: &'a Context,
    stack: Vec<EntityKey>,
    depth: usize,
}

impl<'a> Resolver<'a> {
    /// 为上下文创建顶层解析器
    pub fn new(context: &'a Context) -> Self {
        Self {
            context,
            stack: Vec::new(),
            depth: 0,
        }
    }

    /// 解析器所属的上下文
    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// 正在构建的实体链，最外层在前
    pub fn stack(&self) -> &[EntityKey] {
        &self.stack
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// 进入 `key` 的构建
    fn next(&self, key: &EntityKey) -> Result<Resolver<'a>, DependencyError> {
        let depth = self.depth + 1;
        let limit = self.context.store().config().max_resolution_depth;
        if depth > limit {
            return Err(DependencyError::RecursionLimit {
                key: key.clone(),
                limit,
            });
        }

        let mut stack = self.stack.clone();
        let cyclic = stack.contains(key);
        stack.push(key.clone());
        if cyclic {
            return Err(DependencyError::CircularDependency { chain: stack });
        }

        Ok(Resolver {
            context: self.context,
            stack,
            depth,
        })
    }

    /// 在父上下文中继续当前解析，保留实体链与深度
    fn delegate(&self, parent: &'a Context) -> Resolver<'a> {
        trace!("委托父作用域 {} 解析, 当前作用域: {}", parent.scope(), self.context.scope());
        Resolver {
            context: parent,
            stack: self.stack.clone(),
            depth: self.depth,
        }
    }

    /// 解析单个实体
    pub fn resolve(&self, key: &EntityKey, options: &ResolveOptions) -> Result<Option<Instance>, DependencyError> {
        let context = self.context;
        if let Some(factory) = context.store().get(key, context.scope()) {
            return self.instantiate(key, factory).map(Some);
        }

        match context.parent() {
            Some(parent) if !options.same_scope => self.delegate(parent).resolve(key, options),
            _ if options.optional => Ok(None),
            _ => Err(DependencyError::EntityNotFound {
                key: key.clone(),
                scope: context.scope().clone(),
            }),
        }
    }

    /// 解析 `key` 所属 kind 的全部变体
    ///
    /// 只有本作用域完全没有该 kind 时才委托给父上下文；排除项在委托之后应用。
    pub fn resolve_all(&self, key: &EntityKey, options: &ResolveOptions) -> Result<InstanceMap, DependencyError> {
        let context = self.context;
        let factories = context.store().get_all(key, context.scope());
        if factories.is_empty() {
            return match context.parent() {
                Some(parent) if !options.same_scope => self.delegate(parent).resolve_all(key, options),
                _ => Ok(InstanceMap::new()),
            };
        }

        factories
            .into_iter()
            .filter(|(variant, _)| !options.is_excluded(variant))
            .map(|(variant, factory)| {
                let key = EntityKey {
                    kind: key.kind.clone(),
                    variant: variant.clone(),
                };
                self.instantiate(&key, &factory).map(|instance| (variant, instance))
            })
            .collect()
    }

    /// 构建实体，优先使用实体池中的实例
    fn instantiate(&self, key: &EntityKey, factory: &Factory) -> Result<Instance, DependencyError> {
        let pool = self.context.pool();
        if factory.is_memoized() {
            if let Some(instance) = pool.get(key) {
                return Ok(instance);
            }
        }

        let resolver = self.next(key)?;
        trace!("构建实体: {}, 作用域: {}, 深度: {}", key, self.context.scope(), resolver.depth);
        let instance = factory.invoke(&resolver).map_err(|err| match err {
            DependencyError::EntityNotFound { key: missing, scope } => DependencyError::MissingDependency {
                missing,
                requested_by: key.clone(),
                scope,
            },
            other => other,
        })?;

        if factory.is_memoized() {
            Ok(pool.get_or_insert(key, instance))
        } else {
            Ok(instance)
        }
    }
}

impl Resolve for Resolver<'_> {
    fn resolve_instance(
        &self,
        key: &EntityKey,
        options: &ResolveOptions,
    ) -> Result<Option<Instance>, DependencyError> {
        self.resolve(key, options)
    }

    fn resolve_all_instances(
        &self,
        key: &EntityKey,
        options: &ResolveOptions,
    ) -> Result<InstanceMap, DependencyError> {
        self.resolve_all(key, options)
    }

    fn scope(&self) -> &ScopePath {
        self.context.scope()
    }
}
