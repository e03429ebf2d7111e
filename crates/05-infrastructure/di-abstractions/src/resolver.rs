//! 实体解析器抽象接口
//!
//! 提供依赖解析和实体实例获取的能力

use crate::identifier::{Identifier, IntoIdentifier};
use indexmap::IndexMap;
use infrastructure_common::{DependencyError, EntityKey, ScopePath, Variant};
use std::any::Any;
use std::sync::Arc;

/// 已构建的实体实例
///
/// 内部保存的是 `Arc<T>`，因此同样适用于 trait object 结果类型。
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 变体名到实例的有序映射
pub type InstanceMap = IndexMap<Variant, Instance>;

/// 变体名到类型化实例的有序映射
pub type VariantMap<T> = IndexMap<Variant, Arc<T>>;

/// 实体解析器 trait
///
/// 上下文与工厂内部使用的子解析器都实现此 trait，因此工厂内的依赖请求
/// 与顶层请求走同一套循环检测和深度限制。
pub trait Resolve {
    /// 解析单个实体；`optional` 模式下未找到时返回 `None`
    fn resolve_instance(
        &self,
        key: &EntityKey,
        options: &ResolveOptions,
    ) -> Result<Option<Instance>, DependencyError>;

    /// 解析 `key` 所属 kind 的全部变体
    fn resolve_all_instances(
        &self,
        key: &EntityKey,
        options: &ResolveOptions,
    ) -> Result<InstanceMap, DependencyError>;

    /// 当前解析所在的作用域
    fn scope(&self) -> &ScopePath;
}

/// 类型化的解析操作
pub trait ResolveExt: Resolve {
    /// 解析实体，未注册时返回 [`DependencyError::EntityNotFound`]
    fn get<T: ?Sized + 'static>(&self, id: impl IntoIdentifier<T>) -> Result<Arc<T>, DependencyError> {
        let id = id.into_identifier();
        match self.get_with(&id, ResolveOptions::default())? {
            Some(value) => Ok(value),
            None => Err(DependencyError::EntityNotFound {
                key: id.key().clone(),
                scope: self.scope().clone(),
            }),
        }
    }

    /// 使用指定选项解析实体
    fn get_with<T: ?Sized + 'static>(
        &self,
        id: impl IntoIdentifier<T>,
        options: ResolveOptions,
    ) -> Result<Option<Arc<T>>, DependencyError> {
        let id = id.into_identifier();
        self.resolve_instance(id.key(), &options)?
            .map(|instance| downcast(id.key(), &instance))
            .transpose()
    }

    /// 解析可选实体，未注册时返回 `None`
    fn get_optional<T: ?Sized + 'static>(
        &self,
        id: impl IntoIdentifier<T>,
    ) -> Result<Option<Arc<T>>, DependencyError> {
        self.get_with(id, ResolveOptions::new().with_optional())
    }

    /// 解析同一 kind 的全部变体
    fn get_all<T: ?Sized + 'static>(
        &self,
        id: impl IntoIdentifier<T>,
    ) -> Result<VariantMap<T>, DependencyError> {
        self.get_all_with(id, ResolveOptions::default())
    }

    /// 使用指定选项解析同一 kind 的全部变体
    fn get_all_with<T: ?Sized + 'static>(
        &self,
        id: impl IntoIdentifier<T>,
        options: ResolveOptions,
    ) -> Result<VariantMap<T>, DependencyError> {
        let id: Identifier<T> = id.into_identifier();
        self.resolve_all_instances(id.key(), &options)?
            .into_iter()
            .map(|(variant, instance)| {
                let key = EntityKey {
                    kind: id.key().kind.clone(),
                    variant: variant.clone(),
                };
                downcast(&key, &instance).map(|value| (variant, value))
            })
            .collect()
    }
}

impl<R: Resolve + ?Sized> ResolveExt for R {}

/// 将实例还原为 `Arc<T>`
pub fn downcast<T: ?Sized + 'static>(key: &EntityKey, instance: &Instance) -> Result<Arc<T>, DependencyError> {
    instance
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| DependencyError::TypeMismatch {
            key: key.clone(),
            expected: std::any::type_name::<T>(),
        })
}

/// 将 `Arc<T>` 包装为实例
pub fn into_instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Instance {
    Arc::new(value)
}

/// 解析选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// 仅在当前作用域查找，不委托给父上下文
    pub same_scope: bool,
    /// 未找到时返回空值而不是报错
    pub optional: bool,
    /// 解析全部变体时排除的变体名
    pub exclude: Vec<Variant>,
}

impl ResolveOptions {
    /// 创建默认解析选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 仅在当前作用域查找
    pub fn with_same_scope(mut self) -> Self {
        self.same_scope = true;
        self
    }

    /// 允许实体缺失
    pub fn with_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// 排除指定变体
    pub fn excluding(mut self, variant: impl Into<Variant>) -> Self {
        self.exclude.push(variant.into());
        self
    }

    /// 变体是否被排除
    pub fn is_excluded(&self, variant: &str) -> bool {
        self.exclude.iter().any(|excluded| &**excluded == variant)
    }
}
