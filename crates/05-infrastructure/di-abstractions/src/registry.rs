//! 实体注册抽象接口
//!
//! 提供工厂、常量值、构造函数与普通函数的注册入口

use crate::factory::{Constructor, Dependencies, Factory};
use crate::identifier::{Identifier, IntoIdentifier};
use crate::resolver::Resolve;
use infrastructure_common::{DependencyError, EntityKey, ScopePath};
use std::sync::Arc;

/// 注册选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// 目标作用域，`None` 表示根作用域
    pub scope: Option<ScopePath>,
    /// 是否替换已有绑定
    pub override_existing: bool,
}

impl RegisterOptions {
    /// 创建默认注册选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册到指定作用域
    pub fn in_scope(mut self, scope: impl Into<ScopePath>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// 替换已有绑定
    pub fn overriding(mut self) -> Self {
        self.override_existing = true;
        self
    }

    /// 实际生效的作用域
    pub fn target_scope(&self) -> ScopePath {
        self.scope.clone().unwrap_or_default()
    }
}

/// 注册接口
///
/// 实现方只需提供 [`Register::register`]，其余方法都基于它完成，
/// 并返回 `&mut Self` 以便链式调用。
pub trait Register {
    /// 登记一条绑定；未设置 `override_existing` 时重复键返回
    /// [`DependencyError::RegistrationConflict`]
    fn register(
        &mut self,
        key: EntityKey,
        factory: Factory,
        options: RegisterOptions,
    ) -> Result<&mut Self, DependencyError>;

    /// 注册工厂函数
    fn factory<T, F>(
        &mut self,
        id: impl IntoIdentifier<T>,
        factory: F,
        options: RegisterOptions,
    ) -> Result<&mut Self, DependencyError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolve) -> Result<Arc<T>, DependencyError> + Send + Sync + 'static,
    {
        let id = id.into_identifier();
        self.register(id.key().clone(), Factory::new(factory), options)
    }

    /// 注册常量值
    fn insert<T, V>(
        &mut self,
        id: impl IntoIdentifier<T>,
        value: V,
        options: RegisterOptions,
    ) -> Result<&mut Self, DependencyError>
    where
        T: ?Sized + Send + Sync + 'static,
        V: Into<Arc<T>>,
    {
        let id = id.into_identifier();
        self.register(id.key().clone(), Factory::constant(value.into()), options)
    }

    /// 以类型推导的标识注册构造函数
    fn add<T, C, D>(&mut self, constructor: C, dependencies: D) -> Result<&mut Self, DependencyError>
    where
        T: Send + Sync + 'static,
        D: Dependencies,
        C: Constructor<D::Output, Output = T>,
    {
        self.use_class(Identifier::<T>::of(), constructor, dependencies)
    }

    /// 以类型推导的标识注册 `T::default`
    fn add_default<T>(&mut self) -> Result<&mut Self, DependencyError>
    where
        T: Default + Send + Sync + 'static,
    {
        self.add(T::default, ())
    }

    /// 将标识绑定到常量值
    fn use_value<T, V>(&mut self, id: impl IntoIdentifier<T>, value: V) -> Result<&mut Self, DependencyError>
    where
        T: ?Sized + Send + Sync + 'static,
        V: Into<Arc<T>>,
    {
        self.insert(id, value, RegisterOptions::new())
    }

    /// 将标识绑定到工厂函数
    fn use_factory<T, F>(&mut self, id: impl IntoIdentifier<T>, factory: F) -> Result<&mut Self, DependencyError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolve) -> Result<Arc<T>, DependencyError> + Send + Sync + 'static,
    {
        self.factory(id, factory, RegisterOptions::new())
    }

    /// 将标识绑定到构造函数，构造结果可转换为 `Arc<T>`
    fn use_class<T, C, D>(
        &mut self,
        id: impl IntoIdentifier<T>,
        constructor: C,
        dependencies: D,
    ) -> Result<&mut Self, DependencyError>
    where
        T: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        C: Constructor<D::Output>,
        C::Output: Into<Arc<T>>,
    {
        let id = id.into_identifier();
        let factory = Factory::from_constructor::<T, C, D>(constructor, dependencies);
        self.register(id.key().clone(), factory, RegisterOptions::new())
    }

    /// 将标识绑定到普通函数，函数同时接收解析上下文
    fn use_function<T, D, F>(
        &mut self,
        id: impl IntoIdentifier<T>,
        dependencies: D,
        function: F,
    ) -> Result<&mut Self, DependencyError>
    where
        T: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        F: Fn(&dyn Resolve, D::Output) -> Result<Arc<T>, DependencyError> + Send + Sync + 'static,
    {
        let id = id.into_identifier();
        let factory = Factory::from_function::<T, D, F>(dependencies, function);
        self.register(id.key().clone(), factory, RegisterOptions::new())
    }

    /// 无条件替换标识的绑定
    fn override_factory<T, F>(&mut self, id: impl IntoIdentifier<T>, factory: F) -> Result<&mut Self, DependencyError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolve) -> Result<Arc<T>, DependencyError> + Send + Sync + 'static,
    {
        self.factory(id, factory, RegisterOptions::new().overriding())
    }
}
