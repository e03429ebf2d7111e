//! 实体工厂抽象接口
//!
//! 提供工厂句柄、依赖列表与构造函数的统一抽象

use crate::identifier::Identifier;
use crate::resolver::{into_instance, Instance, Resolve, ResolveExt};
use infrastructure_common::DependencyError;
use std::fmt;
use std::sync::Arc;

/// 工厂函数类型
pub type FactoryFn = dyn Fn(&dyn Resolve) -> Result<Instance, DependencyError> + Send + Sync;

/// 实体工厂
///
/// 克隆只复制句柄，工厂函数本身在各个副本之间共享。
#[derive(Clone)]
pub struct Factory {
    call: Arc<FactoryFn>,
    memoize: bool,
}

impl Factory {
    /// 从类型化的工厂函数创建
    pub fn new<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn Resolve) -> Result<Arc<T>, DependencyError> + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(move |cx: &dyn Resolve| factory(cx).map(into_instance)),
            memoize: true,
        }
    }

    /// 始终返回同一个值的工厂
    pub fn constant<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::new(move |_: &dyn Resolve| Ok(value.clone()))
    }

    /// 由构造函数与依赖列表合成的工厂
    ///
    /// 构造函数只接收解析后的依赖，按声明顺序传入。
    pub fn from_constructor<T, C, D>(constructor: C, dependencies: D) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        C: Constructor<D::Output>,
        C::Output: Into<Arc<T>>,
    {
        Self::new::<T, _>(move |cx: &dyn Resolve| {
            let args = dependencies.resolve_all(cx)?;
            Ok(constructor.construct(args).into())
        })
    }

    /// 由普通函数与依赖列表合成的工厂
    ///
    /// 函数同时接收解析上下文与解析后的依赖。
    pub fn from_function<T, D, F>(dependencies: D, function: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        F: Fn(&dyn Resolve, D::Output) -> Result<Arc<T>, DependencyError> + Send + Sync + 'static,
    {
        Self::new::<T, _>(move |cx: &dyn Resolve| {
            let args = dependencies.resolve_all(cx)?;
            function(cx, args)
        })
    }

    /// 标记为不进入实体池，每次解析都重新调用
    pub fn unpooled(mut self) -> Self {
        self.memoize = false;
        self
    }

    /// 调用工厂
    pub fn invoke(&self, cx: &dyn Resolve) -> Result<Instance, DependencyError> {
        (self.call)(cx)
    }

    /// 结果是否进入实体池
    pub fn is_memoized(&self) -> bool {
        self.memoize
    }

    /// 两个句柄是否指向同一个工厂函数
    pub fn ptr_eq(&self, other: &Factory) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("memoize", &self.memoize)
            .field("factory", &"<function>")
            .finish()
    }
}

/// 单个依赖声明
pub trait Dependency: Send + Sync + 'static {
    /// 解析结果类型
    type Output;

    /// 解析依赖
    fn resolve(&self, cx: &dyn Resolve) -> Result<Self::Output, DependencyError>;
}

impl<T: ?Sized + 'static> Dependency for Identifier<T> {
    type Output = Arc<T>;

    fn resolve(&self, cx: &dyn Resolve) -> Result<Self::Output, DependencyError> {
        cx.get(self)
    }
}

/// 依赖某一 kind 的全部变体，按注册顺序传入
#[derive(Debug, Clone)]
pub struct All<T: ?Sized>(pub Identifier<T>);

impl<T: ?Sized + 'static> Dependency for All<T> {
    type Output = Vec<Arc<T>>;

    fn resolve(&self, cx: &dyn Resolve) -> Result<Self::Output, DependencyError> {
        Ok(cx.get_all(&self.0)?.into_values().collect())
    }
}

/// 声明对某一 kind 全部变体的依赖
pub fn all<T: ?Sized>(id: &Identifier<T>) -> All<T> {
    All(id.clone())
}

/// 有序依赖列表，以元组表示
pub trait Dependencies: Send + Sync + 'static {
    /// 解析结果元组
    type Output;

    /// 按声明顺序解析全部依赖
    fn resolve_all(&self, cx: &dyn Resolve) -> Result<Self::Output, DependencyError>;
}

impl Dependencies for () {
    type Output = ();

    #[inline]
    fn resolve_all(&self, _: &dyn Resolve) -> Result<Self::Output, DependencyError> {
        Ok(())
    }
}

macro_rules! define_dependencies ({ $($D:ident)+ } => {
    impl<$($D: Dependency,)+> Dependencies for ($($D,)+) {
        type Output = ($(<$D as Dependency>::Output,)+);

        #[inline]
        #[allow(non_snake_case)]
        fn resolve_all(&self, cx: &dyn Resolve) -> Result<Self::Output, DependencyError> {
            let ($($D,)+) = self;
            Ok(($($D.resolve(cx)?,)+))
        }
    }
});

define_dependencies! { D1 }
define_dependencies! { D1 D2 }
define_dependencies! { D1 D2 D3 }
define_dependencies! { D1 D2 D3 D4 }
define_dependencies! { D1 D2 D3 D4 D5 }
define_dependencies! { D1 D2 D3 D4 D5 D6 }

/// 构造函数
///
/// 任意 `Fn(A1, ..., An) -> R` 都是构造函数，参数为解析后的依赖元组展开。
pub trait Constructor<Args>: Send + Sync + 'static {
    /// 构造结果类型
    type Output;

    /// 使用依赖构造实例
    fn construct(&self, args: Args) -> Self::Output;
}

impl<F, R> Constructor<()> for F
where
    F: Fn() -> R + Send + Sync + 'static,
{
    type Output = R;

    #[inline]
    fn construct(&self, _: ()) -> Self::Output {
        self()
    }
}

macro_rules! define_constructor ({ $($A:ident)+ } => {
    impl<F, R, $($A,)+> Constructor<($($A,)+)> for F
    where
        F: Fn($($A),+) -> R + Send + Sync + 'static,
    {
        type Output = R;

        #[inline]
        #[allow(non_snake_case)]
        fn construct(&self, ($($A,)+): ($($A,)+)) -> Self::Output {
            (self)($($A),+)
        }
    }
});

define_constructor! { A1 }
define_constructor! { A1 A2 }
define_constructor! { A1 A2 A3 }
define_constructor! { A1 A2 A3 A4 }
define_constructor! { A1 A2 A3 A4 A5 }
define_constructor! { A1 A2 A3 A4 A5 A6 }
