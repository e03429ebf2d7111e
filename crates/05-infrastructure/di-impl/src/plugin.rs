//! 插件
//!
//! 插件把一组相关的注册打包在一起，由 [`Store::install`] 统一安装。

use crate::store::Store;
use infrastructure_common::DependencyError;

/// 注册插件
///
/// 闭包 `Fn(&mut Store) -> Result<(), DependencyError>` 自动实现此 trait。
pub trait Plugin {
    /// 插件名称，用于日志
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 向注册表写入绑定
    fn register(&self, store: &mut Store) -> Result<(), DependencyError>;
}

impl<F> Plugin for F
where
    F: Fn(&mut Store) -> Result<(), DependencyError>,
{
    fn register(&self, store: &mut Store) -> Result<(), DependencyError> {
        self(store)
    }
}
