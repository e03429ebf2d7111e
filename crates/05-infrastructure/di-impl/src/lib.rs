//! # 依赖注入具体实现
//!
//! 提供实体注册表、解析上下文、解析器与实体池的具体实现。
//!
//! ```
//! use di_impl::prelude::*;
//! use std::sync::Arc;
//!
//! struct Thing;
//! struct Hello(Arc<Thing>);
//!
//! let thing = Identifier::<Thing>::of();
//! let mut store = Store::new();
//! store.add(|| Thing, ())?.add(Hello, (thing.clone(),))?;
//!
//! let cx = store.context();
//! let hello = cx.get(Identifier::<Hello>::of())?;
//! assert!(Arc::ptr_eq(&hello.0, &cx.get(&thing)?));
//! # Ok::<(), DependencyError>(())
//! ```

pub mod context;
pub mod plugin;
pub mod pool;
pub mod resolver;
pub mod store;

pub use context::{Context, ContextRef};
pub use plugin::Plugin;
pub use pool::EntityPool;
pub use resolver::Resolver;
pub use store::{ScopedStore, Store};

/// 常用类型与 trait
pub mod prelude {
    pub use crate::{Context, ContextRef, Plugin, Store};
    pub use di_abstractions::{
        all, identifier, All, ContainerConfig, Factory, Identifier, Register, RegisterOptions, Resolve,
        ResolveExt, ResolveOptions,
    };
    pub use infrastructure_common::{DependencyError, ScopePath};
}
