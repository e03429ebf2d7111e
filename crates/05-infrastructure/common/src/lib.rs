//! # Infrastructure Common
//!
//! 依赖注入容器各层共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`EntityKey`] - 实体键，由 kind 与 variant 组成
//! - [`TypeInfo`] - 类型信息，用于从 Rust 类型推导实体 kind
//! - [`ScopePath`] - 作用域路径
//! - [`DependencyError`] - 注册与解析阶段的错误

pub mod errors;
pub mod metadata;
pub mod scope;

pub use errors::*;
pub use metadata::*;
pub use scope::*;
