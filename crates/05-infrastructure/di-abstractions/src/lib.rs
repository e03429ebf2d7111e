//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义实体标识、工厂与依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`Identifier`] - 带结果类型的实体标识
//! - [`Factory`] - 实体工厂
//! - [`Register`] - 注册接口
//! - [`Resolve`] / [`ResolveExt`] - 解析接口
//! - [`ContainerConfig`] - 容器配置

pub mod container;
pub mod factory;
pub mod identifier;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use factory::*;
pub use identifier::*;
pub use registry::*;
pub use resolver::*;
