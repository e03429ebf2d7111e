//! 错误类型定义

use crate::metadata::EntityKey;
use crate::scope::ScopePath;
use thiserror::Error;

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("实体重复注册: {key}, 作用域: {scope}（替换已有绑定请使用 override）")]
    RegistrationConflict { key: EntityKey, scope: ScopePath },

    #[error("实体未找到: {key}, 作用域: {scope}")]
    EntityNotFound { key: EntityKey, scope: ScopePath },

    #[error("缺少依赖: {requested_by} 依赖的 {missing} 未注册, 作用域: {scope}")]
    MissingDependency {
        missing: EntityKey,
        requested_by: EntityKey,
        scope: ScopePath,
    },

    #[error("检测到循环依赖: {}", format_chain(.chain))]
    CircularDependency { chain: Vec<EntityKey> },

    #[error("超出最大解析深度 {limit}, 正在解析: {key}")]
    RecursionLimit { key: EntityKey, limit: usize },

    #[error("实体类型不匹配: {key}, 期望类型: {expected}")]
    TypeMismatch {
        key: EntityKey,
        expected: &'static str,
    },

    #[error("上下文已释放, 作用域: {scope}")]
    ContextReleased { scope: ScopePath },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DependencyError {
    /// 创建组件创建失败错误
    pub fn creation_failed(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// 是否为叶子级的“实体未找到”错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. })
    }

    /// 与错误直接相关的实体键
    pub fn key(&self) -> Option<&EntityKey> {
        match self {
            Self::RegistrationConflict { key, .. }
            | Self::EntityNotFound { key, .. }
            | Self::RecursionLimit { key, .. }
            | Self::TypeMismatch { key, .. } => Some(key),
            Self::MissingDependency { missing, .. } => Some(missing),
            Self::CircularDependency { chain } => chain.last(),
            Self::ContextReleased { .. } | Self::ComponentCreationFailed { .. } => None,
        }
    }
}

fn format_chain(chain: &[EntityKey]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
