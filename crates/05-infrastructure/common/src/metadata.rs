//! 元数据定义
//!
//! 提供实体键与类型的元数据信息

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// 实体类别（kind），例如 `"Database"`
pub type Kind = Arc<str>;

/// 实体变体名称
pub type Variant = Arc<str>;

/// 默认变体名称
pub const DEFAULT_VARIANT: &str = "default";

/// 实体键
///
/// 一个 `(kind, variant)` 对唯一标识一条绑定；不携带任何类型信息。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// 实体类别
    pub kind: Kind,
    /// 实体变体
    pub variant: Variant,
}

impl EntityKey {
    /// 创建新的实体键
    pub fn new(kind: impl Into<Kind>, variant: impl Into<Variant>) -> Self {
        Self {
            kind: kind.into(),
            variant: variant.into(),
        }
    }

    /// 使用默认变体创建实体键
    pub fn of_kind(kind: impl Into<Kind>) -> Self {
        Self::new(kind, DEFAULT_VARIANT)
    }

    /// 是否与另一个键属于同一 kind
    pub fn is_variant_of(&self, other: &EntityKey) -> bool {
        self.kind == other.kind
    }

    /// 是否为默认变体
    pub fn is_default_variant(&self) -> bool {
        &*self.variant == DEFAULT_VARIANT
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.variant)
    }
}

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称（不含模块路径与泛型参数）
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整类型路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        let base = full
            .trim_start_matches("dyn ")
            .split(|c: char| c == '<' || c == ' ')
            .next()
            .unwrap_or(full);
        Self {
            name: base.rsplit("::").next().unwrap_or("Unknown").to_string(),
            id: TypeId::of::<T>(),
            module_path: full.to_string(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        &self.name
    }
}
