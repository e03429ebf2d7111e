//! 实体标识
//!
//! [`Identifier<T>`] 是一个 `(kind, variant)` 对，附带仅在编译期存在的结果类型 `T`。

use infrastructure_common::{EntityKey, Kind, TypeInfo, Variant, DEFAULT_VARIANT};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// 带结果类型的实体标识
///
/// 同一 kind 下的多个变体表示同一逻辑服务的不同实现：
///
/// ```
/// use di_abstractions::identifier;
///
/// let systems = identifier::<String>("System");
/// let graphics = systems.with_variant("Graphics");
/// assert!(graphics.is_variant_of(&systems));
/// assert_eq!(graphics.variant(), "Graphics");
/// ```
pub struct Identifier<T: ?Sized> {
    key: EntityKey,
    marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Identifier<T> {
    /// 使用默认变体创建标识
    pub fn new(kind: impl Into<Kind>) -> Self {
        Self::from_key(EntityKey::of_kind(kind))
    }

    /// 使用指定变体创建标识
    pub fn named(kind: impl Into<Kind>, variant: impl Into<Variant>) -> Self {
        Self::from_key(EntityKey::new(kind, variant))
    }

    /// 从实体键创建标识，由调用方保证结果类型正确
    pub fn from_key(key: EntityKey) -> Self {
        Self {
            key,
            marker: PhantomData,
        }
    }

    /// 同 kind 的另一个变体
    pub fn with_variant(&self, variant: impl Into<Variant>) -> Self {
        Self::from_key(EntityKey {
            kind: self.key.kind.clone(),
            variant: variant.into(),
        })
    }

    /// 同 kind 的默认变体
    pub fn default_variant(&self) -> Self {
        self.with_variant(DEFAULT_VARIANT)
    }

    /// 标识的 kind
    pub fn kind(&self) -> &str {
        &self.key.kind
    }

    /// 标识的变体名
    pub fn variant(&self) -> &str {
        &self.key.variant
    }

    /// 未携带类型信息的实体键
    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    /// 是否与另一个标识同属一个 kind
    pub fn is_variant_of<U: ?Sized>(&self, other: &Identifier<U>) -> bool {
        self.key.is_variant_of(&other.key)
    }
}

impl<T: ?Sized + 'static> Identifier<T> {
    /// 从 Rust 类型推导标识
    ///
    /// 同一类型总是得到同一 kind；同名的不同类型得到不同 kind。
    pub fn of() -> Self {
        Self::new(type_kind::<T>())
    }
}

impl<T: ?Sized> Clone for Identifier<T> {
    fn clone(&self) -> Self {
        Self::from_key(self.key.clone())
    }
}

impl<T: ?Sized> PartialEq for Identifier<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: ?Sized> Eq for Identifier<T> {}

impl<T: ?Sized> Hash for Identifier<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Identifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identifier")
            .field("kind", &self.key.kind)
            .field("variant", &self.key.variant)
            .finish()
    }
}

impl<T: ?Sized> fmt::Display for Identifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.key, f)
    }
}

/// 使用默认变体创建标识
pub fn identifier<T: ?Sized>(kind: impl Into<Kind>) -> Identifier<T> {
    Identifier::new(kind)
}

/// 可转换为 [`Identifier`] 的值
pub trait IntoIdentifier<T: ?Sized> {
    fn into_identifier(self) -> Identifier<T>;
}

impl<T: ?Sized> IntoIdentifier<T> for Identifier<T> {
    fn into_identifier(self) -> Identifier<T> {
        self
    }
}

impl<T: ?Sized> IntoIdentifier<T> for &Identifier<T> {
    fn into_identifier(self) -> Identifier<T> {
        self.clone()
    }
}

/// 规范化为标识
pub fn normalize<T: ?Sized>(id: impl IntoIdentifier<T>) -> Identifier<T> {
    id.into_identifier()
}

/// 类型到 kind 的映射表，以 `TypeId` 为键
static TYPE_KINDS: Lazy<Mutex<TypeKindTable>> = Lazy::new(|| Mutex::new(TypeKindTable::default()));

#[derive(Debug, Default)]
struct TypeKindTable {
    kinds: HashMap<TypeId, Kind>,
    counter: u64,
}

impl TypeKindTable {
    fn kind_of(&mut self, info: &TypeInfo) -> Kind {
        if let Some(kind) = self.kinds.get(&info.id) {
            return kind.clone();
        }
        self.counter += 1;
        let kind: Kind = format!("{}#{}", info.short_name(), self.counter).into();
        trace!("为类型 {} 分配 kind: {}", info.module_path, kind);
        self.kinds.insert(info.id, kind.clone());
        kind
    }
}

/// 获取类型 `T` 对应的 kind，首次出现时分配
pub fn type_kind<T: ?Sized + 'static>() -> Kind {
    let info = TypeInfo::of::<T>();
    TYPE_KINDS.lock().kind_of(&info)
}
