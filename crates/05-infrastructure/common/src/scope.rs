//! 作用域路径

use serde::{Deserialize, Serialize};
use std::fmt;

/// 作用域路径
///
/// 由若干段字符串组成的嵌套生命周期边界，空路径即根作用域。
/// 注册表以 [`ScopePath::stringify`] 的结果作为查找键。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopePath {
    segments: Vec<String>,
}

impl ScopePath {
    /// 根作用域
    pub fn root() -> Self {
        Self::default()
    }

    /// 从路径段创建作用域
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// 创建子作用域
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// 上一级作用域，根作用域返回 `None`
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// 路径段
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// 是否为根作用域
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// 序列化为注册表查找键
    pub fn stringify(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.stringify())
        }
    }
}

impl From<&str> for ScopePath {
    fn from(path: &str) -> Self {
        Self::new(path.split('/').filter(|segment| !segment.is_empty()))
    }
}

impl From<String> for ScopePath {
    fn from(path: String) -> Self {
        Self::from(path.as_str())
    }
}

impl From<Vec<String>> for ScopePath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl<S: Into<String>> FromIterator<S> for ScopePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
