//! 依赖注入容器配置

use serde::{Deserialize, Serialize};

/// 默认最大解析深度
pub const MAX_RESOLUTION_DEPTH: usize = 100;

/// 容器配置
///
/// 可以直接作为 TOML 配置文件中的一个表加载，缺省字段使用默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 单次解析允许的最大嵌套深度
    pub max_resolution_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: MAX_RESOLUTION_DEPTH,
        }
    }
}

impl ContainerConfig {
    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }
}
