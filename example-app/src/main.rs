//! # 示例应用程序
//!
//! 演示如何使用 Lorn ADSP 依赖注入容器：按优先级选择数据库插件、
//! 合并多个配置插件，以及为每个请求创建子上下文。

use anyhow::{bail, Context as _};
use clap::Parser;
use di_impl::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP 依赖注入示例应用")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/app.toml")]
    config: PathBuf,

    /// 额外启用的数据库插件，例如 `sql,nosql`
    #[arg(long, value_delimiter = ',')]
    plugins: Vec<String>,

    /// 日志级别，优先于配置文件
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    let level = args
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    init_tracing(&level);

    info!("启动 Lorn ADSP 示例应用");

    let mut plugins = config.plugins.clone();
    plugins.extend(args.plugins.iter().cloned());
    let app = App::new(&config, &plugins)?;

    let database = app.database()?;
    info!("选中的数据库: {} ({})", database.kind(), database.url());

    for _ in 0..2 {
        let request = app.request();
        let handler = request.get(request_handler())?;
        info!("{}", handler.handle());
    }

    info!("应用已退出");
    Ok(())
}

/// 初始化日志
fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 加载应用配置，文件不存在时使用默认配置
fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("配置文件格式错误: {}", path.display()))
}

// 配置

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 容器配置
    pub container: ContainerConfig,
    /// 启用的数据库插件
    pub plugins: Vec<String>,
    /// 日志级别
    pub log_level: Option<String>,
    /// 数据库配置，覆盖默认值
    pub database: PartialSettings,
}

/// 部分数据库配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialSettings {
    pub url: Option<String>,
    pub pool_size: Option<u32>,
}

/// 合并后的数据库配置
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub url: String,
    pub pool_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: "memory://adsp".to_string(),
            pool_size: 4,
        }
    }
}

impl Settings {
    fn apply(mut self, partial: &PartialSettings) -> Self {
        if let Some(url) = &partial.url {
            self.url = url.clone();
        }
        if let Some(pool_size) = partial.pool_size {
            self.pool_size = pool_size;
        }
        self
    }
}

fn config_plugins() -> Identifier<PartialSettings> {
    identifier("Config")
}

fn settings() -> Identifier<Settings> {
    identifier("Settings")
}

/// 按注册顺序合并全部配置插件，后注册的优先
fn merged_settings(cx: &dyn Resolve) -> Result<Arc<Settings>, DependencyError> {
    let merged = cx
        .get_all(config_plugins())?
        .values()
        .fold(Settings::default(), |settings, partial| settings.apply(partial));
    debug!("数据库配置: {}, 连接池大小: {}", merged.url, merged.pool_size);
    Ok(Arc::new(merged))
}

/// 配置插件，每个实例占用一个唯一变体
pub struct ConfigPlugin(pub PartialSettings);

impl Plugin for ConfigPlugin {
    fn name(&self) -> &str {
        "config"
    }

    fn register(&self, store: &mut Store) -> Result<(), DependencyError> {
        let variant = store.unique_variant();
        store.use_value(config_plugins().with_variant(variant), self.0.clone())?;
        Ok(())
    }
}

// 数据库插件

/// 数据库接口
pub trait Database: Send + Sync {
    fn kind(&self) -> &str;
    fn url(&self) -> &str;
}

/// 由插件提供的数据库实现
#[derive(Debug)]
struct PluginDatabase {
    kind: &'static str,
    settings: Arc<Settings>,
}

impl Database for PluginDatabase {
    fn kind(&self) -> &str {
        self.kind
    }

    fn url(&self) -> &str {
        &self.settings.url
    }
}

/// 数据库插件元数据
#[derive(Debug, Clone)]
pub struct DatabasePluginMetadata {
    pub kind: &'static str,
    pub priority: i32,
    pub implementation: Identifier<dyn Database>,
}

fn database() -> Identifier<dyn Database> {
    identifier("Database")
}

fn database_plugins() -> Identifier<DatabasePluginMetadata> {
    identifier("DatabasePlugins")
}

/// 数据库插件：注册实现并登记自己的优先级
#[derive(Debug, Clone, Copy)]
pub struct DatabasePlugin {
    kind: &'static str,
    priority: i32,
}

impl DatabasePlugin {
    pub const MOCK: Self = Self {
        kind: "MOCK",
        priority: 0,
    };
    pub const NOSQL: Self = Self {
        kind: "NOSQL",
        priority: 100,
    };
    pub const SQL: Self = Self {
        kind: "SQL",
        priority: 1000,
    };

    /// 按名称查找内置插件
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "mock" => Some(Self::MOCK),
            "nosql" => Some(Self::NOSQL),
            "sql" => Some(Self::SQL),
            _ => None,
        }
    }
}

impl Plugin for DatabasePlugin {
    fn name(&self) -> &str {
        self.kind
    }

    fn register(&self, store: &mut Store) -> Result<(), DependencyError> {
        let kind = self.kind;
        let implementation = Identifier::<dyn Database>::named("DatabaseImpl", kind);
        store.use_class(
            &implementation,
            move |settings: Arc<Settings>| Arc::new(PluginDatabase { kind, settings }) as Arc<dyn Database>,
            (settings(),),
        )?;
        store.use_value(
            database_plugins().with_variant(kind),
            DatabasePluginMetadata {
                kind,
                priority: self.priority,
                implementation,
            },
        )?;
        Ok(())
    }
}

/// 选择优先级最高的数据库实现
fn preferred_database(cx: &dyn Resolve) -> Result<Arc<dyn Database>, DependencyError> {
    let available = cx.get_all(database_plugins())?;
    let preferred = available
        .values()
        .max_by_key(|metadata| metadata.priority)
        .ok_or_else(|| DependencyError::creation_failed("Database", "没有可用的数据库实现"))?;
    debug!("选择数据库插件: {}, 优先级: {}", preferred.kind, preferred.priority);
    cx.get(&preferred.implementation)
}

// 请求作用域

/// 请求处理器，每个请求上下文一个
pub struct RequestHandler {
    scope: String,
    database: Arc<dyn Database>,
}

impl RequestHandler {
    pub fn handle(&self) -> String {
        format!("在作用域 {} 中使用 {} 处理请求", self.scope, self.database.kind())
    }
}

fn request_handler() -> Identifier<RequestHandler> {
    identifier("RequestHandler")
}

/// 应用
pub struct App {
    cx: Context,
}

impl App {
    /// 按配置与插件名称组装应用；MOCK 数据库插件总是启用
    pub fn new(config: &AppConfig, plugin_names: &[String]) -> anyhow::Result<Self> {
        let mut store = Store::with_config(config.container.clone());
        store
            .use_factory(database(), preferred_database)?
            .use_factory(settings(), merged_settings)?;
        store.scope("request").use_class(
            request_handler(),
            |cx: Arc<ContextRef>, database: Arc<dyn Database>| RequestHandler {
                scope: cx.scope().to_string(),
                database,
            },
            (Identifier::<ContextRef>::of(), database()),
        )?;

        let mut plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(DatabasePlugin::MOCK),
            Box::new(ConfigPlugin(config.database.clone())),
        ];
        for name in plugin_names {
            match DatabasePlugin::by_name(name) {
                Some(plugin) => plugins.push(Box::new(plugin)),
                None => bail!("未知的数据库插件: {name}"),
            }
        }
        store.install_all(&plugins)?;

        Ok(Self { cx: store.context() })
    }

    pub fn database(&self) -> Result<Arc<dyn Database>, DependencyError> {
        self.cx.get(database())
    }

    /// 为一次请求创建子上下文
    pub fn request(&self) -> Context {
        self.cx.child("request")
    }
}
