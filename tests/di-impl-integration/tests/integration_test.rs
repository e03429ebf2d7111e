//! Centralized integration tests for the di-impl crate
use di_impl::prelude::*;
use di_impl::Resolver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug)]
struct Thing;

#[derive(Debug)]
struct Hello {
    thing: Arc<Thing>,
}

impl Hello {
    fn new(thing: Arc<Thing>) -> Self {
        Self { thing }
    }
}

trait Database: Send + Sync {
    fn kind(&self) -> &'static str;
}

struct MockDb;

impl Database for MockDb {
    fn kind(&self) -> &'static str {
        "MOCK"
    }
}

struct SqlDb;

impl Database for SqlDb {
    fn kind(&self) -> &'static str {
        "SQL"
    }
}

fn any_database() -> Identifier<dyn Database> {
    identifier("AnyDatabase")
}

#[test]
fn test_constructor_dependencies_share_instances() -> anyhow::Result<()> {
    init_tracing();
    let thing = Identifier::<Thing>::of();
    let hello = Identifier::<Hello>::of();

    let mut store = Store::new();
    store.add(|| Thing, ())?.add(Hello::new, (thing.clone(),))?;

    let cx = store.context();
    assert!(Arc::ptr_eq(&cx.get(&hello)?.thing, &cx.get(&thing)?));
    Ok(())
}

#[test]
fn test_database_binding_requires_override() -> anyhow::Result<()> {
    init_tracing();
    let mut store = Store::new();
    store.use_class(any_database(), || Arc::new(MockDb) as Arc<dyn Database>, ())?;

    let err = store
        .use_class(any_database(), || Arc::new(SqlDb) as Arc<dyn Database>, ())
        .err();
    assert!(matches!(err, Some(DependencyError::RegistrationConflict { .. })));

    store.override_factory(any_database(), |_| Ok(Arc::new(SqlDb) as Arc<dyn Database>))?;
    assert_eq!(store.context().get(any_database())?.kind(), "SQL");
    Ok(())
}

#[test]
fn test_not_found_versus_optional() -> anyhow::Result<()> {
    init_tracing();
    let cx = Store::new().context();
    let missing = identifier::<String>("missing");

    let err = cx.get(&missing).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "实体未找到: missing(default), 作用域: <root>");
    assert!(cx.get_optional(&missing)?.is_none());
    Ok(())
}

#[test]
fn test_singleton_per_context() -> anyhow::Result<()> {
    init_tracing();
    let thing = Identifier::<Thing>::of();
    let mut store = Store::new();
    store.add(|| Thing, ())?;

    let first = store.context();
    let second = store.context();
    assert!(Arc::ptr_eq(&first.get(&thing)?, &first.get(&thing)?));
    assert!(!Arc::ptr_eq(&first.get(&thing)?, &second.get(&thing)?));
    Ok(())
}

#[test]
fn test_child_context_delegates_to_parent() -> anyhow::Result<()> {
    init_tracing();
    let thing = Identifier::<Thing>::of();
    let mut store = Store::new();
    store.add(|| Thing, ())?;

    let root = store.context();
    let child = store.scoped_context("child", Some(&root));

    assert!(Arc::ptr_eq(&child.get(&thing)?, &root.get(&thing)?));
    assert!(child.pool().is_empty());

    let err = child
        .get_with(&thing, ResolveOptions::new().with_same_scope())
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(child
        .get_with(&thing, ResolveOptions::new().with_same_scope().with_optional())?
        .is_none());
    Ok(())
}

#[test]
fn test_child_scope_bindings_shadow_parent() -> anyhow::Result<()> {
    init_tracing();
    let name = identifier::<String>("name");
    let mut store = Store::new();
    store.use_value(&name, String::from("root"))?;
    store.scope("request").use_value(&name, String::from("request"))?;

    let root = store.context();
    let request = root.child("request");
    assert_eq!(*request.get(&name)?, "request");
    assert_eq!(*root.get(&name)?, "root");
    Ok(())
}

#[test]
fn test_parent_resolved_factories_use_parent_scope() -> anyhow::Result<()> {
    init_tracing();
    let name = identifier::<String>("name");
    let greeting = identifier::<String>("greeting");

    let mut store = Store::new();
    store.use_value(&name, String::from("root"))?;
    store.use_function(&greeting, (name.clone(),), |cx, (name,)| {
        Ok(Arc::new(format!("{name}@{}", cx.scope())))
    })?;
    store.scope("request").use_value(&name, String::from("request"))?;

    let request = store.context().child("request");
    assert_eq!(*request.get(&greeting)?, "root@<root>");
    Ok(())
}

#[test]
fn test_circular_dependency_is_detected() -> anyhow::Result<()> {
    init_tracing();
    let a = identifier::<u32>("A");
    let b = identifier::<u32>("B");

    let mut store = Store::new();
    let (to_b, to_a) = (b.clone(), a.clone());
    store
        .use_factory(&a, move |cx| cx.get(&to_b))?
        .use_factory(&b, move |cx| cx.get(&to_a))?;

    match store.context().get(&a) {
        Err(DependencyError::CircularDependency { chain }) => {
            let chain: Vec<String> = chain.iter().map(ToString::to_string).collect();
            assert_eq!(chain, ["A(default)", "B(default)", "A(default)"]);
        }
        other => panic!("期望循环依赖错误, 实际: {:?}", other.map(|v| *v)),
    }
    Ok(())
}

#[test]
fn test_deep_chain_hits_recursion_limit() -> anyhow::Result<()> {
    init_tracing();
    let levels: Vec<_> = (0..=120).map(|i| identifier::<usize>(format!("level{i}"))).collect();

    let mut store = Store::new();
    store.use_value(&levels[120], 0_usize)?;
    for pair in levels.windows(2) {
        let next = pair[1].clone();
        store.use_factory(&pair[0], move |cx| Ok(Arc::new(*cx.get(&next)? + 1)))?;
    }

    let cx = store.context();
    assert_eq!(*cx.get(&levels[30])?, 90);

    let err = store.context().get(&levels[0]).unwrap_err();
    assert!(matches!(err, DependencyError::RecursionLimit { limit: 100, .. }));
    Ok(())
}

#[test]
fn test_get_all_excludes_and_memoizes_variants() -> anyhow::Result<()> {
    init_tracing();
    let plugins = identifier::<String>("Plugin");
    let mut store = Store::new();
    for name in ["graphics", "audio", "input"] {
        let value = name.to_string();
        store.use_factory(plugins.with_variant(name), move |_| Ok(Arc::new(value.clone())))?;
    }

    let cx = store.context();
    let all = cx.get_all(&plugins)?;
    assert_eq!(all.keys().map(|v| &**v).collect::<Vec<_>>(), ["graphics", "audio", "input"]);
    assert!(Arc::ptr_eq(&all["audio"], &cx.get(plugins.with_variant("audio"))?));

    let rest = cx.get_all_with(&plugins, ResolveOptions::new().excluding("audio"))?;
    assert_eq!(rest.keys().map(|v| &**v).collect::<Vec<_>>(), ["graphics", "input"]);

    let none = cx.get_all_with(
        &plugins,
        ResolveOptions::new()
            .excluding("graphics")
            .excluding("audio")
            .excluding("input"),
    )?;
    assert!(none.is_empty());
    assert!(cx.get_all(identifier::<String>("Unregistered"))?.is_empty());
    Ok(())
}

#[test]
fn test_get_all_falls_back_only_for_unregistered_kinds() -> anyhow::Result<()> {
    init_tracing();
    let plugins = identifier::<String>("Plugin");
    let mut store = Store::new();
    store.use_value(plugins.with_variant("root"), String::from("root"))?;

    let root = store.context();
    let inherited = store.scoped_context("request", Some(&root));
    assert_eq!(inherited.get_all(&plugins)?.len(), 1);
    assert!(inherited
        .get_all_with(&plugins, ResolveOptions::new().with_same_scope())?
        .is_empty());

    store
        .scope("request")
        .use_value(plugins.with_variant("local"), String::from("local"))?;
    let shadowed = store.scoped_context("request", Some(&root));
    let all = shadowed.get_all(&plugins)?;
    assert_eq!(all.keys().map(|v| &**v).collect::<Vec<_>>(), ["local"]);
    Ok(())
}

#[test]
fn test_dependency_on_all_variants() -> anyhow::Result<()> {
    init_tracing();
    let plugins = identifier::<String>("Plugin");
    let summary = identifier::<String>("Summary");

    let mut store = Store::new();
    store
        .use_value(plugins.with_variant("a"), String::from("a"))?
        .use_value(plugins.with_variant("b"), String::from("b"))?;
    store.use_class(
        &summary,
        |names: Vec<Arc<String>>| {
            names.iter().map(|name| name.as_str()).collect::<Vec<_>>().join("+")
        },
        (all(&plugins),),
    )?;

    assert_eq!(*store.context().get(&summary)?, "a+b");
    Ok(())
}

#[test]
fn test_missing_dependency_wraps_one_level() -> anyhow::Result<()> {
    init_tracing();
    let a = identifier::<u32>("A");
    let b = identifier::<u32>("B");
    let c = identifier::<u32>("C");

    let mut store = Store::new();
    store
        .use_class(&a, |b: Arc<u32>| *b, (b.clone(),))?
        .use_class(&b, |c: Arc<u32>| *c, (c.clone(),))?;

    match store.context().get(&a) {
        Err(DependencyError::MissingDependency {
            missing,
            requested_by,
            scope,
        }) => {
            assert_eq!(&missing, c.key());
            assert_eq!(&requested_by, b.key());
            assert!(scope.is_root());
        }
        other => panic!("期望缺少依赖错误, 实际: {:?}", other.map(|v| *v)),
    }
    Ok(())
}

#[test]
fn test_type_mismatch_is_reported() -> anyhow::Result<()> {
    init_tracing();
    let mut store = Store::new();
    store.use_value(identifier::<u32>("answer"), 42_u32)?;

    let err = store.context().get(identifier::<String>("answer")).unwrap_err();
    assert!(matches!(err, DependencyError::TypeMismatch { .. }));
    Ok(())
}

#[test]
fn test_store_clone_shares_factories() -> anyhow::Result<()> {
    init_tracing();
    let thing = Identifier::<Thing>::of();
    let mut store = Store::new();
    store.use_value(&thing, Thing)?;

    let mut copy = store.clone();
    copy.override_factory(&thing, |_| Ok(Arc::new(Thing)))?;

    let original = store.context().get(&thing)?;
    assert!(Arc::ptr_eq(&original, &store.context().get(&thing)?));
    assert!(!Arc::ptr_eq(&original, &copy.context().get(&thing)?));
    Ok(())
}

#[test]
fn test_context_can_be_injected() -> anyhow::Result<()> {
    init_tracing();
    let scope_name = identifier::<String>("ScopeName");
    let mut store = Store::new();
    store.use_class(
        &scope_name,
        |cx: Arc<ContextRef>| cx.scope().to_string(),
        (Identifier::<ContextRef>::of(),),
    )?;

    let root = store.context();
    let request = store.scoped_context("request", Some(&root));
    assert_eq!(*root.get(&scope_name)?, "<root>");
    assert_eq!(*request.get(&scope_name)?, "<root>");
    assert_eq!(*request.get(Identifier::<ContextRef>::of())?, request);
    Ok(())
}

struct Editor;

struct Tracked(Arc<AtomicBool>);

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct Workspace {
    cx: Arc<ContextRef>,
    _tracked: Arc<Tracked>,
}

impl Workspace {
    fn editor(&self) -> Result<Arc<Editor>, DependencyError> {
        self.cx.get(Identifier::<Editor>::of())
    }
}

#[test]
fn test_stored_context_resolves_later_and_is_released() -> anyhow::Result<()> {
    init_tracing();
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = dropped.clone();
    let workspace = identifier::<Workspace>("Workspace");

    let mut store = Store::new();
    store
        .add(|| Editor, ())?
        .use_factory(Identifier::<Tracked>::of(), move |_| Ok(Arc::new(Tracked(flag.clone()))))?
        .use_class(
            &workspace,
            |cx: Arc<ContextRef>, tracked: Arc<Tracked>| Workspace { cx, _tracked: tracked },
            (Identifier::<ContextRef>::of(), Identifier::<Tracked>::of()),
        )?;

    let cx = store.context();
    let handle = cx.downgrade();
    let resolved = cx.get(&workspace)?;
    assert!(!cx.pool().contains(Identifier::<Editor>::of().key()));
    assert!(Arc::ptr_eq(&resolved.editor()?, &cx.get(Identifier::<Editor>::of())?));

    drop(resolved);
    drop(cx);
    assert!(handle.upgrade().is_none());
    assert!(dropped.load(Ordering::SeqCst));
    Ok(())
}

#[test]
fn test_get_all_of_own_kind_is_circular() -> anyhow::Result<()> {
    init_tracing();
    let handlers = identifier::<String>("Handler");
    let mut store = Store::new();
    store.use_value(handlers.with_variant("1"), String::from("1"))?;
    let kind = handlers.clone();
    store.use_factory(handlers.with_variant("agg"), move |cx| {
        let all = cx.get_all(&kind)?;
        Ok(Arc::new(all.values().map(|v| v.as_str()).collect::<Vec<_>>().join(",")))
    })?;

    match store.context().get(handlers.with_variant("agg")) {
        Err(DependencyError::CircularDependency { chain }) => {
            let chain: Vec<String> = chain.iter().map(ToString::to_string).collect();
            assert_eq!(chain, ["Handler(agg)", "Handler(agg)"]);
        }
        other => panic!("期望循环依赖错误, 实际: {other:?}"),
    }
    Ok(())
}

#[test]
fn test_aggregating_factory_excludes_itself() -> anyhow::Result<()> {
    init_tracing();
    let handlers = identifier::<String>("Handler");
    let mut store = Store::new();
    store
        .use_value(handlers.with_variant("1"), String::from("1"))?
        .use_value(handlers.with_variant("2"), String::from("2"))?;
    let kind = handlers.clone();
    store.use_factory(handlers.with_variant("agg"), move |cx| {
        let others = cx.get_all_with(&kind, ResolveOptions::new().excluding("agg"))?;
        Ok(Arc::new(others.values().map(|v| v.as_str()).collect::<Vec<_>>().join(",")))
    })?;

    let cx = store.context();
    assert_eq!(*cx.get(handlers.with_variant("agg"))?, "1,2");
    assert_eq!(cx.get_all(&handlers)?.len(), 3);
    Ok(())
}

#[test]
fn test_plugins_with_unique_variants() -> anyhow::Result<()> {
    init_tracing();
    let handlers = identifier::<String>("Handler");
    let plugin = {
        let handlers = handlers.clone();
        move |store: &mut Store| -> Result<(), DependencyError> {
            let variant = store.unique_variant();
            let value = format!("handler-{variant}");
            store.use_value(handlers.with_variant(variant), value)?;
            Ok(())
        }
    };

    let mut store = Store::new();
    store.install(&plugin)?.install(&plugin)?;

    let all = store.context().get_all(&handlers)?;
    let values: Vec<&str> = all.values().map(|v| v.as_str()).collect();
    assert_eq!(values, ["handler-1", "handler-2"]);
    Ok(())
}

#[test]
fn test_resolver_is_usable_as_context() -> anyhow::Result<()> {
    init_tracing();
    let thing = Identifier::<Thing>::of();
    let mut store = Store::new();
    store.add(|| Thing, ())?;

    let cx = store.context();
    let resolver = Resolver::new(&cx);
    assert!(Arc::ptr_eq(&resolver.get(&thing)?, &cx.get(&thing)?));
    Ok(())
}

#[test]
fn test_container_config_from_toml() -> anyhow::Result<()> {
    init_tracing();
    let config: ContainerConfig = toml::from_str("max_resolution_depth = 2")?;
    let a = identifier::<u8>("A");
    let b = identifier::<u8>("B");
    let c = identifier::<u8>("C");

    let mut store = Store::with_config(config);
    store
        .use_value(&c, 1_u8)?
        .use_class(&b, |c: Arc<u8>| *c, (c.clone(),))?
        .use_class(&a, |b: Arc<u8>| *b, (b.clone(),))?;

    assert_eq!(*store.context().get(&b)?, 1);
    assert!(matches!(
        store.context().get(&a),
        Err(DependencyError::RecursionLimit { limit: 2, .. })
    ));
    Ok(())
}
