use std::sync::Arc;
use std::time::Duration;

use ctxcache::{BuildContext, CacheConfig, Config, ContextCache};
use ctxcache_store::Store;

use crate::utils::test;
use test::{A, B};

#[test]
fn test_disabled_cache() {
    test::setup();
    let cache = ContextCache::new(&CacheConfig {
        enabled: false,
        ..Default::default()
    });

    let store = Store::create().set("A.f1", "foo").build();
    let a = cache.create::<A>(&store).unwrap();
    let a2 = cache.create::<A>(&store).unwrap();

    assert!(!Arc::ptr_eq(&a, &a2));
    assert_eq!(a.f1, a2.f1);
    assert_eq!(cache.entry_count(), 0);

    // failures are reported the same way
    assert!(cache.create::<test::Failing>(&store).is_err());
}

#[test]
fn test_bounded_cache() {
    test::setup();
    let config = CacheConfig {
        max_capacity: Some(100),
        time_to_idle: Some(Duration::from_secs(60)),
        ..Default::default()
    };
    let cache = ContextCache::new(&config);
    assert_eq!(cache.config(), &config);

    let store = Store::create().set("B.f2.i", 5).build();
    let b = cache.create::<B>(&store).unwrap();
    let b2 = cache.create::<B>(&store).unwrap();
    assert!(Arc::ptr_eq(&b, &b2));
}

#[test]
fn test_config_file() {
    test::setup();
    let file = test::config_file(
        r#"
        cache:
          enabled: false
          max_capacity: 10
        logging:
          level: debug
        "#,
    );

    let config = Config::get(Some(file.path())).unwrap();
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.max_capacity, Some(10));

    let cache = ContextCache::new(&config.cache);
    let store = Store::empty();
    let a = cache.create::<A>(&store).unwrap();
    assert!(!Arc::ptr_eq(&a, &cache.create::<A>(&store).unwrap()));
}

#[test]
fn test_missing_config_file() {
    let dir = test::tempdir();
    let err = Config::get(Some(dir.path().join("config.yml").as_path())).unwrap_err();
    assert_eq!(err.to_string(), "failed to open configuration file");
}

#[test]
fn test_global_cache() {
    test::setup();

    // the global cache may already be installed by another test
    ContextCache::init(&CacheConfig::default());
    assert!(!ContextCache::init(&CacheConfig::default()));

    let mut builder = Store::create();
    builder.set("A.f1", "global");

    let a = builder.build_context::<A>().unwrap();
    let a2 = builder.build_context::<A>().unwrap();
    assert!(Arc::ptr_eq(&a, &a2));

    let a3 = ContextCache::global().create::<A>(&builder.build()).unwrap();
    assert!(Arc::ptr_eq(&a, &a3));
    assert_eq!(a.f1, "global");
}
