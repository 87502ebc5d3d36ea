use std::sync::Arc;

use ctxcache::Context;
use ctxcache_store::Store;

use crate::utils::{setup_cache, test, to_json};
use test::{A, B, C};

#[test]
fn test_instances_follow_relevant_groups() {
    let cache = setup_cache();
    let mut builder = Store::create();
    let store = builder.build();

    let a = cache.create::<A>(&store).unwrap();
    let b = cache.create::<B>(&store).unwrap();
    let c = cache.create::<C>(&store).unwrap();

    assert_eq!(to_json(&*a), r#"{"f1":"xxx"}"#);
    assert_eq!(to_json(&*b), r#"{"f1":"xxx","f2":-1}"#);
    assert_eq!(to_json(&*c), r#"{"f1":"xxx","f2":-1,"f3":false}"#);

    assert!(Arc::ptr_eq(&a, &cache.create::<A>(&store).unwrap()));
    assert!(Arc::ptr_eq(&b, &cache.create::<B>(&store).unwrap()));
    assert!(Arc::ptr_eq(&c, &cache.create::<C>(&store).unwrap()));

    // `A` is read by all three
    let store = builder.set("A.f1", "foo").build();
    let a2 = cache.create::<A>(&store).unwrap();
    let b2 = cache.create::<B>(&store).unwrap();
    let c2 = cache.create::<C>(&store).unwrap();

    assert_eq!(to_json(&*a2), r#"{"f1":"foo"}"#);
    assert_eq!(to_json(&*b2), r#"{"f1":"foo","f2":-1}"#);
    assert_eq!(to_json(&*c2), r#"{"f1":"foo","f2":-1,"f3":false}"#);

    assert!(!Arc::ptr_eq(&a, &a2));
    assert!(!Arc::ptr_eq(&b, &b2));
    assert!(!Arc::ptr_eq(&c, &c2));
    let (a, b, c) = (a2, b2, c2);

    // `B` is not read by `A`
    let store = builder.set("B.f2.i", 123).build();
    let a2 = cache.create::<A>(&store).unwrap();
    let b2 = cache.create::<B>(&store).unwrap();
    let c2 = cache.create::<C>(&store).unwrap();

    assert_eq!(to_json(&*a2), r#"{"f1":"foo"}"#);
    assert_eq!(to_json(&*b2), r#"{"f1":"foo","f2":123}"#);
    assert_eq!(to_json(&*c2), r#"{"f1":"foo","f2":123,"f3":false}"#);

    assert!(Arc::ptr_eq(&a, &a2));
    assert!(!Arc::ptr_eq(&b, &b2));
    assert!(!Arc::ptr_eq(&c, &c2));
    let (a, b, c) = (a2, b2, c2);

    // `C` is only read by `C`
    let store = builder.set("C.f3.b", true).build();
    let a2 = cache.create::<A>(&store).unwrap();
    let b2 = cache.create::<B>(&store).unwrap();
    let c2 = cache.create::<C>(&store).unwrap();

    assert_eq!(to_json(&*c2), r#"{"f1":"foo","f2":123,"f3":true}"#);

    assert!(Arc::ptr_eq(&a, &a2));
    assert!(Arc::ptr_eq(&b, &b2));
    assert!(!Arc::ptr_eq(&c, &c2));
    let (a, b, c) = (a2, b2, c2);

    // nobody reads `D`
    let store = builder.set("D.bad.o", "xxx").build();
    let a2 = cache.create::<A>(&store).unwrap();
    let b2 = cache.create::<B>(&store).unwrap();
    let c2 = cache.create::<C>(&store).unwrap();

    assert_eq!(to_json(&*a2), r#"{"f1":"foo"}"#);
    assert_eq!(to_json(&*b2), r#"{"f1":"foo","f2":123}"#);
    assert_eq!(to_json(&*c2), r#"{"f1":"foo","f2":123,"f3":true}"#);

    assert!(Arc::ptr_eq(&a, &a2));
    assert!(Arc::ptr_eq(&b, &b2));
    assert!(Arc::ptr_eq(&c, &c2));

    // the instances still hold the store they were first constructed from
    assert!(!a2.store().contains("D.bad.o"));
    assert!(!c2.store().contains("D.bad.o"));

    // A rebuilt, equal configuration resolves to the same instance. A different one does not.
    let a2 = cache
        .create::<A>(&a.store().builder().set("A.f1", "foo").build())
        .unwrap();
    assert!(Arc::ptr_eq(&a, &a2));

    let a2 = cache
        .create::<A>(&a.store().builder().set("A.f1", "bar").build())
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &a2));
    assert_eq!(a2.f1, "bar");
}

#[test]
fn test_types_are_cached_separately() {
    let cache = setup_cache();
    let store = Store::empty();

    // all three have the same relevant digest on an empty store
    let a = cache.create::<A>(&store).unwrap();
    let b = cache.create::<B>(&store).unwrap();
    let c = cache.create::<C>(&store).unwrap();

    assert_eq!(to_json(&*a), r#"{"f1":"xxx"}"#);
    assert_eq!(to_json(&*b), r#"{"f1":"xxx","f2":-1}"#);
    assert_eq!(to_json(&*c), r#"{"f1":"xxx","f2":-1,"f3":false}"#);

    assert!(Arc::ptr_eq(&b, &cache.create::<B>(&store).unwrap()));
}

#[test]
fn test_canonical_store() {
    let cache = setup_cache();

    let first = Store::create().set("A.f1", "foo").set("B.f2.i", 1).build();
    let second = Store::create().set("A.f1", "foo").set("B.f2.i", 2).build();
    assert!(!Store::ptr_eq(&first, &second));

    let a = cache.create::<A>(&first).unwrap();
    let a2 = cache.create::<A>(&second).unwrap();

    assert!(Arc::ptr_eq(&a, &a2));
    assert!(Store::ptr_eq(a.store(), &first));
    assert!(Store::ptr_eq(a2.store(), a.store()));

    // derived contexts report the store they were built from as well
    let b = cache.create::<B>(&second).unwrap();
    assert!(Store::ptr_eq(b.store(), &second));
    assert_eq!(b.f2, 2);
}

#[test]
fn test_emptied_collections() {
    let cache = setup_cache();

    let mut builder = Store::create();
    let store = builder.set("A.f1", "foo").build();
    let a = cache.create::<A>(&store).unwrap();

    let store = builder.add("A.names.ls", "x").build();
    let a2 = cache.create::<A>(&store).unwrap();
    assert!(!Arc::ptr_eq(&a, &a2));

    // a collection that becomes empty disappears from the store
    let store = builder.remove("A.names.ls", "x").build();
    let a3 = cache.create::<A>(&store).unwrap();
    assert!(Arc::ptr_eq(&a, &a3));
}

#[test]
fn test_coerced_values() {
    let cache = setup_cache();

    let store = Store::create().set("B.f2.i", "123").build();
    let b = cache.create::<B>(&store).unwrap();

    let store = Store::create().set("B.f2.i", 123).build();
    let b2 = cache.create::<B>(&store).unwrap();

    assert!(Arc::ptr_eq(&b, &b2));
    assert_eq!(b.f2, 123);
}

#[test]
fn test_clear() {
    let cache = setup_cache();
    let store = Store::empty();

    let a = cache.create::<A>(&store).unwrap();
    let b = cache.create::<B>(&store).unwrap();
    assert_eq!(to_json(&*b), r#"{"f1":"xxx","f2":-1}"#);

    cache.clear();

    // previously handed out instances stay valid
    let a2 = cache.create::<A>(&store).unwrap();
    assert!(!Arc::ptr_eq(&a, &a2));
    assert_eq!(a.f1, a2.f1);

    insta::assert_debug_snapshot!(cache.config(), @r###"
    CacheConfig {
        enabled: true,
        max_capacity: None,
        time_to_idle: None,
    }
    "###);
}
