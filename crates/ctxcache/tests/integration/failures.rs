use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ctxcache::{ConstructionError, Context, ContextError};
use ctxcache_store::{Store, StoreError};

use crate::utils::{setup_cache, test};
use test::{B, Failing, NoConstructor};

#[test]
fn test_no_constructor() {
    let cache = setup_cache();
    let store = Store::empty();

    let err = cache.create::<NoConstructor>(&store).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Could not create instance of class 'ctxcache_test::NoConstructor'");
    assert!(matches!(err.cause(), Some(ConstructionError::NoConstructor)));

    // nothing was cached, the same error is reported again
    let err2 = cache.create::<NoConstructor>(&store).unwrap_err();
    assert_eq!(err2.to_string(), err.to_string());
    assert!(matches!(err2.cause(), Some(ConstructionError::NoConstructor)));
}

#[test]
fn test_failing_constructor() {
    let cache = setup_cache();
    let store = Store::empty();

    let err = cache.create::<Failing>(&store).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Could not create instance of class 'ctxcache_test::Failing'");

    let err2 = cache.create::<Failing>(&store).unwrap_err();
    assert_eq!(err2.to_string(), err.to_string());

    for err in [err, err2] {
        let Some(ConstructionError::Failed(cause)) = err.cause() else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(cause.to_string(), "Error!");
    }
}

#[test]
fn test_type_mismatch() {
    let cache = setup_cache();
    let store = Store::create().set("B.f2.i", "many").build();

    let err = cache.create::<B>(&store).unwrap_err();
    let Some(ConstructionError::Store(StoreError::TypeMismatch { key, .. })) = err.cause() else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(key, "B.f2.i");

    // the error chain names the offending property
    let source = std::error::Error::source(&err).unwrap();
    insta::assert_snapshot!(source.to_string(), @"property 'B.f2.i' holds a string which cannot be converted to integer");
}

static FLAKY_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

/// Fails on the first attempt only.
#[derive(Debug)]
struct Flaky(Store);

impl Context for Flaky {
    const GROUP: &'static str = "Flaky";
    type Parent = ();

    fn construct(store: &Store) -> Result<Self, ConstructionError> {
        if FLAKY_ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(anyhow::anyhow!("not yet").into());
        }
        Ok(Self(store.clone()))
    }

    fn store(&self) -> &Store {
        &self.0
    }
}

#[test]
fn test_failures_are_not_cached() {
    let cache = setup_cache();
    let store = Store::empty();

    let err = cache.create::<Flaky>(&store).unwrap_err();
    assert!(matches!(err, ContextError::ConstructionFailed { .. }));
    assert_eq!(cache.entry_count(), 0);

    let flaky = cache.create::<Flaky>(&store).unwrap();
    let flaky2 = cache.create::<Flaky>(&store).unwrap();
    assert!(Arc::ptr_eq(&flaky, &flaky2));
    assert_eq!(FLAKY_ATTEMPTS.load(Ordering::SeqCst), 2);
}

#[derive(Debug)]
struct Dotted(Store);

impl Context for Dotted {
    const GROUP: &'static str = "Some.Group";
    type Parent = ();

    fn construct(store: &Store) -> Result<Self, ConstructionError> {
        Ok(Self(store.clone()))
    }

    fn store(&self) -> &Store {
        &self.0
    }
}

#[test]
fn test_invalid_group() {
    let cache = setup_cache();

    let err = cache.create::<Dotted>(&Store::empty()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"type 'integration::failures::Dotted' declares the invalid group 'Some.Group'");
    assert!(err.cause().is_none());
}
