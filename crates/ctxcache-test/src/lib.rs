//! Helpers for testing the context cache.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all console output
//!    is captured by the test runner.
//!
//!  - The process-wide [`ContextCache::global`](ctxcache::ContextCache::global) is shared by all
//!    tests in a binary. Tests that count constructions or compare instances across configurations
//!    should create their own cache instead.
//!
//!  - When using [`config_file`], hold on to the returned file for as long as its path is used.
//!    It is deleted when dropped.

use std::io::Write;

use ctxcache::{ConstructionError, Context};
use ctxcache_store::Store;
use serde::Serialize;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;

pub use tempfile::{NamedTempFile, TempDir};

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from the `ctxcache` crates and mutes all
///    other logs.
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new("ctxcache=trace,ctxcache_store=trace"))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

/// Creates a temporary directory.
///
/// The directory is deleted when the [`TempDir`] instance is dropped. Use it as a guard to
/// automatically clean up after tests.
pub fn tempdir() -> TempDir {
    TempDir::new().unwrap()
}

/// Writes `contents` to a new temporary file and returns it.
///
/// The file is deleted when the returned handle is dropped.
pub fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// A root context reading the `A` group.
#[derive(Debug, Serialize)]
pub struct A {
    #[serde(skip)]
    store: Store,
    pub f1: String,
}

impl Context for A {
    const GROUP: &'static str = "A";
    type Parent = ();

    fn construct(store: &Store) -> Result<Self, ConstructionError> {
        Ok(Self {
            store: store.clone(),
            f1: store.get("A.f1", String::from("xxx"))?,
        })
    }

    fn store(&self) -> &Store {
        &self.store
    }
}

/// Extends [`A`] with the `B` group.
#[derive(Debug, Serialize)]
pub struct B {
    #[serde(flatten)]
    pub a: A,
    pub f2: i64,
}

impl Context for B {
    const GROUP: &'static str = "B";
    type Parent = A;

    fn construct(store: &Store) -> Result<Self, ConstructionError> {
        Ok(Self {
            a: A::construct(store)?,
            f2: store.get("B.f2.i", -1)?,
        })
    }

    fn store(&self) -> &Store {
        self.a.store()
    }
}

/// Extends [`B`] with the `C` group.
#[derive(Debug, Serialize)]
pub struct C {
    #[serde(flatten)]
    pub b: B,
    pub f3: bool,
}

impl Context for C {
    const GROUP: &'static str = "C";
    type Parent = B;

    fn construct(store: &Store) -> Result<Self, ConstructionError> {
        Ok(Self {
            b: B::construct(store)?,
            f3: store.get("C.f3.b", false)?,
        })
    }

    fn store(&self) -> &Store {
        self.b.store()
    }
}

/// Extends [`A`] without providing a way to construct it.
#[derive(Debug)]
pub struct NoConstructor {
    pub a: A,
}

impl Context for NoConstructor {
    const GROUP: &'static str = "D1";
    type Parent = A;

    fn store(&self) -> &Store {
        self.a.store()
    }
}

/// Extends [`A`], but always fails to construct.
#[derive(Debug)]
pub struct Failing {
    pub a: A,
}

impl Context for Failing {
    const GROUP: &'static str = "D2";
    type Parent = A;

    fn construct(store: &Store) -> Result<Self, ConstructionError> {
        let _a = A::construct(store)?;
        Err(anyhow::anyhow!("Error!").into())
    }

    fn store(&self) -> &Store {
        self.a.store()
    }
}
