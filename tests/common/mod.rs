#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use modelang::{
    compiler::{Compiler, MemoryLoader},
    eval::{Engine, FixedClock},
    Model,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()
}

/// An engine whose `now` is [`now`].
pub fn engine() -> Engine {
    Engine::default().with_date_resolver(Arc::new(FixedClock(now())))
}

/// Compiles a self-contained source.
pub fn model(source: &str) -> Model {
    Compiler::new(Box::new(MemoryLoader::new()))
        .compile(source, Path::new("/"))
        .unwrap_or_else(|e| panic!("failed to compile:\n{source}\n{e}"))
}
