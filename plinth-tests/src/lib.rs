mod aliases;
mod finders;
mod records;
mod schema;
mod transactions;

use aliases::aliases;
use finders::finders;
use log::LevelFilter;
use plinth::{Config, Connection, ConnectionParams, Driver, Registry};
use records::{records, records_with_natural_key, records_without_key};
use schema::schema;
use std::env;
use transactions::transactions;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Configuration used by the suite: `default` points at `dsn`, the other entries are
/// aliases of it, `loop_a` and `loop_b` reference each other.
pub fn test_config(dsn: &str) -> Config {
    Config::new()
        .with_entry(
            "default",
            ConnectionParams {
                dsn: dsn.into(),
                db: "plinth_tests".into(),
                ..Default::default()
            },
        )
        .with_entry("main", "default")
        .with_entry("replica", "main")
        .with_entry("loop_a", "loop_b")
        .with_entry("loop_b", "loop_a")
}

/// Column definition of an auto generated integer primary key.
pub(crate) fn serial_key<C: Connection>() -> &'static str {
    match <C::Driver as Driver>::NAME {
        "postgres" => "SERIAL PRIMARY KEY",
        _ => "INTEGER PRIMARY KEY",
    }
}

pub async fn execute_tests<C: Connection>(dsn: &str) {
    let registry = Registry::<C>::new(test_config(dsn));
    aliases(&registry).await;
    let database = registry
        .default_instance()
        .await
        .expect("Could not connect the default instance");
    schema(&database).await;
    records(&database).await;
    records_without_key(&database).await;
    records_with_natural_key(&database).await;
    finders(&database).await;
    transactions(&database).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
