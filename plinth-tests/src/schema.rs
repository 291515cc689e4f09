use crate::{serial_key, silent_logs};
use plinth::{ColumnType, Connection, Database, Error};

pub async fn schema<C: Connection>(database: &Database<C>) {
    database
        .execute_raw(&format!(
            "DROP TABLE IF EXISTS plinth_shapes;
            CREATE TABLE plinth_shapes (
                id {},
                name VARCHAR(60) NOT NULL,
                sides INTEGER,
                area REAL
            );",
            serial_key::<C>()
        ))
        .await
        .expect("Could not create plinth_shapes");

    silent_logs! {
        assert!(!database.table_exists("plinth_missing", false).await);
        let error = database
            .table_schema("plinth_missing")
            .await
            .err()
            .expect("A missing table has no schema");
        assert_eq!(
            error.downcast_ref::<Error>(),
            Some(&Error::TableNotFound("plinth_missing".into()))
        );
    }

    assert!(database.table_exists("plinth_shapes", true).await);

    // Every statement of a script runs
    database
        .execute_raw(
            "DROP TABLE IF EXISTS plinth_left;
            DROP TABLE IF EXISTS plinth_right;
            CREATE TABLE plinth_left (a INTEGER);
            CREATE TABLE plinth_right (b INTEGER);",
        )
        .await
        .expect("Could not create plinth_left and plinth_right");
    assert!(database.table_exists("plinth_left", true).await);
    assert!(database.table_exists("plinth_right", true).await);
    database
        .execute_raw("DROP TABLE plinth_left; DROP TABLE plinth_right;")
        .await
        .expect("Could not drop plinth_left and plinth_right");
    assert!(!database.table_exists("plinth_right", true).await);

    let schema = database
        .table_schema("plinth_shapes")
        .await
        .expect("Could not read the schema of plinth_shapes");
    assert_eq!(schema.table, "plinth_shapes");
    assert_eq!(schema.primary_key.as_deref(), Some("id"));
    assert_eq!(
        schema.columns.keys().map(String::as_str).collect::<Vec<_>>(),
        ["id", "name", "sides", "area"]
    );
    assert_eq!(schema.column_type("id"), Some(ColumnType::Integer));
    assert_eq!(schema.column_type("name"), Some(ColumnType::Text));
    assert_eq!(schema.column_type("sides"), Some(ColumnType::Integer));
    assert_eq!(schema.column_type("area"), Some(ColumnType::Numeric));
    assert_eq!(schema.column_type("color"), None);
    assert!(!database.schema_cache().is_empty().await);

    // Lookups are served from the cache until it is cleared
    database
        .execute_raw("DROP TABLE plinth_shapes")
        .await
        .expect("Could not drop plinth_shapes");
    assert!(database.table_exists("plinth_shapes", false).await);
    assert!(!database.table_exists("plinth_shapes", true).await);
}
