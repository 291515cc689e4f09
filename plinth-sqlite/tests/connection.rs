#[cfg(test)]
mod tests {
    use plinth::{Connection, Database, Executor, Query, QueryResult, Statement, Transaction, Value};
    use plinth_sqlite::SQLiteConnection;
    use plinth_tests::{init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .expect(format!("Failed to remove test database file {}", DB_PATH).as_str());
        }
        SQLiteConnection::connect(format!("sqlite://{}?mode=rwc", DB_PATH).into())
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        SQLiteConnection::connect(format!("sqlite://{}?mode=ro", DB_PATH).into())
            .await
            .expect("Could not open the database");
        fs::remove_file(DB_PATH)
            .await
            .expect(format!("Failed to remove existing test database file {}", DB_PATH).as_str());
        silent_logs! {
            assert!(
                SQLiteConnection::connect(format!("sqlite://{}?mode=ro", DB_PATH).into())
                    .await
                    .is_err(),
                "Should not be able to open in read only unexisting database"
            );
        }
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                SQLiteConnection::connect("postgres://some_value".into())
                    .await
                    .is_err()
            );
            assert!(
                SQLiteConnection::connect("sqlite://:memory:?mode=xyz".into())
                    .await
                    .is_err()
            );
        }
    }

    #[tokio::test]
    async fn memory() {
        init_logs();
        let mut connection = SQLiteConnection::connect("sqlite://:memory:".into())
            .await
            .expect("Could not open an in memory database");
        let affected = connection
            .execute(Query::Raw(
                "CREATE TABLE t (a INTEGER, b TEXT); INSERT INTO t VALUES (1, 'x'), (2, NULL);"
                    .into(),
            ))
            .await
            .expect("Could not run the script");
        assert_eq!(affected.rows_affected, 2);
        let mut query = connection
            .prepare("SELECT a, b FROM t WHERE a >= ? ORDER BY a".into())
            .await
            .expect("Could not prepare the query");
        query.bind(1).expect("Could not bind the parameter");
        let rows: Vec<_> = {
            use plinth::stream::StreamExt;
            connection.run(query).collect().await
        };
        let rows: Vec<_> = rows
            .into_iter()
            .filter_map(|v| match v.expect("The query must succeed") {
                QueryResult::Row(row) => Some(row),
                QueryResult::Affected(..) => None,
            })
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values(), [Value::Int64(1), Value::Varchar("x".into())]);
        assert_eq!(rows[1].get_column("B"), Some(&Value::Null));

        let database = Database::new("memory", "main", connection);
        assert!(database.table_exists("t", false).await);
        let rows = database
            .query(&Statement::new("SELECT count(*) AS n FROM t", Vec::new()))
            .await;
        assert_eq!(rows[0].get("n"), Some(&Value::Int64(2)));
    }

    #[tokio::test]
    async fn scripts() {
        init_logs();
        let connection = SQLiteConnection::connect("sqlite://:memory:".into())
            .await
            .expect("Could not open an in memory database");
        let database = Database::new("memory", "main", connection);
        database
            .execute_raw(
                "CREATE TABLE left_side (a INTEGER);
                CREATE TABLE right_side (b INTEGER);
                INSERT INTO right_side VALUES (7);",
            )
            .await
            .expect("Could not run the script");
        assert!(database.table_exists("left_side", true).await);
        assert!(database.table_exists("right_side", true).await);

        // The statements before the failing one are kept
        silent_logs! {
            assert!(
                database
                    .execute_raw(
                        "INSERT INTO left_side VALUES (1);
                        INSERT INTO missing_side VALUES (2);
                        INSERT INTO left_side VALUES (3);",
                    )
                    .await
                    .is_err()
            );
        }
        let rows = database
            .query(&Statement::new("SELECT a FROM left_side", Vec::new()))
            .await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some(&Value::Int64(1)));
    }

    #[tokio::test]
    async fn dropped_transaction() {
        init_logs();
        let mut connection = SQLiteConnection::connect("sqlite://:memory:".into())
            .await
            .expect("Could not open an in memory database");
        connection
            .execute(Query::Raw("CREATE TABLE t (a INTEGER);".into()))
            .await
            .expect("Could not create the table");
        {
            let mut transaction = connection
                .begin()
                .await
                .expect("Could not begin a transaction");
            transaction
                .execute(Query::Raw("INSERT INTO t VALUES (1);".into()))
                .await
                .expect("Could not insert inside the transaction");
        }
        let mut transaction = connection
            .begin()
            .await
            .expect("The dropped transaction must have been closed");
        transaction
            .execute(Query::Raw("INSERT INTO t VALUES (2);".into()))
            .await
            .expect("Could not insert inside the transaction");
        transaction
            .commit()
            .await
            .expect("Could not commit the transaction");

        let database = Database::new("memory", "main", connection);
        let rows = database
            .query(&Statement::new("SELECT a FROM t", Vec::new()))
            .await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("a"), Some(&Value::Int64(2)));
    }
}
