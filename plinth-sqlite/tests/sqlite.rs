#[cfg(test)]
mod tests {
    use plinth_sqlite::SQLiteConnection;
    use plinth_tests::{execute_tests, init_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        const DB_PATH: &str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH).await.expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        execute_tests::<SQLiteConnection>(&format!("sqlite://{}?mode=rwc", DB_PATH)).await;
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created by the suite"
        );
    }
}
