use crate::{serial_key, silent_logs};
use plinth::{Connection, Database, Error, Row, Select, Statement, Value};
use std::sync::Arc;

pub async fn transactions<C: Connection>(database: &Arc<Database<C>>) {
    database
        .execute_raw(&format!(
            "DROP TABLE IF EXISTS plinth_tags;
            CREATE TABLE plinth_tags (
                id {},
                label VARCHAR(40) NOT NULL UNIQUE
            );",
            serial_key::<C>()
        ))
        .await
        .expect("Could not create plinth_tags");
    database.clear_schema_cache().await;

    let mut tag = Row::new();
    tag.insert("label".into(), Value::from("rust"));
    let first = database
        .insert("plinth_tags", &tag)
        .await
        .expect("Could not insert the first tag");
    assert!(!first.is_empty_key());

    // The failed insert is rolled back and the connection stays usable
    silent_logs! {
        let error = database
            .insert("plinth_tags", &tag)
            .await
            .err()
            .expect("A duplicated label must be rejected");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::SqlExecution { .. })
        ));
    }
    tag.insert("label".into(), Value::from("sql"));
    let second = database
        .insert("plinth_tags", &tag)
        .await
        .expect("Could not insert after a failed insert");
    assert_ne!(first, second);
    let rows = database.select(&Select::from("plinth_tags")).await;
    assert_eq!(rows.len(), 2);

    // Empty inserts are refused before reaching the database
    let error = database
        .insert_multi("plinth_tags", &[])
        .await
        .err()
        .expect("An empty insert must be refused");
    assert_eq!(error.downcast_ref::<Error>(), Some(&Error::EmptyInsert));

    // Errors of plain statements
    silent_logs! {
        let error = database
            .execute(&Statement::new("UPDATE plinth_nothing SET x = 1", Vec::new()))
            .await
            .err()
            .expect("Updating a missing table must fail");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::SqlExecution { .. })
        ));
        assert!(
            database
                .query(&Statement::new("SELECT * FROM plinth_nothing", Vec::new()))
                .await
                .is_empty()
        );
    }

    let affected = database
        .execute(&Statement::new(
            "UPDATE plinth_tags SET label = ? WHERE label = ?",
            vec![Value::from("rust-lang"), Value::from("rust")],
        ))
        .await
        .expect("Could not rename a tag");
    assert_eq!(affected.rows_affected, 1);
    let renamed = database
        .try_query(&Statement::new(
            "SELECT label FROM plinth_tags WHERE id = ?",
            vec![first],
        ))
        .await
        .expect("Could not read the renamed tag");
    assert_eq!(
        renamed[0].get("label"),
        Some(&Value::Varchar("rust-lang".into()))
    );
}
