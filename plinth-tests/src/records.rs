use crate::{serial_key, silent_logs};
use plinth::{Connection, Database, Record, Value};
use std::sync::Arc;

pub async fn records<C: Connection>(database: &Arc<Database<C>>) {
    database
        .execute_raw(&format!(
            "DROP TABLE IF EXISTS plinth_books;
            CREATE TABLE plinth_books (
                id {},
                title VARCHAR(100) NOT NULL,
                pages INTEGER,
                author VARCHAR(100)
            );",
            serial_key::<C>()
        ))
        .await
        .expect("Could not create plinth_books");
    database.clear_schema_cache().await;

    // Insert
    let mut book = Record::new(database.clone(), "plinth_books")
        .await
        .expect("Could not create a record of plinth_books");
    assert_eq!(book.table(), "plinth_books");
    assert_eq!(book.primary_key(), Some("id"));
    assert_eq!(book.len(), 4);
    assert!(book.is_new());
    book.set("Title", "The Hobbit")
        .set("pages", 310)
        .set("publisher", "Allen & Unwin");
    assert!(book.contains("title"));
    assert!(!book.contains("author"));
    let status = book.post().await;
    assert!(status.is_ok(), "{:?}", status.error);
    assert_eq!(status.error, None);
    assert!(!book.is_new());
    assert_eq!(book.get("publisher"), None);
    let id = book
        .get("id")
        .and_then(Value::as_i64)
        .expect("The generated key must be stored back into the record");
    assert!(id > 0);

    // Read
    let fetched = Record::fetch(database, "plinth_books", id, None)
        .await
        .expect("The inserted book must be found");
    assert_eq!(fetched.get("title"), Some(&Value::Varchar("The Hobbit".into())));
    assert_eq!(fetched.get("pages").and_then(Value::as_i64), Some(310));
    assert_eq!(fetched.get("author"), Some(&Value::Null));
    assert_eq!(
        fetched.iter().map(|(k, _)| k).collect::<Vec<_>>(),
        ["id", "title", "pages", "author"]
    );
    let by_title = Record::fetch(database, "plinth_books", "The Hobbit", Some("TITLE"))
        .await
        .expect("The book must be found by title");
    assert_eq!(by_title.get("id").and_then(Value::as_i64), Some(id));
    assert!(
        Record::fetch(database, "plinth_books", id + 1000, None)
            .await
            .is_none()
    );

    // Update
    let mut fetched = fetched;
    fetched.set("title", "The Hobbit, or There and Back Again");
    let status = fetched.post().await;
    assert!(status.is_ok(), "{:?}", status.error);
    assert_eq!(fetched.get("id").and_then(Value::as_i64), Some(id));
    let status = fetched.post().await;
    assert!(status.is_ok(), "{:?}", status.error);
    let rows = Record::fetch_list(database, "plinth_books", [id], None).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("title"),
        Some(&Value::Varchar("The Hobbit, or There and Back Again".into()))
    );

    // Blank strings on numeric columns are not written
    fetched.set("pages", "  ").set("author", "J. R. R. Tolkien");
    let status = fetched.update().await;
    assert!(status.is_ok(), "{:?}", status.error);
    assert_eq!(fetched.get("pages"), None);
    let reloaded = Record::fetch(database, "plinth_books", id, None)
        .await
        .expect("The updated book must be found");
    assert_eq!(reloaded.get("pages").and_then(Value::as_i64), Some(310));
    assert_eq!(
        reloaded.get("author"),
        Some(&Value::Varchar("J. R. R. Tolkien".into()))
    );

    // Empty strings on text columns are written
    fetched.set("author", "");
    let status = fetched.update().await;
    assert!(status.is_ok(), "{:?}", status.error);
    assert_eq!(fetched.get("author"), Some(&Value::Varchar("".into())));
    let reloaded = Record::fetch(database, "plinth_books", id, None)
        .await
        .expect("The updated book must be found");
    assert_eq!(reloaded.get("author"), Some(&Value::Varchar("".into())));

    // Insert with an explicit key
    let mut second = Record::new(database.clone(), "plinth_books")
        .await
        .expect("Could not create a record of plinth_books");
    second.set("id", id + 10).set("title", "Farmer Giles of Ham");
    let status = second.insert().await;
    assert!(status.is_ok(), "{:?}", status.error);
    assert_eq!(second.get("id").and_then(Value::as_i64), Some(id + 10));

    // Delete
    let status = second.delete().await;
    assert!(status.is_ok(), "{:?}", status.error);
    assert!(
        Record::fetch(database, "plinth_books", id + 10, None)
            .await
            .is_none()
    );

    // A failing insert reports the error instead of panicking
    let mut invalid = Record::new(database.clone(), "plinth_books")
        .await
        .expect("Could not create a record of plinth_books");
    invalid.set("pages", 12);
    silent_logs! {
        let status = invalid.post().await;
        assert!(!status.is_ok());
        assert!(status.error.is_some());
    }
    assert!(invalid.is_new());
}

pub async fn records_without_key<C: Connection>(database: &Arc<Database<C>>) {
    database
        .execute_raw(
            "DROP TABLE IF EXISTS plinth_notes;
            CREATE TABLE plinth_notes (body VARCHAR(200), pinned INTEGER);",
        )
        .await
        .expect("Could not create plinth_notes");
    database.clear_schema_cache().await;

    let mut note = Record::new(database.clone(), "plinth_notes")
        .await
        .expect("Could not create a record of plinth_notes");
    assert_eq!(note.primary_key(), None);
    assert!(note.is_new());
    note.set("body", "remember the milk").set("pinned", true);
    let status = note.post().await;
    assert!(status.is_ok(), "{:?}", status.error);
    assert!(note.is_new());

    silent_logs! {
        let update = note.update().await;
        let delete = note.delete().await;
        assert!(!update.is_ok());
        assert!(!delete.is_ok());
        assert!(
            update
                .error
                .as_deref()
                .is_some_and(|e| e.contains("primary key"))
        );
    }

    let notes = Record::fetch_list(
        database,
        "plinth_notes",
        ["remember the milk"],
        Some("body"),
    )
    .await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].get("pinned").and_then(Value::as_i64), Some(1));

    // Booleans are stored as integers
    let mut other = Record::new(database.clone(), "plinth_notes")
        .await
        .expect("Could not create a record of plinth_notes");
    other.set("body", "buy bread").set("pinned", false);
    let status = other.post().await;
    assert!(status.is_ok(), "{:?}", status.error);
    let notes = Record::fetch_list(database, "plinth_notes", ["buy bread"], Some("body")).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].get("pinned").and_then(Value::as_i64), Some(0));

    silent_logs! {
        assert!(
            Record::<C>::new(database.clone(), "plinth_nothing")
                .await
                .is_err()
        );
    }
}

pub async fn records_with_natural_key<C: Connection>(database: &Arc<Database<C>>) {
    database
        .execute_raw(
            "DROP TABLE IF EXISTS plinth_codes;
            CREATE TABLE plinth_codes (
                code VARCHAR(10) PRIMARY KEY,
                id INTEGER,
                label VARCHAR(40)
            );",
        )
        .await
        .expect("Could not create plinth_codes");
    database.clear_schema_cache().await;

    for (code, id, label) in [("a", 20, "first"), ("b", 10, "second")] {
        let mut record = Record::new(database.clone(), "plinth_codes")
            .await
            .expect("Could not create a record of plinth_codes");
        assert_eq!(record.primary_key(), Some("code"));
        record.set("code", code).set("id", id).set("label", label);
        assert!(!record.is_new());
        let status = record.insert().await;
        assert!(status.is_ok(), "{:?}", status.error);
        assert_eq!(record.get("code"), Some(&Value::Varchar(code.into())));
    }

    // Finders search the `id` column unless told otherwise
    let found = Record::fetch(database, "plinth_codes", 10, None)
        .await
        .expect("The code must be found by id");
    assert_eq!(found.get("label"), Some(&Value::Varchar("second".into())));
    let list = Record::fetch_list(database, "plinth_codes", [20, 10], None).await;
    assert_eq!(
        list.iter()
            .filter_map(|r| r.get("code").and_then(Value::as_str))
            .collect::<Vec<_>>(),
        ["b", "a"]
    );
    let found = Record::fetch(database, "plinth_codes", "a", Some("code"))
        .await
        .expect("The code must be found by its key");
    assert_eq!(found.get("id").and_then(Value::as_i64), Some(20));
}
