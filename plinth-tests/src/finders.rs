use crate::serial_key;
use plinth::{
    Conjunction, Connection, Database, FilterFragment, Operator, Ordered, Record, Row, Select,
    Value,
};
use std::sync::Arc;

fn author(name: &str, country: &str, born: i64) -> Row {
    [
        ("name".to_string(), Value::from(name)),
        ("country".to_string(), Value::from(country)),
        ("born".to_string(), Value::Int64(born)),
    ]
    .into_iter()
    .collect()
}

pub async fn finders<C: Connection>(database: &Arc<Database<C>>) {
    database
        .execute_raw(&format!(
            "DROP TABLE IF EXISTS plinth_authors;
            CREATE TABLE plinth_authors (
                id {},
                name VARCHAR(100) NOT NULL,
                country VARCHAR(2),
                born INTEGER
            );",
            serial_key::<C>()
        ))
        .await
        .expect("Could not create plinth_authors");
    database.clear_schema_cache().await;

    let affected = database
        .insert_multi(
            "plinth_authors",
            &[
                author("Italo Calvino", "IT", 1923),
                author("Umberto Eco", "IT", 1932),
                author("Ursula K. Le Guin", "US", 1929),
                author("Jorge Luis Borges", "AR", 1899),
            ],
        )
        .await
        .expect("Could not insert the authors");
    assert_eq!(affected.rows_affected, 4);

    let mut single = Row::new();
    single.insert("name".into(), Value::from("Stanisław Lem"));
    single.insert("country".into(), Value::from("PL"));
    single.insert("born".into(), Value::Int64(1921));
    let lem = database
        .insert("plinth_authors", &single)
        .await
        .expect("Could not insert a single author");
    assert!(lem.as_i64().is_some_and(|v| v > 0));

    // Default order is the primary key
    let rows = database.select(&Select::from("plinth_authors")).await;
    assert_eq!(rows.len(), 5);
    let ids: Vec<i64> = rows
        .iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect();
    assert!(ids.windows(2).all(|v| v[0] < v[1]));
    assert_eq!(ids.last().copied(), lem.as_i64());

    // Explicit ordering, projection and limit
    let rows = database
        .select(
            &Select::from("plinth_authors")
                .fields(["name"])
                .order_by([Ordered::desc("born")])
                .limit(2),
        )
        .await;
    assert_eq!(
        rows.iter()
            .map(|row| row.keys().map(String::as_str).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
        [["name"], ["name"]]
    );
    assert_eq!(
        rows.iter()
            .filter_map(|row| row.get("name").and_then(Value::as_str))
            .collect::<Vec<_>>(),
        ["Umberto Eco", "Ursula K. Le Guin"]
    );

    // Filters joined with AND
    let writer = database.writer();
    let rows = database
        .select(
            &Select::from("plinth_authors")
                .filter([
                    FilterFragment::compare(writer, "country", Operator::Eq, "IT", false),
                    FilterFragment::compare(writer, "born", Operator::Gt, 1925, false),
                ])
                .conjunction(Conjunction::And),
        )
        .await;
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("name"),
        Some(&Value::Varchar("Umberto Eco".into()))
    );

    // Values of the same field are joined with OR
    let rows = database
        .fetch_table_data(
            "plinth_authors",
            "country",
            ["AR", "US"],
            Operator::Eq,
            Some("name"),
            false,
            0,
            &["name", "country"],
        )
        .await;
    assert_eq!(
        rows.iter()
            .filter_map(|row| row.get("name").and_then(Value::as_str))
            .collect::<Vec<_>>(),
        ["Jorge Luis Borges", "Ursula K. Le Guin"]
    );
    let rows = database
        .fetch_table_data(
            "plinth_authors",
            "name",
            ["Guin"],
            Operator::Containing,
            None,
            false,
            0,
            &[],
        )
        .await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("born").and_then(Value::as_i64), Some(1929));
    let rows = database
        .fetch_table_data(
            "plinth_authors",
            "born",
            [1925],
            Operator::Gt,
            Some("born"),
            true,
            0,
            &["born"],
        )
        .await;
    assert_eq!(
        rows.iter()
            .filter_map(|row| row.get("born").and_then(Value::as_i64))
            .collect::<Vec<_>>(),
        [1899, 1921, 1923]
    );
    let rows = database
        .fetch_table_data(
            "plinth_authors",
            "",
            [Value::Null],
            Operator::Eq,
            None,
            false,
            3,
            &[],
        )
        .await;
    assert_eq!(rows.len(), 3);

    // Finders on records
    let list = Record::fetch_list(database, "plinth_authors", ids.iter().rev().copied(), None).await;
    assert_eq!(
        list.iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .collect::<Vec<_>>(),
        ids
    );
    let none: Vec<Value> = Vec::new();
    assert!(
        Record::fetch_list(database, "plinth_authors", none, None)
            .await
            .is_empty()
    );
    assert!(
        Record::fetch_list(database, "plinth_authors", [Value::Null], None)
            .await
            .is_empty()
    );
    let italians = Record::fetch_list(database, "plinth_authors", ["IT"], Some("country")).await;
    assert_eq!(italians.len(), 2);
    let by_name = Record::index_by(italians, "name");
    let mut names = by_name.keys().map(String::as_str).collect::<Vec<_>>();
    names.sort();
    assert_eq!(names, ["Italo Calvino", "Umberto Eco"]);
    assert_eq!(
        by_name["Umberto Eco"].get("born").and_then(Value::as_i64),
        Some(1932)
    );
    let lem = Record::fetch(database, "plinth_authors", "PL", Some("country"))
        .await
        .expect("Lem must be found by country");
    assert_eq!(lem.get("name"), Some(&Value::Varchar("Stanisław Lem".into())));
}
