#[cfg(test)]
mod tests {
    use indoc::indoc;
    use plinth::{
        Conjunction, Error, FilterFragment, GenericSqlWriter, Operator, Ordered, Row, Select,
        Statement, Value, build_delete, build_insert, build_insert_default, build_select,
        build_update,
    };

    const WRITER: GenericSqlWriter = GenericSqlWriter::new();

    fn row<const N: usize>(values: [(&str, Value); N]) -> Row {
        values.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn select_everything() {
        let statement = build_select(&WRITER, &Select::from("customers"), None);
        assert_eq!(
            statement,
            Statement::new(
                indoc! {r#"
                    SELECT *
                    FROM "customers""#},
                vec![]
            )
        );
        let statement = build_select(&WRITER, &Select::from("customers"), Some("id"));
        assert_eq!(
            statement.sql,
            indoc! {r#"
                SELECT *
                FROM "customers"
                ORDER BY "id""#}
        );
    }

    #[test]
    fn select_with_everything() {
        let select = Select::from("orders")
            .fields(["id", "total"])
            .filter([
                FilterFragment::compare(&WRITER, "status", Operator::NotEq, "void", false),
                FilterFragment::compare(&WRITER, "total", Operator::Gt, 100, false),
            ])
            .conjunction(Conjunction::Or)
            .order_by([Ordered::desc("created_at"), Ordered::asc("id")])
            .limit(20);
        let statement = build_select(&WRITER, &select, Some("ignored"));
        assert_eq!(
            statement.sql,
            indoc! {r#"
                SELECT "id", "total"
                FROM "orders"
                WHERE "status" <> ? OR "total" > ?
                ORDER BY "created_at" DESC, "id"
                LIMIT 20"#}
        );
        assert_eq!(statement.params, [Value::from("void"), Value::Int64(100)]);
    }

    #[test]
    fn select_skips_empty_order_columns() {
        let select = Select::from("orders").order_by(["", "  "]).limit(0);
        let statement = build_select(&WRITER, &select, Some("id"));
        assert_eq!(
            statement.sql,
            indoc! {r#"
                SELECT *
                FROM "orders""#}
        );
    }

    #[test]
    fn insert_many_rows() {
        let rows = [
            row([("name", Value::from("Ada")), ("age", Value::Int64(36))]),
            row([("age", Value::Int64(41)), ("extra", Value::Boolean(true))]),
        ];
        let statement = build_insert(&WRITER, "people", &rows).expect("Could not build");
        assert_eq!(
            statement.sql,
            indoc! {r#"
                INSERT INTO "people" ("name", "age") VALUES
                (?, ?),
                (?, ?)"#}
        );
        assert_eq!(
            statement.params,
            [
                Value::from("Ada"),
                Value::Int64(36),
                Value::Null,
                Value::Int64(41)
            ]
        );
    }

    #[test]
    fn insert_rejects_bad_input() {
        let rows: [Row; 0] = [];
        let error = build_insert(&WRITER, "people", &rows).expect_err("No rows");
        assert_eq!(error.downcast_ref::<Error>(), Some(&Error::EmptyInsert));
        let rows = [Row::new(), row([("name", Value::from("Ada"))])];
        let error = build_insert(&WRITER, "people", &rows).expect_err("Empty first row");
        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::InvalidDataset(..))
        ));
        assert_eq!(
            build_insert_default(&WRITER, "people").sql,
            r#"INSERT INTO "people" DEFAULT VALUES"#
        );
    }

    #[test]
    fn update_and_delete() {
        let fields = row([
            ("id", Value::Int64(5)),
            ("name", Value::from("Grace")),
            ("active", Value::Boolean(false)),
        ]);
        let statement =
            build_update(&WRITER, "people", &fields, "id", Value::Int64(5)).expect("Could not build");
        assert_eq!(
            statement.sql,
            indoc! {r#"
                UPDATE "people" SET "id" = ?, "name" = ?, "active" = ?
                WHERE "id" = ?"#}
        );
        assert_eq!(statement.params.len(), 4);
        assert_eq!(statement.params[3], Value::Int64(5));
        assert!(build_update(&WRITER, "people", &Row::new(), "id", Value::Int64(5)).is_err());

        let statement = build_delete(&WRITER, "people", "id", Value::Int64(5));
        assert_eq!(
            statement,
            Statement::new(
                indoc! {r#"
                    DELETE FROM "people"
                    WHERE "id" = ?"#},
                vec![Value::Int64(5)]
            )
        );
    }
}
