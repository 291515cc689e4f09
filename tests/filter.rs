#[cfg(test)]
mod tests {
    use plinth::{
        Conjunction, Error, FilterFragment, GenericSqlWriter, Operator, Value, assemble_filter,
    };

    const WRITER: GenericSqlWriter = GenericSqlWriter::new();

    #[test]
    fn assemble_in_input_order() {
        let fragments = assemble_filter(
            &WRITER,
            [
                ("name", Value::from("Ada")),
                ("age", Value::Int64(36)),
                ("Nick Name", Value::Null),
            ],
            Operator::GtEq,
        );
        assert_eq!(
            fragments,
            [
                FilterFragment::new(r#""name" >= ?"#, "Ada"),
                FilterFragment::new(r#""age" >= ?"#, 36),
                FilterFragment::new(r#""Nick Name" >= ?"#, Value::Null),
            ]
        );
    }

    #[test]
    fn containing_wraps_the_value() {
        let fragments = assemble_filter(&WRITER, [("title", "50%")], Operator::Containing);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].sql, r#""title" LIKE ?"#);
        assert_eq!(fragments[0].param, Value::Varchar("%50%%".into()));
        let fragment = FilterFragment::compare(&WRITER, "code", Operator::Containing, 7, true);
        assert_eq!(fragment.sql, r#"? LIKE "code""#);
        assert_eq!(fragment.param, Value::Varchar("%7%".into()));
    }

    #[test]
    fn field_names_are_quoted() {
        let fragment = FilterFragment::compare(
            &WRITER,
            r#"a" = 1 OR "b"#,
            Operator::Eq,
            1,
            false,
        );
        assert_eq!(fragment.sql, r#""a"" = 1 OR ""b" = ?"#);
    }

    #[test]
    fn operators() {
        for (text, operator, sql) in [
            ("==", Operator::Eq, "="),
            ("<>", Operator::NotEq, "<>"),
            ("<", Operator::Lt, "<"),
            ("<=", Operator::LtEq, "<="),
            (">", Operator::Gt, ">"),
            (">=", Operator::GtEq, ">="),
            ("like", Operator::Like, "LIKE"),
            ("CONTAINING", Operator::Containing, "LIKE"),
        ] {
            assert_eq!(text.parse::<Operator>(), Ok(operator));
            assert_eq!(operator.as_sql(), sql);
        }
        assert_eq!(Operator::default(), Operator::Eq);
        assert!(matches!(
            "IS NULL".parse::<Operator>(),
            Err(Error::InvalidDataset(..))
        ));
        assert_eq!(Conjunction::default().to_string(), "AND");
        assert_eq!(Conjunction::Or.to_string(), "OR");
    }
}
