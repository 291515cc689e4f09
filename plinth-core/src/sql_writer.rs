use indoc::indoc;

/// Dialect hooks used by the statement builders.
///
/// Identifier quoting and transaction control have sensible defaults, the catalog
/// queries default to `information_schema` and can be replaced by backends that do not
/// expose it. Every catalog query takes the table name as its only `?` parameter.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    /// Emit the positional placeholder for the next parameter.
    fn write_placeholder(&self, out: &mut String) {
        out.push('?');
    }

    /// Emit BEGIN statement.
    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN");
    }

    /// Emit COMMIT statement.
    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT");
    }

    /// Emit ROLLBACK statement.
    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK");
    }

    /// Query returning `column_name` (lower case) and `data_type` for each column of a table.
    fn write_table_columns_query(&self, out: &mut String) {
        out.push_str(indoc! {"
            SELECT lower(column_name) AS column_name, data_type::text AS data_type
            FROM information_schema.columns
            WHERE table_name::text = ? AND table_schema = 'public'
            ORDER BY ordinal_position"
        });
    }

    /// Query returning the `column_name` (lower case) of the primary key of a table.
    fn write_primary_key_query(&self, out: &mut String) {
        out.push_str(indoc! {"
            SELECT DISTINCT lower(b.column_name) AS column_name
            FROM information_schema.table_constraints a
            JOIN information_schema.constraint_column_usage b USING (constraint_schema, constraint_name)
            WHERE a.table_schema = 'public'
            AND a.table_name::text = lower(?)
            AND a.constraint_type = 'PRIMARY KEY'"
        });
    }
}

/// Fallback generic SQL writer (closest to PostgreSQL conventions).
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_quoted_and_escaped() {
        let writer = GenericSqlWriter::new();
        let mut out = String::new();
        writer.write_identifier_quoted(&mut out, "plain");
        out.push(' ');
        writer.write_identifier_quoted(&mut out, r#"say "hi""#);
        out.push(' ');
        writer.write_identifier_quoted(&mut out, "ünïcödé\"x");
        assert_eq!(out, r#""plain" "say ""hi""" "ünïcödé""x""#);
    }

    #[test]
    fn catalog_queries_take_one_parameter() {
        let writer = GenericSqlWriter::new();
        let mut columns = String::new();
        writer.write_table_columns_query(&mut columns);
        assert_eq!(columns.matches('?').count(), 1);
        assert!(columns.contains("information_schema.columns"));
        let mut pk = String::new();
        writer.write_primary_key_query(&mut pk);
        assert_eq!(pk.matches('?').count(), 1);
        assert!(pk.contains("PRIMARY KEY"));
    }
}
