use indoc::indoc;
use plinth_core::SqlWriter;

/// SQLite has no `information_schema`, the catalog is read through the table-valued pragmas.
#[derive(Debug, Default, Clone, Copy)]
pub struct SQLiteSqlWriter {}

impl SqlWriter for SQLiteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_table_columns_query(&self, out: &mut String) {
        out.push_str(indoc! {"
            SELECT lower(name) AS column_name, type AS data_type
            FROM pragma_table_info(?)
            ORDER BY cid"
        });
    }

    fn write_primary_key_query(&self, out: &mut String) {
        out.push_str(indoc! {"
            SELECT lower(name) AS column_name
            FROM pragma_table_info(lower(?))
            WHERE pk > 0
            ORDER BY pk"
        });
    }
}
