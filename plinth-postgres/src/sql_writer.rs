use plinth_core::SqlWriter;

/// Uses the `information_schema` catalog queries, `?` placeholders are numbered when the
/// statement is prepared.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresSqlWriter {}

impl SqlWriter for PostgresSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
