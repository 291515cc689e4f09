use crate::ValueHolder;
use async_stream::try_stream;
use plinth_core::{
    DriverError, Error, QueryResult, Result, RowLabeled, RowNames, RowValues, RowsAffected, Value,
    stream::{Stream, StreamExt},
};
use std::pin::pin;
use tokio_postgres::{RowStream, SimpleQueryMessage};

pub(crate) fn driver_error(error: tokio_postgres::Error) -> Error {
    let code = error.code().map(|c| c.code().to_string());
    let message = match error.as_db_error() {
        Some(e) => e.message().to_string(),
        None => error.to_string(),
    };
    Error::new(DriverError::new(code, message))
}

/// Number the `?` placeholders as `$1`, `$2`, ... leaving quoted text and identifiers alone.
pub(crate) fn rewrite_placeholders(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut index = 0;
    for c in sql.chars() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            (None, '?') => {
                index += 1;
                result.push('$');
                result.push_str(&index.to_string());
                continue;
            }
            _ => {}
        }
        result.push(c);
    }
    result
}

pub(crate) fn row_to_values(row: tokio_postgres::Row) -> Result<RowValues> {
    (0..row.len())
        .map(|i| match row.try_get::<_, ValueHolder>(i) {
            Ok(v) => Ok(v.0),
            Err(e) => {
                let column = &row.columns()[i];
                Err(Error::new(e).context(format!(
                    "Could not decode column {} `{}` of type {}",
                    i,
                    column.name(),
                    column.type_()
                )))
            }
        })
        .collect()
}

/// Rows of an extended query, followed by the count the server reported for it.
pub(crate) fn stream_rows<F>(rows: F) -> impl Stream<Item = Result<QueryResult>> + Send
where
    F: Future<Output = std::result::Result<RowStream, tokio_postgres::Error>> + Send,
{
    try_stream! {
        let rows = rows.await.map_err(driver_error)?;
        let mut rows = pin!(rows);
        let mut labels: Option<RowNames> = None;
        while let Some(row) = rows.next().await.transpose().map_err(driver_error)? {
            let labels = labels.get_or_insert_with(|| {
                row.columns().iter().map(|c| c.name().to_string()).collect()
            });
            yield QueryResult::Row(RowLabeled::new(labels.clone(), row_to_values(row)?));
        }
        if let Some(rows_affected) = rows.rows_affected() {
            yield QueryResult::Affected(RowsAffected {
                rows_affected,
                last_affected_id: None,
            });
        }
    }
}

/// Messages of the simple protocol, every column arrives as text.
pub(crate) fn stream_simple<F>(messages: F) -> impl Stream<Item = Result<QueryResult>> + Send
where
    F: Future<Output = std::result::Result<Vec<SimpleQueryMessage>, tokio_postgres::Error>> + Send,
{
    try_stream! {
        let messages = messages.await.map_err(driver_error)?;
        let mut labels: Option<RowNames> = None;
        for message in messages {
            match message {
                SimpleQueryMessage::Row(row) => {
                    let labels = labels.get_or_insert_with(|| {
                        row.columns().iter().map(|c| c.name().to_string()).collect()
                    });
                    let values: RowValues = (0..row.len())
                        .map(|i| match row.get(i) {
                            Some(v) => Value::Varchar(v.into()),
                            None => Value::Null,
                        })
                        .collect();
                    yield QueryResult::Row(RowLabeled::new(labels.clone(), values));
                }
                SimpleQueryMessage::CommandComplete(rows_affected) => {
                    labels = None;
                    yield QueryResult::Affected(RowsAffected {
                        rows_affected,
                        last_affected_id: None,
                    });
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{rewrite_placeholders, stream_simple};
    use plinth_core::{QueryResult, stream::StreamExt};
    use tokio_postgres::SimpleQueryMessage;

    #[test]
    fn placeholders_are_numbered() {
        assert_eq!(
            rewrite_placeholders(r#"SELECT * FROM "t" WHERE "a" = ? AND "b" > ?"#),
            r#"SELECT * FROM "t" WHERE "a" = $1 AND "b" > $2"#
        );
    }

    #[test]
    fn quoted_question_marks_are_kept() {
        assert_eq!(
            rewrite_placeholders(r#"SELECT '?', "why?", 'it''s ?' FROM "t" WHERE "a" = ?"#),
            r#"SELECT '?', "why?", 'it''s ?' FROM "t" WHERE "a" = $1"#
        );
    }

    #[tokio::test]
    async fn every_command_reports_its_count() {
        let results: Vec<_> = stream_simple(async {
            Ok::<_, tokio_postgres::Error>(vec![
                SimpleQueryMessage::CommandComplete(0),
                SimpleQueryMessage::CommandComplete(2),
            ])
        })
        .collect()
        .await;
        let counts: Vec<u64> = results
            .into_iter()
            .filter_map(|v| match v.expect("The messages must convert") {
                QueryResult::Affected(v) => Some(v.rows_affected),
                QueryResult::Row(..) => None,
            })
            .collect();
        assert_eq!(counts, [0, 2]);
    }
}
