pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$query
                .char_indices()
                .nth(497)
                .map(|(i, _)| i)
                .unwrap_or($query.len())]
                .trim_end(),
            if $query.chars().nth(497).is_some() {
                "..."
            } else {
                ""
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_by_skips_empty_items() {
        let mut out = String::from("(");
        separated_by(
            &mut out,
            ["a", "", "b", "c"],
            |out, v| out.push_str(v),
            ", ",
        );
        out.push(')');
        assert_eq!(out, "(a, b, c)");
    }

    #[test]
    fn truncate_long_keeps_short_queries() {
        let short = "SELECT 1";
        assert_eq!(format!("{}", truncate_long!(short)), "SELECT 1");
        let long = "x".repeat(600);
        let truncated = format!("{}", truncate_long!(long));
        assert_eq!(truncated.len(), 500);
        assert!(truncated.ends_with("..."));
    }
}
