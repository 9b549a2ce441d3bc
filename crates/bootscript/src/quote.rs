use std::borrow::Cow;

/// Quote `value` as a single shell word.
///
/// Values made only of characters the shell never interprets are returned
/// as-is; everything else is wrapped in single quotes.
pub fn sh_quote(value: &str) -> Cow<'_, str> {
    let safe = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_./:=@%+,".contains(&b));
    if safe {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}
