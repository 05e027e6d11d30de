use serde_json::Value;

/// Characters Telegram's MarkdownV2 parser treats as markup.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Prefix every MarkdownV2 special character in `text` with a backslash.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a JSON value for MarkdownV2.
///
/// Strings are escaped directly. Arrays and objects are copied one level
/// deep with their string members escaped; nested records are carried over
/// untouched. Anything else comes back as-is.
pub fn escape_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_markdown_v2(s)),
        Value::Array(items) => Value::Array(items.iter().map(escape_shallow).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, v)| (key.clone(), escape_shallow(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn escape_shallow(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(escape_markdown_v2(s)),
        other => other.clone(),
    }
}
