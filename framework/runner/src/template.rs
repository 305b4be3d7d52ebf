//! `{key}` placeholder substitution for request URLs and JSON bodies.
//!
//! A placeholder is a `{`, one or more of `[A-Za-z0-9_.-]`, then `}`. Braces that do not form a
//! placeholder are copied through unchanged, so literal JSON in a URL query survives.

use serde_json::Value;

use crate::context::IterationContext;

/// Fill every placeholder in `template`. Returns the first key that is missing from the context.
pub(crate) fn render(template: &str, context: &IterationContext) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start + 1..];

        match placeholder_key(candidate) {
            Some(key) => {
                let value = context.get(key).ok_or_else(|| key.to_string())?;
                out.push_str(&value_to_text(value));
                rest = &candidate[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);

    Ok(out)
}

/// Fill placeholders in every string of a JSON body. A string that is exactly one placeholder is
/// replaced by the context value itself, keeping its JSON type.
pub(crate) fn render_json(template: &Value, context: &IterationContext) -> Result<Value, String> {
    Ok(match template {
        Value::String(s) => match whole_placeholder(s) {
            Some(key) => context.get(key).cloned().ok_or_else(|| key.to_string())?,
            None => Value::String(render(s, context)?),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_json(item, context))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| Ok((name.clone(), render_json(value, context)?)))
                .collect::<Result<_, String>>()?,
        ),
        other => other.clone(),
    })
}

fn placeholder_key(s: &str) -> Option<&str> {
    let key = &s[..s.find('}')?];
    is_key(key).then_some(key)
}

fn whole_placeholder(s: &str) -> Option<&str> {
    let key = s.strip_prefix('{')?.strip_suffix('}')?;
    is_key(key).then_some(key)
}

fn is_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> IterationContext {
        let mut context = IterationContext::new(0, 0);
        context.insert("post_id", json!(42));
        context.insert("author", json!("loadtest"));
        context
    }

    #[test]
    fn renders_url_placeholders() {
        assert_eq!(
            "/posts/42/views",
            render("/posts/{post_id}/views", &context()).unwrap()
        );
        assert_eq!(
            "/users/loadtest",
            render("/users/{author}", &context()).unwrap()
        );
    }

    #[test]
    fn missing_key_is_reported() {
        assert_eq!(
            Err("comment_id".to_string()),
            render("/comments/{comment_id}", &context())
        );
    }

    #[test]
    fn non_placeholder_braces_are_kept() {
        assert_eq!(
            "/search?q={\"a\": 1}&x={}",
            render("/search?q={\"a\": 1}&x={}", &context()).unwrap()
        );
        assert_eq!("/open{", render("/open{", &context()).unwrap());
    }

    #[test]
    fn json_body_keeps_value_types() {
        let body = json!({
            "postId": "{post_id}",
            "comment": "comment from {author}",
            "tags": ["{author}", 1, null],
        });

        let rendered = render_json(&body, &context()).unwrap();

        assert_eq!(
            json!({
                "postId": 42,
                "comment": "comment from loadtest",
                "tags": ["loadtest", 1, null],
            }),
            rendered
        );
    }

    #[test]
    fn json_body_missing_key_is_reported() {
        let body = json!({ "nested": { "id": "{missing}" } });

        assert_eq!(Err("missing".to_string()), render_json(&body, &context()));
    }
}
