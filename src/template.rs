//! Liquid templates for notification text.
//!
//! Templates are rendered against the message, the monitor record and the
//! latest heartbeat, plus a few derived values:
//!
//! ```text
//! {{ STATUS }} {{ NAME }} ({{ HOSTNAME_OR_URL }})
//! {{ msg }}
//! {% if heartbeatJSON %}Latency: {{ heartbeatJSON.ping | default: "n/a" }} ms{% endif %}
//! ```

use serde_json::{Map, Value};

use crate::error::{NotifyError, Result};

/// Heartbeat status value meaning the monitor is down.
const HEARTBEAT_DOWN: i64 = 0;

/// Globals available to a template.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    vars: Map<String, Value>,
}

impl TemplateContext {
    pub fn new(msg: &Value, monitor: Option<&Value>, heartbeat: Option<&Value>) -> Self {
        let name = match monitor {
            Some(m) => m.get("name").cloned().unwrap_or(Value::Null),
            None => Value::from("Monitor Name not available"),
        };
        let hostname_or_url = match monitor {
            Some(m) => Value::from(extract_address(m)),
            None => Value::from("testing.hostname"),
        };
        let status = match heartbeat {
            Some(hb) if hb.get("status").and_then(Value::as_i64) == Some(HEARTBEAT_DOWN) => {
                "🔴 Down"
            }
            Some(_) => "✅ Up",
            None => "⚠️ Test",
        };

        let mut vars = Map::new();
        vars.insert("msg".to_string(), msg.clone());
        vars.insert(
            "monitorJSON".to_string(),
            monitor.cloned().unwrap_or(Value::Null),
        );
        vars.insert(
            "heartbeatJSON".to_string(),
            heartbeat.cloned().unwrap_or(Value::Null),
        );
        vars.insert("name".to_string(), name.clone());
        vars.insert("NAME".to_string(), name);
        vars.insert("hostnameOrURL".to_string(), hostname_or_url.clone());
        vars.insert("HOSTNAME_OR_URL".to_string(), hostname_or_url);
        vars.insert("status".to_string(), Value::from(status));
        vars.insert("STATUS".to_string(), Value::from(status));
        Self { vars }
    }
}

/// Address shown to operators, chosen by monitor type.
fn extract_address(monitor: &Value) -> String {
    let field = |key: &str| match monitor.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    match monitor.get("type").and_then(Value::as_str).unwrap_or("") {
        "push" => "Heartbeat".to_string(),
        "ping" => field("hostname"),
        "port" | "dns" | "gamedig" | "steam" => {
            let port = field("port");
            if port.is_empty() || port == "0" {
                field("hostname")
            } else {
                format!("{}:{}", field("hostname"), port)
            }
        }
        _ => {
            let url = field("url");
            match url.as_str() {
                "" | "http://" | "https://" => String::new(),
                _ => url,
            }
        }
    }
}

/// Render a Liquid `template` against `ctx`.
///
/// Parse failures (bad syntax, unknown filters) and render failures (such as
/// unknown variables) are reported as [`NotifyError::Render`].
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let parser = liquid::ParserBuilder::with_stdlib()
        .build()
        .map_err(|e| NotifyError::Render(e.to_string()))?;
    let template = parser
        .parse(template)
        .map_err(|e| NotifyError::Render(e.to_string()))?;
    let globals =
        liquid::model::to_object(&ctx.vars).map_err(|e| NotifyError::Render(e.to_string()))?;

    template
        .render(&globals)
        .map_err(|e| NotifyError::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn monitor() -> Value {
        json!({
            "name": "Homepage",
            "type": "http",
            "url": "https://example.com",
            "tags": [{"name": "prod"}],
        })
    }

    fn heartbeat(status: i64) -> Value {
        json!({"status": status, "msg": "timeout", "ping": 120})
    }

    fn address(monitor: Value) -> String {
        let ctx = TemplateContext::new(&json!("x"), Some(&monitor), None);
        render("{{ hostnameOrURL }}", &ctx).unwrap()
    }

    #[test]
    fn test_renders_message() {
        let ctx = TemplateContext::new(&json!("Service is down"), None, None);
        assert_eq!(render("Alert: {{msg}}", &ctx).unwrap(), "Alert: Service is down");
    }

    #[test]
    fn test_renders_nested_fields() {
        let m = monitor();
        let hb = heartbeat(0);
        let ctx = TemplateContext::new(&json!("x"), Some(&m), Some(&hb));
        let out = render(
            "{{ monitorJSON.name }} / {{ monitorJSON.tags[0].name }} / {{ heartbeatJSON[\"ping\"] }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "Homepage / prod / 120");
    }

    #[test]
    fn test_structured_message_fields() {
        let ctx = TemplateContext::new(&json!({"x": 1}), None, None);
        assert_eq!(render("{{ msg.x }}", &ctx).unwrap(), "1");
    }

    #[test]
    fn test_if_tag_on_missing_heartbeat() {
        let template = "{% if heartbeatJSON %}{{ STATUS }}{% endif %} {{ msg }}";

        let ctx = TemplateContext::new(&json!("down"), None, None);
        assert_eq!(render(template, &ctx).unwrap(), " down");

        let hb = heartbeat(0);
        let ctx = TemplateContext::new(&json!("down"), None, Some(&hb));
        assert_eq!(render(template, &ctx).unwrap(), "🔴 Down down");
    }

    #[test]
    fn test_standard_filters() {
        let hb = json!({"status": 1, "msg": ""});
        let ctx = TemplateContext::new(&json!("disk full"), None, Some(&hb));
        let out = render(
            "{{ msg | upcase }}|{{ heartbeatJSON.msg | default: \"none\" }}|{{ heartbeatJSON.status | default: 'n/a' }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "DISK FULL|none|1");
    }

    #[test]
    fn test_derived_variables_without_contexts() {
        let ctx = TemplateContext::new(&json!("x"), None, None);
        let out = render("{{ STATUS }} {{ NAME }} {{ HOSTNAME_OR_URL }}", &ctx).unwrap();
        assert_eq!(out, "⚠️ Test Monitor Name not available testing.hostname");
    }

    #[test]
    fn test_derived_variables_with_contexts() {
        let m = monitor();
        let down = heartbeat(0);
        let up = heartbeat(1);

        let ctx = TemplateContext::new(&json!("x"), Some(&m), Some(&down));
        assert_eq!(
            render("{{status}} {{name}} {{hostnameOrURL}}", &ctx).unwrap(),
            "🔴 Down Homepage https://example.com"
        );

        let ctx = TemplateContext::new(&json!("x"), Some(&m), Some(&up));
        assert_eq!(render("{{status}}", &ctx).unwrap(), "✅ Up");
    }

    #[test]
    fn test_address_by_monitor_type() {
        assert_eq!(address(json!({"type": "push", "url": "https://"})), "Heartbeat");
        assert_eq!(
            address(json!({"type": "ping", "hostname": "10.0.0.1", "port": 53})),
            "10.0.0.1"
        );
        assert_eq!(
            address(json!({"type": "port", "url": "https://", "hostname": "10.0.0.5", "port": 5432})),
            "10.0.0.5:5432"
        );
        assert_eq!(
            address(json!({"type": "dns", "hostname": "example.com", "port": null})),
            "example.com"
        );
        assert_eq!(
            address(json!({"type": "keyword", "url": "https://example.com/login"})),
            "https://example.com/login"
        );
    }

    #[test]
    fn test_placeholder_urls_are_blank() {
        assert_eq!(address(json!({"type": "http", "url": "http://", "hostname": "h"})), "");
        assert_eq!(address(json!({"type": "http", "url": "https://"})), "");
        assert_eq!(address(json!({"type": "http", "url": ""})), "");
    }

    #[test]
    fn test_unknown_filter_is_render_error() {
        let ctx = TemplateContext::new(&json!("x"), None, None);
        let err = render("{{ msg | shout }}", &ctx).unwrap_err();
        assert!(matches!(err, NotifyError::Render(_)));
    }
}
