// leettools-mcp-cli/src/rendering.rs
use serde_json::Value;

pub const CONTENT_SEPARATOR: &str = "--- Content ---";

/// Text to print on stdout for one payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    /// Payload was an error envelope (`"error": true`).
    pub is_error: bool,
}

/// Fails only when `raw` is not JSON.
pub fn render_payload(raw: &str, pretty: bool) -> Result<Rendered, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let is_error = value.get("error").and_then(Value::as_bool).unwrap_or(false);

    if !pretty {
        return Ok(Rendered {
            text: raw.to_string(),
            is_error,
        });
    }

    let mut text = serde_json::to_string_pretty(&value)?;
    // Envelopes keep their content in `details`; only a success has text worth repeating.
    if let Some(content) = value.get("content").and_then(Value::as_str).filter(|c| !c.is_empty()) {
        if !is_error {
            text.push_str("\n\n");
            text.push_str(CONTENT_SEPARATOR);
            text.push('\n');
            text.push_str(content);
        }
    }
    Ok(Rendered { text, is_error })
}
