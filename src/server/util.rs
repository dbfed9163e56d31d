use rand::distributions::Alphanumeric;
use rand::Rng;

pub(super) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 32 random alphanumerics for the page's Content-Security-Policy.
pub(super) fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Serialize `value` for embedding in an inline `<script>`. `</` becomes
/// `<\/` so the HTML parser cannot see a closing tag.
pub(super) fn script_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}
