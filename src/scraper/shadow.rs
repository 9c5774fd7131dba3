//! Shadow-DOM-aware element queries for in-page scripts.
//!
//! Map pages render parts of their UI inside web components, where
//! `document.querySelectorAll` cannot see. The helpers below walk every open
//! shadow root below the starting node. Scripts are assembled with
//! [`with_deep_query`] so each evaluation carries its own copy of the helpers
//! and never depends on state left behind in the page.

/// `deepQueryAll(selector, root)` and `deepQuery(selector, root)`.
pub const DEEP_QUERY_HELPERS: &str = r#"
const deepQueryAll = (selector, root = document) => {
    const found = [];
    const seen = new Set();
    const visit = (node) => {
        if (!node || !node.querySelectorAll) return;
        for (const el of node.querySelectorAll(selector)) {
            if (!seen.has(el)) {
                seen.add(el);
                found.push(el);
            }
        }
        for (const el of node.querySelectorAll('*')) {
            if (el.shadowRoot) visit(el.shadowRoot);
        }
    };
    if (root.shadowRoot) visit(root.shadowRoot);
    visit(root);
    return found;
};
const deepQuery = (selector, root = document) => deepQueryAll(selector, root)[0] || null;
const deepText = (el) => (el ? (el.innerText || el.textContent || '') : '').trim();
"#;

/// Wrap `body` in an immediately invoked function with the deep-query
/// helpers in scope. `body` must `return` the value to hand back.
pub fn with_deep_query(body: &str) -> String {
    format!("(() => {{\n{DEEP_QUERY_HELPERS}\n{body}\n}})()")
}

/// Quote `value` as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_script_is_iife_with_helpers() {
        let script = with_deep_query("return deepQueryAll('[role=\"tab\"]').length;");
        assert!(script.starts_with("(() => {"));
        assert!(script.ends_with("})()"));
        assert!(script.contains("const deepQueryAll"));
        assert!(script.contains("shadowRoot"));
        assert!(script.contains("return deepQueryAll('[role=\"tab\"]').length;"));
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("Lunch"), "\"Lunch\"");
        assert_eq!(js_string("it's \"x\"\n"), "\"it's \\\"x\\\"\\n\"");
    }
}
