/// Stand-in text handed to the model when no source produced usable text.
pub const PLACEHOLDER_TEXT: &str = "No text content available.";

const SINGLE_SHOT_INSTRUCTIONS: &str = r#"You extract restaurant menus from scraped web text.
Respond with a single JSON object of the form
{"items": [{"name": string, "description": string|null, "price": string|null, "category": string|null, "tags": [string]}]}.
Only include dishes and drinks that actually appear in the text. Keep prices exactly as written.
If the text contains no menu, respond with {"items": []}."#;

const STREAM_INSTRUCTIONS: &str = r#"You extract restaurant menus from scraped web text.
Write one JSON object per line and nothing else: no prose, no code fences, no arrays.
Each line is one of:
{"kind": "description", "text": string}   a one or two sentence description of the restaurant
{"kind": "cuisine", "text": string}       the cuisine, e.g. "Italian"
{"kind": "tags", "tags": [string]}        up to five short descriptive tags
{"kind": "category", "name": string}      a menu section
{"kind": "item", "name": string, "description": string|null, "price": string|null, "category": string|null}
Emit description, cuisine and tags first, then each category followed by its items.
Only include dishes and drinks that actually appear in the text. Keep prices exactly as written.
If the text contains no menu, emit only the description, cuisine and tags lines."#;

pub(crate) fn system_prompt(streaming: bool) -> &'static str {
    if streaming {
        STREAM_INSTRUCTIONS
    } else {
        SINGLE_SHOT_INSTRUCTIONS
    }
}

pub(crate) fn user_prompt(text: &str, restaurant_name: &str, has_website_content: bool) -> String {
    let source = if has_website_content {
        "the restaurant's website and its map listing"
    } else {
        "the restaurant's map listing only"
    };
    format!("Restaurant: {restaurant_name}\nThe text below was scraped from {source}.\n\n{text}")
}

/// Whether `text` carries nothing worth sending to the model.
pub(crate) fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text == PLACEHOLDER_TEXT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_names_sources() {
        let prompt = user_prompt("Burger $9", "Acme Diner", true);
        assert!(prompt.starts_with("Restaurant: Acme Diner\n"));
        assert!(prompt.contains("website and its map listing"));
        assert!(prompt.ends_with("Burger $9"));

        assert!(user_prompt("x", "Acme", false).contains("map listing only"));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder(PLACEHOLDER_TEXT));
        assert!(is_placeholder("   "));
        assert!(!is_placeholder("Burger $9"));
    }
}
