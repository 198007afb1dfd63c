//! Locating JSON inside free-form model output.

/// Returns the JSON object embedded in a model response.
///
/// Accepts fenced ```` ```json ```` blocks, bare fences containing an object,
/// or the span from the first `{` to the last `}`.
pub fn extract_json_block(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_fenced_json() {
        let text = "Sure:\n```json\n{\"value\": 42}\n```\nAnything else?";
        assert_eq!(extract_json_block(text), Some("{\"value\": 42}"));
    }

    #[test]
    fn finds_bare_fence_with_object() {
        assert_eq!(extract_json_block("```\n{\"value\": true}\n```"), Some("{\"value\": true}"));
    }

    #[test]
    fn finds_braces_in_prose() {
        assert_eq!(
            extract_json_block("The answer is {\"value\": \"mother\"} I think."),
            Some("{\"value\": \"mother\"}")
        );
    }

    #[test]
    fn returns_none_without_object() {
        assert_eq!(extract_json_block("no json here"), None);
        assert_eq!(extract_json_block("} backwards {"), None);
    }
}
