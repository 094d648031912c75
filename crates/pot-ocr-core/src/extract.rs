use crate::types::TextLine;

/// Joins the non-empty line texts with newlines and trims the result.
pub fn extract_text(lines: &[TextLine]) -> String {
    let mut text = String::new();
    for line in lines {
        if let Some(t) = line.text.as_deref().filter(|t| !t.is_empty()) {
            text.push_str(t);
            text.push('\n');
        }
    }
    text.trim().to_string()
}
