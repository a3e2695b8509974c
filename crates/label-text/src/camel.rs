//! Camel-case identifier splitting

/// Check if a word boundary falls before `current`
///
/// A boundary exists when an uppercase letter follows a lowercase letter or a
/// digit (`clientName`), or when an uppercase run ends and a lowercase word
/// begins (`HTTPServer` -> `HTTP` + `Server`).
pub fn is_word_boundary(prev: char, current: char, next: Option<char>) -> bool {
    if !current.is_uppercase() {
        return false;
    }

    if prev.is_lowercase() || prev.is_ascii_digit() {
        return true;
    }

    prev.is_uppercase() && next.is_some_and(char::is_lowercase)
}

/// Split a camel-case identifier into space-separated words
///
/// Letter case is preserved; only spaces are inserted. Underscores and
/// hyphens are treated as separators and collapse into a single space.
///
/// # Examples
/// ```
/// use label_text::break_camel;
/// assert_eq!(break_camel("firstName"), "first Name");
/// assert_eq!(break_camel("invoiceID"), "invoice ID");
/// assert_eq!(break_camel("HTTPServer"), "HTTP Server");
/// ```
pub fn break_camel(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut result = String::with_capacity(identifier.len() + 4);
    let mut pending_space = false;

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            pending_space = !result.is_empty();
            continue;
        }

        if i > 0 && !pending_space && is_word_boundary(chars[i - 1], c, chars.get(i + 1).copied())
        {
            pending_space = true;
        }

        if pending_space {
            result.push(' ');
            pending_space = false;
        }
        result.push(c);
    }

    result
}
