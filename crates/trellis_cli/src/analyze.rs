//! Liquid source analysis for dependency edges.

/// Extracts the snippet names referenced by `{% render %}` and
/// `{% include %}` tags in a liquid source.
///
/// Handles whitespace-control markers (`{%-`) and both quote styles. Returns
/// sorted, deduplicated names; dynamic references (unquoted expressions) are
/// ignored.
pub fn render_targets(content: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find("{%") {
        rest = &rest[open + 2..];
        let Some(close) = rest.find("%}") else {
            break;
        };
        let tag = rest[..close].trim_start_matches('-').trim();
        for keyword in ["render", "include"] {
            if let Some(argument) = tag.strip_prefix(keyword) {
                if let Some(name) = quoted_name(argument.trim_start()) {
                    targets.push(name.to_string());
                }
            }
        }
        rest = &rest[close + 2..];
    }

    targets.sort();
    targets.dedup();
    targets
}

/// Returns the leading quoted string of a tag argument, if present.
fn quoted_name(argument: &str) -> Option<&str> {
    let quote = argument.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let body = &argument[1..];
    let end = body.find(quote)?;
    let name = &body[..end];
    (!name.is_empty()).then_some(name)
}
