//! Classification of reference strings and `${...}` template rendering.

/// A piece of a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePart<'a> {
    Text(&'a str),
    Expr(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference<'a> {
    /// Literal text mixed with one or more `${...}` segments.
    Template(Vec<TemplatePart<'a>>),
    /// A plain path or a single `${...}` covering the whole string.
    Single(&'a str),
}

/// Splits `reference` into text and `${...}` segments. A segment runs from
/// `${` to the next `}` and must not be empty.
pub fn split_template(reference: &str) -> Vec<TemplatePart<'_>> {
    let mut parts = Vec::new();
    let mut text_start = 0;
    let mut search_from = 0;
    while let Some(offset) = reference[search_from..].find("${") {
        let open = search_from + offset;
        let body_start = open + 2;
        let Some(close_offset) = reference[body_start..].find('}') else {
            break;
        };
        if close_offset == 0 {
            search_from = open + 1;
            continue;
        }
        let close = body_start + close_offset;
        if open > text_start {
            parts.push(TemplatePart::Text(&reference[text_start..open]));
        }
        parts.push(TemplatePart::Expr(&reference[body_start..close]));
        text_start = close + 1;
        search_from = close + 1;
    }
    if text_start < reference.len() {
        parts.push(TemplatePart::Text(&reference[text_start..]));
    }
    parts
}

pub fn classify(reference: &str) -> Reference<'_> {
    let parts = split_template(reference);
    let segments = parts
        .iter()
        .filter(|p| matches!(p, TemplatePart::Expr(_)))
        .count();
    match segments {
        0 => Reference::Single(reference),
        1 if is_whole_segment(reference) => Reference::Single(reference),
        _ => Reference::Template(parts),
    }
}

fn is_whole_segment(reference: &str) -> bool {
    let trimmed = reference.trim();
    trimmed.starts_with("${")
        && trimmed.ends_with('}')
        && trimmed[2..trimmed.len() - 1].find('}').is_none()
}

/// Renders template `parts`, turning each segment into text with `eval`.
pub fn render<'a, F>(parts: &[TemplatePart<'a>], mut eval: F) -> String
where
    F: FnMut(&'a str) -> String,
{
    let mut out = String::new();
    for part in parts.iter().copied() {
        match part {
            TemplatePart::Text(text) => out.push_str(text),
            TemplatePart::Expr(expr) => out.push_str(&eval(expr.trim())),
        }
    }
    out
}
