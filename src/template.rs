/// Placeholder token used by repository URL templates.
pub const PLACEHOLDER: &str = "%s";

/// Counts the placeholders in a template.
pub fn placeholder_count(template: &str) -> usize {
    template.matches(PLACEHOLDER).count()
}

/// Fills placeholders left to right with `values`.
///
/// Substitution is positional: the first `%s` receives `values[0]`, the
/// second `values[1]`, and so on. Values are inserted verbatim, so a value
/// that itself contains `%s` is never re-scanned. Placeholders beyond the
/// supplied values are left untouched; surplus values are ignored.
pub fn fill(template: &str, values: &[&str]) -> String {
    let capacity = template.len() + values.iter().map(|v| v.len()).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    let mut rest = template;

    for value in values {
        let Some((head, tail)) = rest.split_once(PLACEHOLDER) else {
            break;
        };
        out.push_str(head);
        out.push_str(value);
        rest = tail;
    }

    out.push_str(rest);
    out
}
