const EMPTY_PLACEHOLDER: &str = "(no message provided)";

fn normalize_line_endings(message: &str) -> String {
    message.replace("\r\n", "\n").replace('\r', "\n")
}

// Hard-wraps one logical line: slice exactly `width` characters while at
// least `width` remain, then emit the remainder. An empty remainder after an
// exact multiple is emitted as its own line.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut rest = line;

    while width > 0 && rest.chars().count() >= width {
        let split = rest
            .char_indices()
            .nth(width)
            .map_or(rest.len(), |(index, _)| index);
        segments.push(rest[..split].to_string());
        rest = &rest[split..];
    }
    segments.push(rest.to_string());

    segments
}

fn wrap_message(message: &str, width: usize) -> Vec<String> {
    let normalized = normalize_line_endings(message);

    if normalized.is_empty() {
        return vec![EMPTY_PLACEHOLDER.to_string()];
    }

    normalized
        .split('\n')
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

/// Renders a message into the fixed-width line sequence sent to the printer:
/// a `From:`/`Received:` header, a blank line, the wrapped body, a blank
/// line, and a dashed separator. Pure; the same input always yields the same
/// lines.
#[must_use]
pub fn format_receipt(
    email: &str,
    message: &str,
    received_at: &str,
    line_width: usize,
) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("From: {email}"));
    lines.push(format!("Received: {received_at}"));
    lines.push(String::new());
    lines.extend(wrap_message(message, line_width));
    lines.push(String::new());
    lines.push("-".repeat(line_width));

    lines
}
