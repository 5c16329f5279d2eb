pub(super) fn push_line(module: &mut String, indent: usize, line: &str) {
    push_block(module, indent, line);
}

/// Appends `block` re-indented to `indent` levels, dropping a leading and a
/// trailing blank line and the block's common indentation.
pub(super) fn push_block(module: &mut String, indent: usize, block: &str) {
    if block.is_empty() {
        return;
    }
    let pad = "  ".repeat(indent);
    let mut lines: Vec<&str> = block.split('\n').collect();
    if matches!(lines.first(), Some(line) if line.trim().is_empty()) {
        lines.remove(0);
    }
    if matches!(lines.last(), Some(line) if line.trim().is_empty()) {
        lines.pop();
    }

    let min_indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| *c == ' ' || *c == '\t').count())
        .min()
        .unwrap_or(0);

    for line in lines {
        let trimmed = if line.len() >= min_indent {
            &line[min_indent..]
        } else {
            line.trim_start()
        };
        if trimmed.trim().is_empty() {
            module.push('\n');
            continue;
        }
        module.push_str(&pad);
        module.push_str(trimmed);
        module.push('\n');
    }
}

pub(crate) fn sanitize_symbol(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (idx, ch) in value.chars().enumerate() {
        let is_valid = ch.is_ascii_alphanumeric() || ch == '_';
        if idx == 0 && ch.is_ascii_digit() {
            out.push('_');
        }
        out.push(if is_valid { ch } else { '_' });
    }
    if out.is_empty() {
        out.push_str("composite");
    }
    out
}
