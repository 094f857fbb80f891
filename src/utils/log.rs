// src/utils/log.rs

//! Run-report formatting on top of the `log` facade.
//!
//! Headers, numbered steps and summaries all go out at `info` so the CLI's
//! env_logger filter controls them like any other message.

/// Width of header and separator rules.
const RULE_WIDTH: usize = 60;

/// Log a numbered step in a multi-step run.
pub fn step(step_num: usize, total: usize, message: &str) {
    ::log::info!("[STEP {}/{}] {}", step_num, total, message);
}

/// Log a horizontal rule.
pub fn separator() {
    ::log::info!("{}", "─".repeat(RULE_WIDTH));
}

/// Log a boxed header.
pub fn header(title: &str) {
    let border = "═".repeat(RULE_WIDTH);
    ::log::info!("{}", border);
    ::log::info!("  {}", title);
    ::log::info!("{}", border);
}

/// Log an indented detail line.
pub fn sub_item(message: &str) {
    ::log::info!("    {}", message);
}

/// Log a titled list of key/value lines.
pub fn summary(title: &str, items: &[(&str, String)]) {
    ::log::info!("[SUMMARY] {}", title);
    for line in summary_lines(items) {
        ::log::info!("{}", line);
    }
}

/// Key/value lines with keys padded to a common width.
fn summary_lines(items: &[(&str, String)]) -> Vec<String> {
    let width = items.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    items
        .iter()
        .map(|(key, value)| format!("    {:<width$}  {}", format!("{}:", key), value, width = width + 1))
        .collect()
}
