use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a platform error with its category advice
pub fn error_with_advice(msg: &str, category: oktakit::ErrorCategory) {
    error(msg);
    dim(&format!("{}: {}", category.description(), category.advice()));
}

// ============================================================================
// Attribute Formatting
// ============================================================================

/// Flatten a record into `(attribute, display value)` pairs, sorted by name
///
/// Unset attributes are left out.
pub fn attribute_lines<T: Serialize>(record: &T) -> Vec<(String, String)> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => {
            let mut lines: Vec<(String, String)> = map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, format_value(&v)))
                .collect();
            lines.sort();
            lines
        }
        _ => Vec::new(),
    }
}

/// Format a JSON value for display: strings unquoted, arrays as lists
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}

/// Truncate a string for display, keeping the end
pub fn truncate_start(s: &str, max_len: usize) -> String {
    let len = s.chars().count();
    if len <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let tail: String = s.chars().skip(len - (max_len - 3)).collect();
        format!("...{}", tail)
    }
}

// ============================================================================
// Tests
// ============================================================================
