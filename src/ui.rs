use colored::{ColoredString, Colorize};
use migration::{LineTag, ManifestDiff, Outcome};

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

// ============================================================================
// Migration output
// ============================================================================

/// Colored summary label for an outcome
pub fn outcome_label(outcome: &Outcome) -> ColoredString {
    let label = outcome.to_string();
    match outcome {
        Outcome::Applied => label.green().bold(),
        Outcome::Previewed => label.cyan(),
        Outcome::NoOp => label.dimmed(),
        Outcome::Skipped { .. } => label.yellow(),
        Outcome::Failed { .. } => label.red().bold(),
    }
}

/// Print changed lines of a manifest diff, indented
pub fn diff(diff: &ManifestDiff) {
    for line in &diff.lines {
        match line.tag {
            LineTag::Equal => {}
            LineTag::Delete => println!("    {}", format!("- {}", line.text).red()),
            LineTag::Insert => println!("    {}", format!("+ {}", line.text).green()),
        }
    }
}

/// Truncate a path string for display, keeping the end
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let len = path.chars().count();
    if len <= max_len {
        path.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let tail: String = path.chars().skip(len - (max_len - 3)).collect();
        format!("...{tail}")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_path_short() {
        assert_eq!(truncate_path("short.txt", 20), "short.txt");
        assert_eq!(truncate_path("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_path_long() {
        assert_eq!(
            truncate_path("packages/domains/utils/utils_dates", 15),
            ".../utils_dates"
        );
    }

    #[test]
    fn test_truncate_path_edge_cases() {
        assert_eq!(truncate_path("test", 3), "...");
        assert_eq!(truncate_path("test", 2), "...");
        assert_eq!(truncate_path("", 10), "");
    }

    #[test]
    fn test_outcome_label_text() {
        colored::control::set_override(false);
        assert_eq!(outcome_label(&Outcome::Applied).to_string(), "APPLIED");
        assert_eq!(
            outcome_label(&Outcome::failed("boom")).to_string(),
            "FAILED:boom"
        );
    }
}
