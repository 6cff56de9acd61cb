//! Bullet-line task extraction shared by every parse strategy

use std::sync::LazyLock;

use regex::Regex;

/// `-` or `*`, then either a closed checkbox (`[ ]`, `[]`, `[x]`, `[X]`) followed
/// by the task text, or at least one whitespace character before the task text.
///
/// The checkbox alternative is tried first so a bracket never leaks into the
/// task; a bracket that is not a checkbox (`- [link](url)`) stays task text.
static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*](?:\s*\[[xX\s]?\](.*)|\s+(.+))$").expect("bullet regex is valid")
});

/// Extract the task text of a single line, if it is a bullet line
pub fn bullet_task(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    BULLET_RE
        .captures(line)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|task| !task.is_empty())
}

/// Collect the task text of every bullet line in `block`, in source order
///
/// Non-bullet lines are ignored; duplicates are kept.
pub fn extract_tasks(block: &str) -> Vec<String> {
    block.lines().filter_map(bullet_task).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_formats_are_equivalent() {
        for line in ["- [ ] x", "- [] x", "- [x] x", "- [X] x", "- x", "* x", "* [ ] x"] {
            assert_eq!(bullet_task(line), Some("x".to_string()), "line: {:?}", line);
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(bullet_task("   -   [ ]   Làm rõ yêu cầu   "), Some("Làm rõ yêu cầu".to_string()));
        assert_eq!(bullet_task("\t* task\t"), Some("task".to_string()));
    }

    #[test]
    fn test_non_bullets_are_rejected() {
        assert_eq!(bullet_task(""), None);
        assert_eq!(bullet_task("   "), None);
        assert_eq!(bullet_task("plain prose"), None);
        assert_eq!(bullet_task("-no space"), None);
        assert_eq!(bullet_task("---"), None);
        assert_eq!(bullet_task("1. numbered"), None);
        assert_eq!(bullet_task("**bold heading**"), None);
    }

    #[test]
    fn test_checkbox_content_is_not_part_of_task() {
        assert_eq!(bullet_task("- [x] Done item"), Some("Done item".to_string()));
        assert_eq!(bullet_task("-[ ] tight checkbox"), Some("tight checkbox".to_string()));
        assert_eq!(bullet_task("- [ ]text"), Some("text".to_string()));
        assert_eq!(bullet_task("- [x]done"), Some("done".to_string()));
    }

    #[test]
    fn test_bare_checkbox_is_not_a_task() {
        assert_eq!(bullet_task("- [x]"), None);
        assert_eq!(bullet_task("- [ ]"), None);
        assert_eq!(bullet_task("* []   "), None);
    }

    #[test]
    fn test_non_checkbox_brackets_stay_in_task() {
        assert_eq!(bullet_task("- [link](https://example.com)"), Some("[link](https://example.com)".to_string()));
        assert_eq!(bullet_task("- [ ] [API] Xác định endpoint"), Some("[API] Xác định endpoint".to_string()));
    }

    #[test]
    fn test_extract_tasks_keeps_order_and_duplicates() {
        let block = "Heading\n- [ ] a\n\nsome prose\n* b\n- [ ] a\r\n";
        assert_eq!(extract_tasks(block), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_extract_tasks_empty_block() {
        assert!(extract_tasks("").is_empty());
        assert!(extract_tasks("no bullets here\nnor here").is_empty());
    }
}
