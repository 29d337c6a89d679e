//! Lexical security scanner.
//!
//! Plain substring matching over file text. Patterns inside comments or string
//! literals are still reported, and calls reached through aliasing are not.

use tracing::debug;

/// Evaluates an expression string.
pub const EVAL_PATTERN: &str = "eval(";
/// Executes a statement string.
pub const EXEC_PATTERN: &str = "exec(";

const DYNAMIC_IMPORT_PATTERN: &str = "__import__";
const OS_PATTERN: &str = "os";

/// A suspicious pattern found in one file, rendered as `<file>: <pattern> found`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityIssue(pub String);

impl std::fmt::Display for SecurityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scan one file's text and return its issues in a fixed order (eval, then exec).
pub fn scan_text(file_name: &str, text: &str) -> Vec<SecurityIssue> {
    let mut issues = Vec::new();
    if text.contains(EVAL_PATTERN) {
        issues.push(SecurityIssue(format!("{file_name}: eval() found")));
    }
    if text.contains(EXEC_PATTERN) {
        issues.push(SecurityIssue(format!("{file_name}: exec() found")));
    }
    if text.contains(DYNAMIC_IMPORT_PATTERN) && text.contains(OS_PATTERN) {
        // Reflective import of os is a common idiom; recognized but never flagged.
        debug!(file = file_name, "dynamic import with os access, not flagged");
    }
    issues
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of replacing them.
pub fn decode_lossy_dropping(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_eval_and_exec_in_order() {
        let issues = scan_text("app.py", "exec(code)\nx = eval('1+1')\n");
        assert_eq!(
            issues,
            vec![
                SecurityIssue("app.py: eval() found".to_string()),
                SecurityIssue("app.py: exec() found".to_string()),
            ]
        );
    }

    #[test]
    fn dynamic_import_with_os_is_not_flagged() {
        let issues = scan_text("loader.py", "mod = __import__('os')\nos.getcwd()\n");
        assert!(issues.is_empty());
    }

    #[test]
    fn matches_inside_comments() {
        let issues = scan_text("notes.py", "# never call eval( here\n");
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn aliased_call_is_not_detected() {
        let issues = scan_text("sneaky.py", "f = eval\nf ('1')\n");
        assert!(issues.is_empty());
    }

    #[test]
    fn decoding_drops_invalid_bytes() {
        let text = decode_lossy_dropping(b"ev\xffal(x)");
        assert_eq!(text, "eval(x)");
        assert_eq!(scan_text("bin.py", &text).len(), 1);
    }
}
