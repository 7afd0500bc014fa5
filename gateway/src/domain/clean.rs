//! Text clean-up for device output and configuration blocks.

use std::sync::LazyLock;

use regex::Regex;

/// ANSI escape sequences: single-character escapes and CSI sequences.
pub static ANSI_ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern and cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("valid regex")
});

/// Strip ANSI escapes, then keep only printable ASCII (letters, digits,
/// punctuation, and the whitespace set ` \t\n\r\x0b\x0c`).
#[must_use]
pub fn strip_ansi(output: &str) -> String {
    ANSI_ESCAPE_RE
        .replace_all(output, "")
        .chars()
        .filter(|c| is_printable(*c))
        .collect()
}

fn is_printable(c: char) -> bool {
    c.is_ascii_graphic() || matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Remove the whitespace prefix shared by every non-blank line, then trim
/// the block. Blank lines do not constrain the common prefix.
#[must_use]
pub fn dedent(block: &str) -> String {
    let prefix = block
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(leading_whitespace)
        .reduce(common_prefix)
        .unwrap_or("");

    block
        .lines()
        .map(|line| line.strip_prefix(prefix).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn leading_whitespace(line: &str) -> &str {
    let end = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..end]
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}
