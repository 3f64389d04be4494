//! POSIX-sh-safe quoting for strings that end up inside a Ninja rule's
//! `command` / `exec` / `env` values, which Ninja hands to `/bin/sh -c`
//! verbatim.

/// Quotes `s` into a single shell token that `sh -c` will read back as
/// exactly `s`.
///
/// An empty string becomes `''`. A string with no shell metacharacters is
/// returned unchanged. Otherwise the whole string is wrapped in single
/// quotes, with embedded single quotes escaped via the standard
/// `'\''` idiom: close the quote, emit an escaped quote, reopen the quote.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    if !s.bytes().any(needs_quoting) {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

fn needs_quoting(b: u8) -> bool {
    !matches!(b,
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9'
        | b'_' | b'-' | b'.' | b'/' | b':' | b'=' | b'%' | b'+' | b','
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string() {
        assert_eq!(shell_escape(""), "''");
    }

    #[test]
    fn plain_token_unquoted() {
        assert_eq!(shell_escape("hello-world_1.2/3:4=5"), "hello-world_1.2/3:4=5");
    }

    #[test]
    fn token_with_space_is_quoted() {
        assert_eq!(shell_escape("hello world"), "'hello world'");
    }

    #[test]
    fn embedded_single_quote() {
        assert_eq!(shell_escape("it's"), "'it'\\''s'");
    }

    #[test]
    fn dollar_and_backtick_are_quoted_literally() {
        assert_eq!(shell_escape("$HOME`pwd`"), "'$HOME`pwd`'");
    }

    #[cfg(unix)]
    #[test]
    fn round_trips_through_real_shell() {
        use std::process::Command;

        let cases = [
            "",
            "plain",
            "has space",
            "it's a test",
            "$(rm -rf /)",
            "new\nline",
            "tab\ttab",
            "'''",
            "back\\slash",
        ];

        for case in cases {
            let escaped = shell_escape(case);
            let script = format!("printf %s {escaped}");
            let output = Command::new("/bin/sh")
                .arg("-c")
                .arg(&script)
                .output()
                .expect("failed to run /bin/sh");
            assert!(output.status.success(), "script failed: {script}");
            assert_eq!(
                String::from_utf8(output.stdout).unwrap(),
                case,
                "round-trip mismatch for {case:?}"
            );
        }
    }
}
