//! POSIX shell quoting.
//!
//! Inside single quotes a POSIX shell treats every byte literally except the
//! closing quote itself, so rewriting `'` as `'"'"'` is the only escaping
//! needed to embed an arbitrary string as one word.

/// Escape `value` for use between single quotes. Does not add the outer quotes.
pub fn escape_single_quotes(value: &str) -> String {
    value.replace('\'', r#"'"'"'"#)
}

/// Render `value` as a complete single-quoted shell word.
pub fn single_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    quoted.push_str(&escape_single_quotes(value));
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    /// Let /bin/sh parse `word` and print what it evaluated to.
    fn sh_eval(word: &str) -> String {
        let output = Command::new("/bin/sh")
            .arg("-c")
            .arg(format!("printf '%s' {}", word))
            .output()
            .expect("run /bin/sh");
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }

    #[test]
    fn test_escape_single_quotes() {
        assert_eq!(escape_single_quotes("plain"), "plain");
        assert_eq!(escape_single_quotes("it's"), r#"it'"'"'s"#);
        assert_eq!(escape_single_quotes("''"), r#"'"'"''"'"'"#);
    }

    #[test]
    fn test_single_quote_wraps() {
        assert_eq!(single_quote("/tmp"), "'/tmp'");
        assert_eq!(single_quote(""), "''");
    }

    #[test]
    fn test_round_trip_through_sh() {
        for value in [
            "/tmp/it's here",
            "'",
            "'''",
            "/a/'b'/c'",
            "semi;colon",
            "$(touch /tmp/pwned)",
            "`id`",
            "a|b&c<d>e",
            "$HOME and ${PATH}",
            "back\\slash",
            "new\nline",
            "  spaces  ",
            "*?[glob]",
        ] {
            assert_eq!(sh_eval(&single_quote(value)), value, "value: {:?}", value);
        }
    }
}
