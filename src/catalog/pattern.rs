//! SQL `LIKE` style name patterns.

/// Default escape character for patterns.
pub const DEFAULT_ESCAPE: char = '\\';

/// One element of a parsed LIKE pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternToken {
    /// `%`: any run of characters.
    Any,
    /// `_`: exactly one character.
    One,
    Char(char),
}

/// Splits `pattern` into tokens. An escaped character is literal; a
/// trailing escape character stands for itself.
fn tokenize(pattern: impl Iterator<Item = char>, escape: Option<char>) -> Vec<PatternToken> {
    let mut pattern = pattern.peekable();
    let mut tokens = Vec::new();
    while let Some(c) = pattern.next() {
        let token = if Some(c) == escape && pattern.peek().is_some() {
            pattern.next().map_or(PatternToken::Char(c), PatternToken::Char)
        } else {
            match c {
                '%' => PatternToken::Any,
                '_' => PatternToken::One,
                c => PatternToken::Char(c),
            }
        };
        // runs of % behave like one
        if token == PatternToken::Any && tokens.last() == Some(&PatternToken::Any) {
            continue;
        }
        tokens.push(token);
    }
    tokens
}

/// LIKE pattern matching with support for `%` and `_` wildcards.
///
/// With `case_insensitive`, both sides are lowercased using Unicode rules
/// before matching. Runs in `O(len(s) * len(pattern))`: on a mismatch only
/// the most recent `%` is retried.
pub fn like_match(s: &str, pattern: &str, escape: Option<char>, case_insensitive: bool) -> bool {
    let (s, tokens): (Vec<char>, _) = if case_insensitive {
        (
            s.to_lowercase().chars().collect(),
            tokenize(pattern.to_lowercase().chars(), escape),
        )
    } else {
        (s.chars().collect(), tokenize(pattern.chars(), escape))
    };

    let (mut si, mut pi) = (0, 0);
    // token index after the last `%` and the subject index it currently covers up to
    let mut retry: Option<(usize, usize)> = None;
    while si < s.len() {
        match tokens.get(pi) {
            Some(PatternToken::Any) => {
                retry = Some((pi + 1, si));
                pi += 1;
                continue;
            }
            Some(PatternToken::One) => {
                si += 1;
                pi += 1;
                continue;
            }
            Some(PatternToken::Char(c)) if *c == s[si] => {
                si += 1;
                pi += 1;
                continue;
            }
            _ => {}
        }
        match retry {
            Some((after, covered)) => {
                retry = Some((after, covered + 1));
                pi = after;
                si = covered + 1;
            }
            None => return false,
        }
    }
    tokens[pi..].iter().all(|t| *t == PatternToken::Any)
}

/// A compiled name filter used by catalog listings.
#[derive(Debug, Clone)]
pub struct NamePattern {
    pattern: Option<String>,
    escape: Option<char>,
}

impl NamePattern {
    /// Creates a filter; `None` matches every name.
    pub fn new(pattern: Option<&str>, escape: Option<char>) -> Self {
        Self {
            pattern: pattern.map(str::to_string),
            escape,
        }
    }

    /// Matches every name.
    pub fn any() -> Self {
        Self::new(None, Some(DEFAULT_ESCAPE))
    }

    /// Returns true if `name` matches, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        match &self.pattern {
            Some(pattern) => like_match(name, pattern, self.escape, true),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_wildcards() {
        assert!(like_match("client", "cl%", None, false));
        assert!(like_match("client", "%ent", None, false));
        assert!(like_match("client", "c_ient", None, false));
        assert!(!like_match("client", "c_ent", None, false));
        assert!(like_match("", "%", None, false));
        assert!(like_match("abc", "a%%%c", None, false));
    }

    #[test]
    fn test_like_escape() {
        assert!(like_match("100%", "100\\%", Some('\\'), false));
        assert!(!like_match("1000", "100\\%", Some('\\'), false));
        assert!(like_match("a_b", "a#_b", Some('#'), false));
        assert!(!like_match("axb", "a#_b", Some('#'), false));
    }

    #[test]
    fn test_like_retries_only_last_percent() {
        let subject = format!("{}b", "a".repeat(100));
        let pattern = "%a".repeat(10);
        assert!(!like_match(&subject, &format!("{pattern}%c"), None, false));
        assert!(like_match(&subject, &format!("{pattern}%b"), None, false));
        assert!(like_match(&subject, &format!("{pattern}_"), None, false));

        let long = "x".repeat(10_000);
        assert!(!like_match(&long, &"%x".repeat(200).replace("%x%x", "%x%y"), None, false));
        assert!(like_match("mississippi", "%s%ss%p_", None, false));
        assert!(!like_match("mississippi", "%s%ss%pp", None, false));
    }

    #[test]
    fn test_like_trailing_escape_is_literal() {
        assert!(like_match("a\\", "a\\", Some('\\'), false));
        assert!(like_match("%", "\\%", Some('\\'), false));
        assert!(!like_match("x", "\\%", Some('\\'), false));
    }

    #[test]
    fn test_like_case_insensitive() {
        assert!(like_match("CLIENT", "client", None, true));
        assert!(!like_match("CLIENT", "client", None, false));
        assert!(like_match("Ärger", "ä%", None, true));
    }

    #[test]
    fn test_name_pattern() {
        let pattern = NamePattern::new(Some("cust%"), Some(DEFAULT_ESCAPE));
        assert!(pattern.matches("CUSTOMER"));
        assert!(!pattern.matches("orders"));
        assert!(NamePattern::any().matches("anything"));
    }
}
