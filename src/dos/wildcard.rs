//! Wildcard Matching
//!
//! DOS-style `*` / `?` globbing against a single file name, ignoring case.
//! Classic single-pass backtracking match: remember the last `*` and where
//! in the name it was taken, and on a mismatch let that star swallow one
//! more character.

/// Scan position of the matcher
#[derive(Debug, Clone, Copy)]
struct Matcher {
    /// Index into the pattern
    pat: usize,
    /// Index into the name
    name: usize,
    /// Last `*` seen: (pattern index of the star, name index it resumes from)
    star: Option<(usize, usize)>,
}

/// Next move of the state machine
enum Step {
    Advance,
    TakeStar,
    Backtrack(usize, usize),
    Fail,
}

impl Matcher {
    const fn new() -> Self {
        Self {
            pat: 0,
            name: 0,
            star: None,
        }
    }

    fn step(&self, pattern: &[char], name: &[char]) -> Step {
        match pattern.get(self.pat) {
            Some(&'*') => Step::TakeStar,
            Some(&p) if p == '?' || same_char(p, name[self.name]) => Step::Advance,
            _ => match self.star {
                Some((star_pat, star_name)) => Step::Backtrack(star_pat, star_name),
                None => Step::Fail,
            },
        }
    }
}

fn same_char(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Match `name` against a DOS wildcard `pattern`, case-insensitively.
pub fn matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let mut m = Matcher::new();

    while m.name < name.len() {
        match m.step(&pattern, &name) {
            Step::Advance => {
                m.pat += 1;
                m.name += 1;
            }
            Step::TakeStar => {
                m.star = Some((m.pat, m.name));
                m.pat += 1;
            }
            Step::Backtrack(star_pat, star_name) => {
                m.pat = star_pat + 1;
                m.name = star_name + 1;
                m.star = Some((star_pat, star_name + 1));
            }
            Step::Fail => return false,
        }
    }

    // Name exhausted: only trailing stars may remain
    while pattern.get(m.pat) == Some(&'*') {
        m.pat += 1;
    }
    m.pat == pattern.len()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_anything() {
        assert!(matches("*", ""));
        assert!(matches("*", "a"));
        assert!(matches("*", "README.TXT"));
    }

    #[test]
    fn test_question_matches_one_char() {
        assert!(matches("?", "x"));
        assert!(!matches("?", ""));
        assert!(!matches("?", "xy"));
        assert!(matches("A?C", "abc"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches("A*", "abc"));
        assert!(matches("*.txt", "NOTES.TXT"));
        assert!(matches("Ä*", "äpfel"));
    }

    #[test]
    fn test_empty_pattern() {
        assert!(matches("", ""));
        assert!(!matches("", "a"));
    }

    #[test]
    fn test_extension_patterns() {
        assert!(matches("*.TXT", "A.TXT"));
        assert!(!matches("*.TXT", "C.DAT"));
        assert!(!matches("*.TXT", "A.TXT.BAK"));
        assert!(matches("*.*", "A.B"));
        assert!(!matches("*.*", "NODOT"));
    }

    #[test]
    fn test_backtracking() {
        assert!(matches("*AB", "AAAB"));
        assert!(matches("A*B*C", "AxxBxxBxC"));
        assert!(!matches("A*B*C", "AxxBxxBx"));
        assert!(matches("**?", "z"));
    }

    #[test]
    fn test_trailing_stars_consumed() {
        assert!(matches("FOO***", "foo"));
        assert!(!matches("FOO*?", "foo"));
    }
}
