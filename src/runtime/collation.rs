use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// How string comparisons treat letter case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSense {
    Sensitive,
    /// ASCII letters only.
    #[default]
    Insensitive,
    /// Full Unicode lowercase folding.
    Locale,
    /// Like `Locale`, but runs of digits compare by numeric value.
    Logical,
}

impl CaseSense {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "on" | "1" | "true" | "sensitive" => Some(CaseSense::Sensitive),
            "off" | "0" | "false" | "insensitive" => Some(CaseSense::Insensitive),
            "locale" => Some(CaseSense::Locale),
            "logical" => Some(CaseSense::Logical),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CaseSense::Sensitive => "On",
            CaseSense::Insensitive => "Off",
            CaseSense::Locale => "Locale",
            CaseSense::Logical => "Logical",
        }
    }

    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            CaseSense::Sensitive => a.cmp(b),
            CaseSense::Insensitive => compare_ascii_insensitive(a, b),
            CaseSense::Locale => compare_folded(a.chars(), b.chars()),
            CaseSense::Logical => compare_logical(a, b),
        }
    }

    pub fn eq(self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    /// Byte offset of the first match of `needle` in `haystack`.
    pub fn find(self, haystack: &str, needle: &str) -> Option<usize> {
        match self {
            CaseSense::Sensitive => haystack.find(needle),
            _ => haystack
                .char_indices()
                .map(|(i, _)| i)
                .find(|&i| self.starts_with(&haystack[i..], needle)),
        }
    }

    pub fn starts_with(self, text: &str, prefix: &str) -> bool {
        let mut text_chars = text.chars();
        for p in prefix.chars() {
            match text_chars.next() {
                Some(t) if fold_char(self, t) == fold_char(self, p) => {}
                _ => return false,
            }
        }
        true
    }
}

fn fold_char(mode: CaseSense, c: char) -> char {
    match mode {
        CaseSense::Sensitive => c,
        CaseSense::Insensitive => c.to_ascii_lowercase(),
        CaseSense::Locale | CaseSense::Logical => c.to_lowercase().next().unwrap_or(c),
    }
}

pub fn compare_ascii_insensitive(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

fn compare_folded(a: impl Iterator<Item = char>, b: impl Iterator<Item = char>) -> Ordering {
    a.flat_map(char::to_lowercase)
        .cmp(b.flat_map(char::to_lowercase))
}

fn compare_logical(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut a);
                let right = take_digits(&mut b);
                let ordering = compare_digit_runs(&left, &right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = compare_folded(std::iter::once(x), std::iter::once(y));
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insensitive_ignores_ascii_case_only() {
        assert!(CaseSense::Insensitive.eq("Hello", "hELLO"));
        assert!(!CaseSense::Insensitive.eq("Ä", "ä"));
        assert!(CaseSense::Locale.eq("Ä", "ä"));
    }

    #[test]
    fn logical_orders_digit_runs_numerically() {
        assert_eq!(CaseSense::Logical.compare("file9", "file10"), Ordering::Less);
        assert_eq!(CaseSense::Locale.compare("file9", "file10"), Ordering::Greater);
        assert_eq!(CaseSense::Logical.compare("A2", "a2"), Ordering::Equal);
    }

    #[test]
    fn parse_accepts_on_off_names() {
        assert_eq!(CaseSense::parse("On"), Some(CaseSense::Sensitive));
        assert_eq!(CaseSense::parse("off"), Some(CaseSense::Insensitive));
        assert_eq!(CaseSense::parse("Locale"), Some(CaseSense::Locale));
        assert_eq!(CaseSense::parse("bogus"), None);
    }

    #[test]
    fn find_respects_mode() {
        assert_eq!(CaseSense::Sensitive.find("abcABC", "ABC"), Some(3));
        assert_eq!(CaseSense::Insensitive.find("abcABC", "ABC"), Some(0));
        assert_eq!(CaseSense::Insensitive.find("abc", "x"), None);
    }
}
