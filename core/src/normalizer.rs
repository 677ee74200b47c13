use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref URL: Regex = Regex::new(r"(?i:http)\S+\s*").expect("valid regex");
    static ref MARKER: Regex = Regex::new(r"RT|(?i:cc)").expect("valid regex");
    static ref HASHTAG: Regex = Regex::new(r"#\S+\s*").expect("valid regex");
    static ref MENTION: Regex = Regex::new(r"@\S+").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Switches for the optional steps of the cleaning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Replace every character at or above U+0080 with a space.
    pub strip_non_ascii: bool,
    /// Decompose (NFKD) and drop combining marks before anything else runs, so "café" keeps its "e".
    pub fold_diacritics: bool,
    /// Trim the leading/trailing space the collapse step can leave behind.
    pub trim: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { strip_non_ascii: true, fold_diacritics: false, trim: true }
    }
}

/// Clean free text with the default pipeline.
pub fn normalize(text: &str) -> String {
    normalize_with(text, &NormalizerConfig::default())
}

/// Clean free text: drop URLs, RT/cc markers, hashtags and mentions, blank out punctuation
/// (and non-ASCII when configured), collapse whitespace and lowercase.
///
/// Every removal substitutes a space rather than joining its neighbours, so `http` and `cc`
/// can never be assembled out of fragments. Together with the case-insensitive `http`/`cc`
/// patterns this makes the transform idempotent.
pub fn normalize_with(text: &str, config: &NormalizerConfig) -> String {
    let folded;
    let mut s: &str = text;
    if config.fold_diacritics {
        folded = fold_diacritics(text);
        s = &folded;
    }

    let s = URL.replace_all(s, " ");
    let s = MARKER.replace_all(&s, " ");
    let s = HASHTAG.replace_all(&s, " ");
    let s = MENTION.replace_all(&s, " ");
    let s: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_punctuation() || (config.strip_non_ascii && !c.is_ascii()) {
                ' '
            } else {
                c
            }
        })
        .collect();
    let s = WHITESPACE.replace_all(&s, " ");
    let mut out = if config.strip_non_ascii { s.to_ascii_lowercase() } else { s.to_lowercase() };
    if config.trim {
        let trimmed = out.trim();
        if trimmed.len() != out.len() {
            out = trimmed.to_string();
        }
    }
    out
}

fn fold_diacritics(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_urls_markers_and_tags() {
        let out = normalize("RT Check https://example.com/jobs now #hiring @recruiter thanks");
        assert_eq!(out, "check now thanks");
    }

    #[test]
    fn punctuation_becomes_space() {
        assert_eq!(normalize("C++/Java, SQL; (5 yrs)"), "c java sql 5 yrs");
    }

    #[test]
    fn marker_is_a_substring_match() {
        // lowercase "cc" inside a word is removed as well
        assert_eq!(normalize("accounting"), "a ounting");
        assert_eq!(normalize("ART smart"), "a smart");
    }

    #[test]
    fn non_ascii_is_blanked_by_default() {
        assert_eq!(normalize("café résumé"), "caf r sum");
    }

    #[test]
    fn keep_non_ascii_when_disabled() {
        let cfg = NormalizerConfig { strip_non_ascii: false, ..Default::default() };
        assert_eq!(normalize_with("Café MÜNCHEN", &cfg), "café münchen");
    }

    #[test]
    fn folding_keeps_base_letters() {
        let cfg = NormalizerConfig { fold_diacritics: true, ..Default::default() };
        assert_eq!(normalize_with("Café Résumé", &cfg), "cafe resume");
    }

    #[test]
    fn untrimmed_keeps_single_edge_space() {
        let cfg = NormalizerConfig { trim: false, ..Default::default() };
        assert_eq!(normalize_with("  Hello,\n\tWorld!  ", &cfg), " hello world ");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
        assert_eq!(normalize("!!!"), "");
    }
}
