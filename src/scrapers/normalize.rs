//! Text cleanup applied to every extracted article body.

use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that is not a word character, whitespace, Hangul, or `. , ! ?`.
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s가-힣.,!?]").expect("static regex"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Clean raw extracted text.
///
/// Strips characters outside the allowed set, collapses every whitespace run
/// (newlines included) to one space, and trims both ends. Stripping runs
/// first so that removed symbols cannot leave double spaces behind, which
/// keeps the function idempotent.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize("  속보 ★ 국회,\n\n  예산안 통과!  "), "속보 국회, 예산안 통과!");
/// ```
pub fn normalize(raw: &str) -> String {
    let stripped = DISALLOWED.replace_all(raw, "");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_newlines() {
        assert_eq!(normalize("첫 줄\n\n\n둘째   줄\t셋째"), "첫 줄 둘째 줄 셋째");
    }

    #[test]
    fn test_strips_symbols_but_keeps_punctuation() {
        assert_eq!(
            normalize("  속보 ★ 국회,\n\n  예산안 통과!  "),
            "속보 국회, 예산안 통과!"
        );
        assert_eq!(normalize("[사진] “대통령” 발언… (종합)"), "사진 대통령 발언 종합");
        assert_eq!(normalize("GDP 2.5% 성장?"), "GDP 2.5 성장?");
    }

    #[test]
    fn test_keeps_word_characters_and_digits() {
        assert_eq!(normalize("snake_case 123 한글"), "snake_case 123 한글");
    }

    #[test]
    fn test_empty_and_symbol_only_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  ★ ◆ ■  "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "a - b",
            "  기자 = 홍길동 @ 연합뉴스  ",
            "줄1\r\n\r\n줄2 © 2025",
            "...!!!???",
            "\u{3000}전각\u{3000}공백\u{00a0}nbsp",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
