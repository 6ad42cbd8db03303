use std::sync::LazyLock;

use regex::Regex;

/// `<depth> [@ref@] <TAG> [data]`
static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\s+(?:(@[^@\s]+@)\s+)?([A-Za-z0-9_]+)(?:[ \t](.*))?$")
        .expect("line pattern is valid")
});

/// `given /family/`, anything after the last slash is ignored.
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^/]*)/(.*)/").expect("name pattern is valid"));

/// Why a line was skipped during decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    /// The line does not follow `<depth> [@ref@] <TAG> [data]`.
    #[error("expected '<depth> [@ref@] <TAG> [data]'")]
    Grammar,

    /// The depth number does not fit in memory.
    #[error("depth '{0}' is out of range")]
    DepthOutOfRange(String),

    /// A pointer line did not carry a `@ref@` token.
    #[error("expected a reference like '@I1@', found '{0}'")]
    Reference(String),
}

/// One grammatical line of interchange text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    pub depth: usize,
    pub xref: Option<&'a str>,
    /// Always uppercase.
    pub tag: String,
    /// Everything after the tag, without the separating whitespace.
    pub data: &'a str,
}

pub fn parse_line(raw: &str) -> Result<Line<'_>, MalformedReason> {
    let captures = LINE
        .captures(raw.trim_start())
        .ok_or(MalformedReason::Grammar)?;

    let depth = &captures[1];
    let depth = depth
        .parse()
        .map_err(|_| MalformedReason::DepthOutOfRange(depth.to_string()))?;

    Ok(Line {
        depth,
        xref: captures.get(2).map(|m| m.as_str()),
        tag: captures[3].to_uppercase(),
        data: captures.get(4).map_or("", |m| m.as_str()),
    })
}

/// Extracts the `@ref@` token a pointer line points at.
///
/// Only the first whitespace-separated word counts.
pub fn reference_token(data: &str) -> Result<&str, MalformedReason> {
    let token = data.split_whitespace().next().unwrap_or_default();
    let is_reference = token.len() > 2
        && token.starts_with('@')
        && token.ends_with('@')
        && !token[1..token.len() - 1].contains('@');

    if is_reference {
        Ok(token)
    } else {
        Err(MalformedReason::Reference(token.to_string()))
    }
}

/// Splits a `NAME` value into given and family name.
///
/// The family name runs from the first slash to the last one, so it may
/// itself contain slashes; the given name cannot. Without slashes, the first
/// word is the given name and the last word (if there are several) the
/// family name.
pub fn split_name(data: &str) -> (String, String) {
    if let Some(captures) = NAME.captures(data) {
        return (
            captures[1].trim().to_string(),
            captures[2].trim().to_string(),
        );
    }

    let mut words = data.split_whitespace();
    let given = words.next().unwrap_or_default().to_string();
    let family = words.next_back().unwrap_or_default().to_string();
    (given, family)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn parses_record_line() {
        let line = parse_line("0 @I12@ INDI").unwrap();
        assert_eq!(line.depth, 0);
        assert_eq!(line.xref, Some("@I12@"));
        assert_eq!(line.tag, "INDI");
        assert_eq!(line.data, "");
    }

    #[test]
    fn one_separator_before_data_leading_spaces_kept() {
        let line = parse_line("2 CONT   indented  ").unwrap();
        assert_eq!(line.tag, "CONT");
        assert_eq!(line.data, "  indented  ");

        assert_eq!(parse_line("1 NOTE\tx").unwrap().data, "x");
    }

    #[test]
    fn keeps_data_verbatim_and_uppercases_tag() {
        let line = parse_line("2 date 12 MAR 1815  ").unwrap();
        assert_eq!(line.depth, 2);
        assert_eq!(line.xref, None);
        assert_eq!(line.tag, "DATE");
        assert_eq!(line.data, "12 MAR 1815  ");
    }

    #[test_case("BIRT extra garbage @@"; "missing depth")]
    #[test_case("1"; "missing tag")]
    #[test_case("1 @@ NAME x"; "empty xref")]
    #[test_case("x 1 NAME"; "leading garbage")]
    #[test_case("1 NA-ME x"; "tag with punctuation")]
    fn rejects_malformed_lines(raw: &str) {
        assert_eq!(parse_line(raw), Err(MalformedReason::Grammar));
    }

    #[test]
    fn huge_depth_is_reported() {
        let raw = "99999999999999999999999 NAME x";
        assert!(matches!(
            parse_line(raw),
            Err(MalformedReason::DepthOutOfRange(_))
        ));
    }

    #[test_case("@I1@", "@I1@"; "bare")]
    #[test_case("  @F2@ trailing words", "@F2@"; "first word only")]
    fn accepts_reference(data: &str, expected: &str) {
        assert_eq!(reference_token(data), Ok(expected));
    }

    #[test_case(""; "empty")]
    #[test_case("@@"; "empty token")]
    #[test_case("I1"; "no delimiters")]
    #[test_case("@I@1@"; "inner at sign")]
    fn rejects_reference(data: &str) {
        assert!(reference_token(data).is_err());
    }

    #[test_case("Ada /Lovelace/", "Ada", "Lovelace"; "slashed")]
    #[test_case("Ada Augusta /King/ Jr", "Ada Augusta", "King"; "suffix ignored")]
    #[test_case("/Lovelace/", "", "Lovelace"; "family only")]
    #[test_case("Sean /O/Brien/", "Sean", "O/Brien"; "slash in family name")]
    #[test_case("Ada Byron King", "Ada", "King"; "fallback first and last")]
    #[test_case("Ada", "Ada", ""; "single word")]
    #[test_case("", "", ""; "empty")]
    fn splits_names(data: &str, given: &str, family: &str) {
        assert_eq!(split_name(data), (given.to_string(), family.to_string()));
    }
}
