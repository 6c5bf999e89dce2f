//! Page selections for the PDF split tool.
//!
//! Two modes exist and they parse differently:
//!
//! * **page** mode takes one non-negative integer; `0` is the sentinel for
//!   "split into every individual page".
//! * **range** mode takes a comma-separated list such as `1,3,4-5,6-9`.
//!   Tokens are kept in the order given, duplicates and overlaps included;
//!   the server resolves them against the real page count.

use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static RE_PAGE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(-\d+)?)(,\d+(-\d+)?)*$").unwrap());

/// One comma-separated element of a range specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Single(u32),
    /// Inclusive, `start <= end`.
    Range { start: u32, end: u32 },
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Single(n) => write!(f, "{n}"),
            PageToken::Range { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// A parsed range-mode specification.
///
/// The trimmed input is kept verbatim and is what goes on the wire; the
/// tokens exist for inspection only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRangeSpec {
    source: String,
    tokens: Vec<PageToken>,
}

impl PageRangeSpec {
    /// Parse a range-mode string like `1,3,4-5,6-9`.
    ///
    /// Surrounding whitespace is trimmed; any other whitespace is an error.
    /// A bare `0` is rejected since it only has meaning as the page-mode
    /// sentinel. Zero inside a longer list is left for the server to judge.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let reject = |reason: &str| ValidationError::InvalidPageRange {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(reject("empty"));
        }
        if !RE_PAGE_RANGE.is_match(trimmed) {
            return Err(reject("not a comma-separated list of pages or ranges"));
        }
        if trimmed == "0" {
            return Err(reject("0 selects every page only in page mode"));
        }

        let mut tokens = Vec::new();
        for part in trimmed.split(',') {
            let token = match part.split_once('-') {
                Some((s, e)) => {
                    let start = parse_page(s).ok_or_else(|| reject("page number too large"))?;
                    let end = parse_page(e).ok_or_else(|| reject("page number too large"))?;
                    if start > end {
                        return Err(reject(&format!("range {start}-{end} has start after end")));
                    }
                    PageToken::Range { start, end }
                }
                None => PageToken::Single(
                    parse_page(part).ok_or_else(|| reject("page number too large"))?,
                ),
            };
            tokens.push(token);
        }

        Ok(Self {
            source: trimmed.to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &[PageToken] {
        &self.tokens
    }

    /// The trimmed input as the user typed it.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for PageRangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_page(s: &str) -> Option<u32> {
    s.parse::<u32>().ok()
}

/// Page-mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPage {
    /// The `0` sentinel: one output file per page.
    AllPages,
    /// Split after this page.
    Page(u32),
}

impl SplitPage {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidPageNumber {
                input: input.to_string(),
            });
        }
        match trimmed.parse::<u32>() {
            Ok(0) => Ok(SplitPage::AllPages),
            Ok(n) => Ok(SplitPage::Page(n)),
            Err(_) => Err(ValidationError::InvalidPageNumber {
                input: input.to_string(),
            }),
        }
    }

    fn as_field(&self) -> String {
        match self {
            SplitPage::AllPages => "0".to_string(),
            SplitPage::Page(n) => n.to_string(),
        }
    }
}

/// Options for the split tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOptions {
    Page(SplitPage),
    Range(PageRangeSpec),
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions::Page(SplitPage::AllPages)
    }
}

impl SplitOptions {
    /// Scalar fields for the split endpoint. Both `splitPage` and
    /// `splitRange` are always present; the one the mode doesn't use is
    /// sent as `0` / empty.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let (page, range, mode) = match self {
            SplitOptions::Page(p) => (p.as_field(), String::new(), "page"),
            SplitOptions::Range(spec) => ("0".to_string(), spec.as_str().to_string(), "range"),
        };
        vec![
            ("splitPage".to_string(), page),
            ("splitRange".to_string(), range),
            ("mode".to_string(), mode.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_tokens_in_order() {
        let spec = PageRangeSpec::parse("1,3,4-5,6-9").unwrap();
        assert_eq!(
            spec.tokens(),
            &[
                PageToken::Single(1),
                PageToken::Single(3),
                PageToken::Range { start: 4, end: 5 },
                PageToken::Range { start: 6, end: 9 },
            ]
        );
        assert_eq!(spec.to_string(), "1,3,4-5,6-9");
    }

    #[test]
    fn keeps_duplicates_and_order() {
        let spec = PageRangeSpec::parse("5,2,2,1-3").unwrap();
        assert_eq!(spec.tokens().len(), 4);
        assert_eq!(spec.to_string(), "5,2,2,1-3");
    }

    #[test]
    fn equal_endpoints_are_one_page() {
        let spec = PageRangeSpec::parse("4-4").unwrap();
        assert_eq!(spec.tokens(), &[PageToken::Range { start: 4, end: 4 }]);
    }

    #[test]
    fn rejects_reversed_range() {
        assert!(matches!(
            PageRangeSpec::parse("5-2"),
            Err(ValidationError::InvalidPageRange { .. })
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "   ", "a,b", "1,,2", "1-", "-3", "1 ,2", "1-2-3", "1,2,"] {
            assert!(PageRangeSpec::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn trims_outer_whitespace() {
        assert_eq!(PageRangeSpec::parse("  2,4 ").unwrap().to_string(), "2,4");
    }

    #[test]
    fn bare_zero_is_only_a_page_mode_sentinel() {
        assert!(matches!(
            PageRangeSpec::parse(" 0 "),
            Err(ValidationError::InvalidPageRange { .. })
        ));
        assert_eq!(SplitPage::parse("0").unwrap(), SplitPage::AllPages);
    }

    #[test]
    fn zero_inside_a_list_is_left_to_the_server() {
        assert_eq!(
            PageRangeSpec::parse("1,0").unwrap().tokens(),
            &[PageToken::Single(1), PageToken::Single(0)]
        );
        assert_eq!(
            PageRangeSpec::parse("0-3").unwrap().tokens(),
            &[PageToken::Range { start: 0, end: 3 }]
        );
        assert_eq!(PageRangeSpec::parse("2,0-0").unwrap().tokens().len(), 2);
    }

    #[test]
    fn split_page_parsing() {
        assert_eq!(SplitPage::parse("7").unwrap(), SplitPage::Page(7));
        for bad in ["", "x", "-1", "1.5", "99999999999"] {
            assert!(SplitPage::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn page_mode_params_send_empty_range() {
        let params = SplitOptions::Page(SplitPage::Page(3)).to_params();
        assert_eq!(
            params,
            vec![
                ("splitPage".to_string(), "3".to_string()),
                ("splitRange".to_string(), String::new()),
                ("mode".to_string(), "page".to_string()),
            ]
        );
    }

    #[test]
    fn range_mode_params_send_zero_page() {
        let spec = PageRangeSpec::parse("1-2,5").unwrap();
        let params = SplitOptions::Range(spec).to_params();
        assert_eq!(params[0], ("splitPage".to_string(), "0".to_string()));
        assert_eq!(params[1], ("splitRange".to_string(), "1-2,5".to_string()));
        assert_eq!(params[2], ("mode".to_string(), "range".to_string()));
    }

    #[test]
    fn range_is_sent_as_typed_not_reformatted() {
        let spec = PageRangeSpec::parse(" 01-3,007 ").unwrap();
        assert_eq!(
            spec.tokens(),
            &[PageToken::Range { start: 1, end: 3 }, PageToken::Single(7)]
        );
        let params = SplitOptions::Range(spec).to_params();
        assert_eq!(params[1], ("splitRange".to_string(), "01-3,007".to_string()));
    }
}
