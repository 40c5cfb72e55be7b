//! Glob-style address matching used to tell internal addresses from
//! external ones.
//!
//! Patterns support `*` (any run of characters) and `?` (exactly one
//! character) and always match case-insensitively against the whole input.

use regex::{Regex, RegexBuilder};

/// Compiled size cap for a single pattern, matching the regex crate default.
const SIZE_LIMIT: usize = 10 * (1 << 20);

/// A compiled list of glob patterns.
#[derive(Debug, Clone, Default)]
pub struct WildcardMatcher {
  patterns:   Vec<Regex>,
  /// Whether any pattern was supplied, even if none of them compiled.
  configured: bool,
}

impl WildcardMatcher {
  pub fn new<I, S>(patterns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self::with_size_limit(patterns, SIZE_LIMIT)
  }

  pub(crate) fn with_size_limit<I, S>(patterns: I, size_limit: usize) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut configured = false;
    let patterns = patterns
      .into_iter()
      .filter_map(|pattern| {
        configured = true;
        let pattern = pattern.as_ref();
        match compile(pattern, size_limit) {
          Ok(regex) => Some(regex),
          Err(e) => {
            // Escaping is total; only the regex size limit can land here.
            tracing::warn!(pattern, error = %e, "skipping wildcard pattern");
            None
          }
        }
      })
      .collect();
    Self {
      patterns,
      configured,
    }
  }

  /// True when no patterns were supplied at all. A matcher whose patterns
  /// all failed to compile is not open; it matches nothing.
  pub fn is_open(&self) -> bool { !self.configured }

  /// True if any pattern matches `value`.
  pub fn is_match(&self, value: &str) -> bool {
    self.patterns.iter().any(|re| re.is_match(value))
  }
}

/// Translate a glob into an anchored, case-insensitive regular expression.
fn compile(pattern: &str, size_limit: usize) -> Result<Regex, regex::Error> {
  let body = regex::escape(pattern)
    .replace(r"\*", ".*")
    .replace(r"\?", ".");
  RegexBuilder::new(&format!("^{body}$"))
    .case_insensitive(true)
    .size_limit(size_limit)
    .build()
}

/// Whitelist/blacklist classification of email addresses.
///
/// The whitelist holds glob patterns; an empty whitelist admits everything,
/// while one whose patterns all failed to compile admits nothing.
/// The blacklist holds exact addresses.
#[derive(Debug, Clone, Default)]
pub struct EmailFilter {
  whitelist: WildcardMatcher,
  blacklist: Vec<String>,
}

impl EmailFilter {
  pub fn new<W, B>(whitelist: W, blacklist: B) -> Self
  where
    W: IntoIterator,
    W::Item: AsRef<str>,
    B: IntoIterator,
    B::Item: Into<String>,
  {
    Self {
      whitelist: WildcardMatcher::new(whitelist),
      blacklist: blacklist.into_iter().map(Into::into).collect(),
    }
  }

  pub fn is_allowed(&self, email: &str) -> bool {
    self.whitelist.is_open() || self.whitelist.is_match(email)
  }

  pub fn is_forbidden(&self, email: &str) -> bool {
    self.blacklist.iter().any(|forbidden| forbidden == email)
  }

  /// Allowed by the whitelist and not explicitly forbidden.
  pub fn is_internal(&self, email: &str) -> bool {
    self.is_allowed(email) && !self.is_forbidden(email)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn star_matches_any_local_part() {
    let filter = EmailFilter::new(["*@x.io"], Vec::<String>::new());
    assert!(filter.is_allowed("john@x.io"));
    assert!(filter.is_allowed("JOHN@X.IO"));
    assert!(!filter.is_allowed("john@x.io.evil.com"));
  }

  #[test]
  fn non_matching_domain_is_rejected() {
    let filter = EmailFilter::new(["*@y.io"], Vec::<String>::new());
    assert!(!filter.is_allowed("john@x.io"));
  }

  #[test]
  fn empty_whitelist_is_open() {
    let filter = EmailFilter::default();
    assert!(filter.is_allowed("john@x.io"));
    assert!(filter.is_allowed("anything at all"));
  }

  #[test]
  fn whitelist_that_failed_to_compile_admits_nothing() {
    let filter = EmailFilter {
      whitelist: WildcardMatcher::with_size_limit(["*@corp.io", "*@corp.dev"], 1),
      blacklist: Vec::new(),
    };
    assert!(!filter.whitelist.is_open());
    assert!(!filter.is_allowed("dev@corp.io"));
    assert!(!filter.is_allowed("anyone@elsewhere.com"));
    assert!(!filter.is_internal("dev@corp.io"));

    let open = EmailFilter::new(Vec::<String>::new(), Vec::<String>::new());
    assert!(open.is_allowed("anyone@elsewhere.com"));
  }

  #[test]
  fn question_mark_matches_exactly_one_character() {
    let matcher = WildcardMatcher::new(["bot?@x.io"]);
    assert!(matcher.is_match("bot1@x.io"));
    assert!(!matcher.is_match("bot@x.io"));
    assert!(!matcher.is_match("bot12@x.io"));
  }

  #[test]
  fn regex_metacharacters_are_literal() {
    let matcher = WildcardMatcher::new(["a.b+c@x.io"]);
    assert!(matcher.is_match("a.b+c@x.io"));
    assert!(!matcher.is_match("aXbbc@x.io"));
  }

  #[test]
  fn blacklist_is_exact() {
    let filter = EmailFilter::new(Vec::<String>::new(), ["ceo@x.io"]);
    assert!(filter.is_forbidden("ceo@x.io"));
    assert!(!filter.is_forbidden("ceo2@x.io"));
    assert!(!filter.is_forbidden("*@x.io"));
    assert!(!filter.is_internal("ceo@x.io"));
    assert!(filter.is_internal("dev@x.io"));
  }
}
