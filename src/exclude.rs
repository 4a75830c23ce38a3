//! Path-exclusion matching.
//!
//! An [`ExclusionSpec`] is an ordered list of path prefixes parsed from a
//! single `;`-delimited string. A request path matching any prefix bypasses
//! authentication entirely.

use std::fmt;

/// Ordered set of path prefixes exempt from authentication.
///
/// Matching is literal, case-sensitive prefix matching with no
/// normalization. This is intentionally permissive: a prefix of `/login`
/// also exempts `/loginX`. Callers wanting segment-exact matching should
/// configure trailing-delimiter prefixes such as `/login/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSpec {
    prefixes: Vec<String>,
}

impl ExclusionSpec {
    /// Parses a `;`-delimited prefix list, e.g. `"/ping;/login/;/public/"`.
    ///
    /// Empty entries match nothing and are dropped.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let prefixes = spec
            .split(';')
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .collect();
        Self { prefixes }
    }

    /// Returns true iff some configured prefix is a prefix of `path`.
    ///
    /// An empty spec yields false for every path, so authentication is
    /// required everywhere by default.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        self.prefixes.iter().any(|p| path.starts_with(p))
    }

    /// True when no prefixes are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// The configured prefixes, in order.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl fmt::Display for ExclusionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefixes.join(";"))
    }
}
