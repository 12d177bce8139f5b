//! Parsing of `@v/list` bodies into ordered semantic versions.

use std::cmp::Ordering;

use semver::Version;

/// Ascending, duplicate-free set of module versions.
///
/// Ordering and equality follow semver precedence, so build metadata never
/// separates two entries. Of several builds of one version the bare one is
/// kept (`2.0.0` over `2.0.0+incompatible`), else the lowest build tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionList(Vec<Version>);

impl VersionList {
    /// Highest version, pre-releases included.
    pub fn latest(&self) -> Option<&Version> {
        self.0.last()
    }

    /// Highest version without a pre-release tag.
    pub fn latest_stable(&self) -> Option<&Version> {
        self.0.iter().rev().find(|v| v.pre.is_empty())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Version> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Version] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Version> {
        self.0
    }
}

impl FromIterator<Version> for VersionList {
    fn from_iter<I: IntoIterator<Item = Version>>(iter: I) -> Self {
        let mut versions: Vec<Version> = iter.into_iter().collect();
        versions.sort_by(|a, b| a.cmp_precedence(b).then_with(|| compare_builds(a, b)));
        versions.dedup_by(|later, kept| later.cmp_precedence(kept) == Ordering::Equal);
        Self(versions)
    }
}

// Bare versions first, then build tags in lexical order.
fn compare_builds(a: &Version, b: &Version) -> Ordering {
    (!a.build.is_empty())
        .cmp(&!b.build.is_empty())
        .then_with(|| a.build.cmp(&b.build))
}

impl IntoIterator for VersionList {
    type Item = Version;
    type IntoIter = std::vec::IntoIter<Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a VersionList {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parse a single listed version, tolerating the `v` prefix and short forms.
///
/// `v1.2.3` -> `1.2.3`, `v1.2` -> `1.2.0`, `1` -> `1.0.0`, `v2.0-rc.1` -> `2.0.0-rc.1`.
pub fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let err = match Version::parse(stripped) {
        Ok(version) => return Ok(version),
        Err(err) => err,
    };

    let split = stripped.find(['-', '+']).unwrap_or(stripped.len());
    let (core, suffix) = stripped.split_at(split);
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => return Err(err),
    };

    // Report the error for what was actually listed, not the padded form.
    Version::parse(&padded).map_err(|_| err)
}

/// Parse every non-empty line of a list body.
///
/// On failure returns the offending line alongside the parse error.
pub fn parse_list(body: &str) -> Result<Vec<Version>, (String, semver::Error)> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| parse_version(line).map_err(|err| (line.to_string(), err)))
        .collect()
}
