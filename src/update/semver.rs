//! update::semver
//!
//! Version comparisons for release checks. Published versions sometimes
//! carry a leading `v`, which is accepted and stripped.

use crate::error::{codes, Error, Result};

fn parse(version: &str) -> Result<semver::Version> {
    semver::Version::parse(version.trim().trim_start_matches('v')).map_err(|err| {
        Error::new(codes::INVALID_SEMVER)
            .with_message(format!("\"{}\" is not a semantic version", version))
            .with_source(err)
    })
}

/// True when `release` is a newer version than `current`.
pub fn greater_than(release: &str, current: &str) -> Result<bool> {
    Ok(parse(release)? > parse(current)?)
}

/// True when `release` is an older version than `current`.
pub fn less_than(release: &str, current: &str) -> Result<bool> {
    Ok(parse(release)? < parse(current)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_component_not_lexicographically() {
        assert!(greater_than("2.10.0", "2.9.1").unwrap());
        assert!(!greater_than("2.9.1", "2.10.0").unwrap());
        assert!(less_than("2.9.1", "2.10.0").unwrap());
    }

    #[test]
    fn equal_versions_are_neither_greater_nor_less() {
        assert!(!greater_than("3.0.1", "3.0.1").unwrap());
        assert!(!less_than("3.0.1", "3.0.1").unwrap());
    }

    #[test]
    fn accepts_a_leading_v() {
        assert!(greater_than("v2.0.0", "1.9.9").unwrap());
    }

    #[test]
    fn prereleases_sort_before_the_release() {
        assert!(greater_than("3.0.0", "3.0.0-rc.1").unwrap());
    }

    #[test]
    fn garbage_is_an_invalid_semver_error() {
        let err = greater_than("latest", "1.0.0").unwrap_err();
        assert_eq!(err.code(), codes::INVALID_SEMVER);
    }
}
