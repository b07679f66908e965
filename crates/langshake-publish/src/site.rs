//! Site metadata for the verification document
//!
//! Metadata comes from configuration when present, otherwise it is inferred
//! from the published records: the first `WebSite`, else `Organization`,
//! else `Person` record of a page supplies name, description and language.
//! Failing that, the `<title>`, description meta tag and `<html lang>` of the
//! first page are used.

use crate::sources::html::head_metadata;
use langshake_artifact::{Artifact, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record types consulted for site metadata, in priority order
const SITE_TYPES: [&str; 3] = ["WebSite", "Organization", "Person"];

/// `{name, description, language}` block of the verification document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMetadata {
    pub name: String,
    pub description: String,
    pub language: String,
}

impl SiteMetadata {
    /// Create metadata
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            language: language.into(),
        }
    }

    /// Infer from one page's records
    ///
    /// Returns `None` unless the chosen record has all three fields.
    #[must_use]
    pub fn from_artifact(artifact: &Artifact) -> Option<Self> {
        let record = SITE_TYPES
            .iter()
            .find_map(|t| artifact.first_of_type(t))?;
        Some(Self {
            name: text_field(record, &["name"])?,
            description: text_field(record, &["description"])?,
            language: text_field(record, &["inLanguage", "language"])?,
        })
    }

    /// Read from a page's `<head>`
    ///
    /// Returns `None` unless title, description and language are all present.
    #[must_use]
    pub fn from_html(html: &str) -> Option<Self> {
        let (name, description, language) = head_metadata(html);
        Some(Self {
            name: name?,
            description: description?,
            language: language?,
        })
    }

    /// Configured → inferred from records → `fallback` → defaults
    ///
    /// `fallback` is only called when nothing earlier applies.
    #[must_use]
    pub fn resolve(
        configured: Option<Self>,
        inferred: Option<Self>,
        fallback: impl FnOnce() -> Option<Self>,
    ) -> Self {
        configured
            .or(inferred)
            .or_else(fallback)
            .unwrap_or_default()
    }
}

impl Default for SiteMetadata {
    fn default() -> Self {
        Self::new("My Site", "A site using Langshake", "en")
    }
}

fn text_field(record: &Record, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(value: Value) -> Artifact {
        Artifact::from_value(value).unwrap()
    }

    #[test]
    fn prefers_website_over_organization() {
        let artifact = page(json!([
            {"@type": "Organization", "name": "Org", "description": "o", "inLanguage": "fr"},
            {"@type": "WebSite", "name": "Site", "description": "s", "inLanguage": "en"}
        ]));
        let meta = SiteMetadata::from_artifact(&artifact).unwrap();
        assert_eq!(meta, SiteMetadata::new("Site", "s", "en"));
    }

    #[test]
    fn falls_back_to_language_key() {
        let artifact = page(json!({"@type": "Person", "name": "Ada", "description": "d", "language": "en-GB"}));
        assert_eq!(SiteMetadata::from_artifact(&artifact).unwrap().language, "en-GB");
    }

    #[test]
    fn incomplete_record_is_ignored() {
        let incomplete = page(json!({"@type": "WebSite", "name": "Site", "description": ""}));
        assert!(SiteMetadata::from_artifact(&incomplete).is_none());
    }

    #[test]
    fn from_html_needs_all_fields() {
        let full = r#"<html lang="en"><head><title>Home</title>
<meta name="description" content="Welcome"></head></html>"#;
        assert_eq!(
            SiteMetadata::from_html(full),
            Some(SiteMetadata::new("Home", "Welcome", "en"))
        );
        let no_lang = r#"<html><head><title>Home</title>
<meta name="description" content="Welcome"></head></html>"#;
        assert_eq!(SiteMetadata::from_html(no_lang), None);
    }

    #[test]
    fn resolve_order() {
        let configured = SiteMetadata::new("C", "c", "en");
        let inferred = SiteMetadata::new("I", "i", "en");
        let from_page = SiteMetadata::new("H", "h", "en");

        assert_eq!(
            SiteMetadata::resolve(Some(configured.clone()), Some(inferred.clone()), || {
                panic!("fallback consulted despite configured metadata")
            }),
            configured
        );
        assert_eq!(
            SiteMetadata::resolve(None, Some(inferred.clone()), || Some(from_page.clone())),
            inferred
        );
        assert_eq!(
            SiteMetadata::resolve(None, None, || Some(from_page.clone())),
            from_page
        );
        assert_eq!(SiteMetadata::resolve(None, None, || None), SiteMetadata::default());
    }
}
