//! JSON-LD extraction from exported HTML pages

use super::scan::scan_pages;
use super::{SourceItem, SourceProvider};
use crate::error::{JsonLdError, SourceError};
use crate::site::SiteMetadata;
use langshake_artifact::{Artifact, Record};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const JSON_LD_MIME: &str = "application/ld+json";

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

static SCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("script pattern is valid")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern is valid")
});

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title pattern is valid")
});

static META_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").expect("meta pattern is valid"));

static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<html\b([^>]*)>").expect("html tag pattern is valid"));

/// Markup with comments removed
fn strip_comments(html: &str) -> Cow<'_, str> {
    COMMENT_RE.replace_all(html, "")
}

/// Value of attribute `name` in a tag's attribute text
fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    ATTR_RE.captures_iter(attrs).find_map(|c| {
        let key = c.get(1)?.as_str();
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        c.get(2)
            .or_else(|| c.get(3))
            .or_else(|| c.get(4))
            .map(|m| m.as_str())
    })
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn non_empty(text: &str) -> Option<String> {
    let text = decode_entities(text.trim());
    (!text.is_empty()).then_some(text)
}

/// All JSON-LD records of a page, in document order
///
/// Only `<script type="application/ld+json">` blocks outside comments count.
/// A block holding an array contributes each object in it.
///
/// # Errors
/// Returns [`JsonLdError`] for the first block that is not JSON, or that
/// holds anything but an object or an array of objects. Blocks are numbered
/// from 1.
pub fn extract_json_ld(html: &str) -> Result<Vec<Record>, JsonLdError> {
    let html = strip_comments(html);
    let mut records = Vec::new();
    let blocks = SCRIPT_RE.captures_iter(&html).filter(|script| {
        let attrs = script.get(1).map_or("", |m| m.as_str());
        attribute(attrs, "type").is_some_and(|t| t.trim().eq_ignore_ascii_case(JSON_LD_MIME))
    });

    for (i, script) in blocks.enumerate() {
        let block = i + 1;
        let body = script.get(2).map_or("", |m| m.as_str()).trim();
        let value = serde_json::from_str::<Value>(body)
            .map_err(|source| JsonLdError::Parse { block, source })?;
        match value {
            Value::Object(record) => records.push(record),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(record) => records.push(record),
                        other => {
                            return Err(JsonLdError::NotAnObject {
                                block,
                                found: kind_of(&other),
                            })
                        }
                    }
                }
            }
            other => {
                return Err(JsonLdError::NotAnObject {
                    block,
                    found: kind_of(&other),
                })
            }
        }
    }
    Ok(records)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `<title>` text, `<meta name="description">` content and `<html lang>`
pub(crate) fn head_metadata(html: &str) -> (Option<String>, Option<String>, Option<String>) {
    let html = strip_comments(html);
    let title = TITLE_RE
        .captures(&html)
        .and_then(|c| c.get(1))
        .and_then(|m| non_empty(m.as_str()));
    let description = META_RE
        .captures_iter(&html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|attrs| attribute(attrs, "name").is_some_and(|n| n.eq_ignore_ascii_case("description")))
        .and_then(|attrs| attribute(attrs, "content"))
        .and_then(non_empty);
    let language = HTML_TAG_RE
        .captures(&html)
        .and_then(|c| c.get(1))
        .and_then(|m| attribute(m.as_str(), "lang"))
        .and_then(non_empty);
    (title, description, language)
}

/// Pages under a directory, one artifact per page with JSON-LD
///
/// Slugs are the page path relative to the input directory, without
/// extension, with directory separators replaced by `-`
/// (`blog/post.html` → `blog-post`). Pages without JSON-LD are skipped.
#[derive(Debug, Clone)]
pub struct HtmlPageSource {
    input_dir: PathBuf,
}

impl HtmlPageSource {
    /// Source over `input_dir`
    #[inline]
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
        }
    }

    /// Scanned directory
    #[inline]
    #[must_use]
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Slug for a page path
    ///
    /// # Errors
    /// Returns [`SourceError::NoSlug`] for paths without a usable file stem
    pub fn slug_for(&self, page: &Path) -> Result<String, SourceError> {
        let relative = page.strip_prefix(&self.input_dir).unwrap_or(page);
        let stem = relative
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SourceError::NoSlug(page.to_path_buf()))?;

        let mut parts: Vec<&str> = relative
            .parent()
            .into_iter()
            .flat_map(Path::iter)
            .map(|c| c.to_str().ok_or_else(|| SourceError::NoSlug(page.to_path_buf())))
            .collect::<Result<_, _>>()?;
        parts.push(stem);
        Ok(parts.join("-"))
    }

    /// Markup of the first page in scan order, if any page is readable
    #[must_use]
    pub fn first_page_html(&self) -> Option<String> {
        let first = scan_pages(&self.input_dir).into_iter().next()?;
        fs::read_to_string(&first)
            .map_err(|e| debug!(page = %first.display(), error = %e, "first page unreadable"))
            .ok()
    }

    fn read_page(&self, page: &Path) -> Result<Option<SourceItem>, SourceError> {
        let html = fs::read_to_string(page).map_err(|source| SourceError::Io {
            path: page.to_path_buf(),
            source,
        })?;
        let records = extract_json_ld(&html).map_err(|source| SourceError::Malformed {
            path: page.to_path_buf(),
            source,
        })?;
        if records.is_empty() {
            debug!(page = %page.display(), "no JSON-LD found");
            return Ok(None);
        }
        let slug = self.slug_for(page)?;
        Ok(Some(SourceItem::new(slug, page, Artifact::new(records))))
    }
}

impl SourceProvider for HtmlPageSource {
    fn name(&self) -> &str {
        "html"
    }

    fn items(&self) -> Vec<Result<SourceItem, SourceError>> {
        scan_pages(&self.input_dir)
            .iter()
            .filter_map(|page| self.read_page(page).transpose())
            .collect()
    }

    fn site_fallback(&self) -> Option<SiteMetadata> {
        self.first_page_html()
            .as_deref()
            .and_then(SiteMetadata::from_html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BENCHMARK: &str = r#"<!doctype html>
<html lang="en">
<head>
  <title>Benchmark</title>
  <script type="application/ld+json">
    {"@context": "http://schema.org", "@type": "Article", "headline": "Bench"}
  </script>
  <script type="application/json">{"foo": "bar"}</script>
  <SCRIPT TYPE='application/ld+json'>
    [{"@type": "Product", "name": "Widget"}]
  </SCRIPT>
  <script src="/app.js"></script>
  <script async type=application/ld+json>{"@type": "website", "name": "Site"}</script>
  <script type="text/plain">{ not json </script>
</head>
<body></body>
</html>"#;

    #[test]
    fn extracts_all_blocks_in_order() {
        let records = extract_json_ld(BENCHMARK).unwrap();
        let types: Vec<_> = records
            .iter()
            .map(|r| r["@type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["Article", "Product", "website"]);
        assert!(records.iter().all(|r| r.get("foo").is_none()));
    }

    #[test]
    fn no_json_ld_yields_nothing() {
        let html = "<html><head></head><body><h1>No schema here</h1></body></html>";
        assert!(extract_json_ld(html).unwrap().is_empty());
    }

    #[test]
    fn commented_out_blocks_are_ignored() {
        let html = r#"<html><head>
<!-- <script type="application/ld+json">{"@type": "Draft"}</script> -->
<script type="application/ld+json">{"@type": "Article"}</script>
<!--
  <script type="application/ld+json">{ broken </script>
-->
</head></html>"#;
        let records = extract_json_ld(html).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["@type"], "Article");
    }

    #[test]
    fn unparseable_block_is_an_error() {
        let html = r#"<script type="application/ld+json">{"@type": "Article"}</script>
<script type="application/ld+json">{ "@type": "Article", broken</script>"#;
        assert!(matches!(
            extract_json_ld(html),
            Err(JsonLdError::Parse { block: 2, .. })
        ));
    }

    #[test]
    fn non_object_blocks_are_errors() {
        let scalar = r#"<script type="application/ld+json">42</script>"#;
        assert!(matches!(
            extract_json_ld(scalar),
            Err(JsonLdError::NotAnObject { block: 1, found: "number" })
        ));

        let mixed = r#"<script type="application/ld+json">[{"@type": "Thing"}, "x"]</script>"#;
        assert!(matches!(
            extract_json_ld(mixed),
            Err(JsonLdError::NotAnObject { block: 1, found: "string" })
        ));
    }

    #[test]
    fn head_metadata_fields() {
        let html = r#"<!doctype html>
<html class="no-js" lang="de">
<head>
  <!-- <title>Old</title> -->
  <title> Docs &amp; Guides </title>
  <meta charset="utf-8">
  <meta content="All the guides" name="Description">
</head></html>"#;
        assert_eq!(
            head_metadata(html),
            (
                Some("Docs & Guides".to_string()),
                Some("All the guides".to_string()),
                Some("de".to_string())
            )
        );
        assert_eq!(head_metadata("<p>bare</p>"), (None, None, None));
    }

    #[test]
    fn source_skips_pages_without_json_ld() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("blog")).unwrap();
        fs::write(dir.path().join("about.html"), BENCHMARK).unwrap();
        fs::write(dir.path().join("blog/first.html"), BENCHMARK).unwrap();
        fs::write(dir.path().join("plain.html"), "<p>nothing</p>").unwrap();

        let source = HtmlPageSource::new(dir.path());
        let items: Vec<_> = source.items().into_iter().map(Result::unwrap).collect();
        let slugs: Vec<_> = items.iter().map(|i| i.slug.as_str()).collect();

        assert_eq!(slugs, vec!["about", "blog-first"]);
        assert_eq!(items[0].artifact.len(), 3);
    }

    #[test]
    fn source_reports_malformed_pages() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("bad.html"),
            r#"<script type="application/ld+json">{ "@type": "Article", broken</script>"#,
        )
        .unwrap();
        fs::write(dir.path().join("good.html"), BENCHMARK).unwrap();

        let items = HtmlPageSource::new(dir.path()).items();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[0],
            Err(SourceError::Malformed { path, .. }) if path.ends_with("bad.html")
        ));
        assert!(items[1].is_ok());
    }

    #[test]
    fn site_fallback_reads_first_page() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.html"),
            r#"<html lang="fr"><head><title>Accueil</title>
<meta name="description" content="Le site"></head></html>"#,
        )
        .unwrap();
        fs::write(dir.path().join("b.html"), BENCHMARK).unwrap();

        let source = HtmlPageSource::new(dir.path());
        assert!(source.first_page_html().unwrap().contains("Accueil"));
        assert_eq!(
            source.site_fallback(),
            Some(SiteMetadata::new("Accueil", "Le site", "fr"))
        );
        assert_eq!(HtmlPageSource::new(dir.path().join("missing")).site_fallback(), None);
    }

    #[test]
    fn slug_for_nested_page() {
        let source = HtmlPageSource::new("/site/out");
        assert_eq!(
            source.slug_for(Path::new("/site/out/docs/api/index.html")).unwrap(),
            "docs-api-index"
        );
        assert_eq!(source.slug_for(Path::new("/site/out/contact.html")).unwrap(), "contact");
    }
}
