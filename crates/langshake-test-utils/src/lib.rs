//! Testing utilities for the Langshake workspace
//!
//! Shared fixtures: sample artifacts, exported HTML pages, and a temporary
//! site layout.

#![allow(missing_docs)]

use langshake_artifact::Artifact;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn create_test_artifact_from(value: Value) -> Artifact {
    Artifact::from_value(value).unwrap()
}

pub fn create_article(title: &str) -> Artifact {
    create_test_artifact_from(json!({"@type": "Article", "title": title}))
}

pub fn create_website(name: &str, description: &str, language: &str) -> Artifact {
    create_test_artifact_from(json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": name,
        "description": description,
        "inLanguage": language
    }))
}

/// Exported page embedding each record in its own JSON-LD block
pub fn json_ld_page(records: &[Value]) -> String {
    let blocks: String = records
        .iter()
        .map(|r| format!("  <script type=\"application/ld+json\">{r}</script>\n"))
        .collect();
    format!("<!doctype html>\n<html>\n<head>\n{blocks}</head>\n<body></body>\n</html>\n")
}

/// Records of an artifact, as JSON values
pub fn records_of(artifact: &Artifact) -> Vec<Value> {
    artifact
        .records()
        .iter()
        .cloned()
        .map(Value::Object)
        .collect()
}

/// Temporary site: exported pages in `out/`, publication under `public/`
pub struct TestSite {
    dir: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("out")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root().join("out")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root().join("public")
    }

    pub fn out_dir(&self) -> PathBuf {
        self.public_dir().join("langshake")
    }

    pub fn index_path(&self) -> PathBuf {
        self.public_dir().join(".well-known/llm.json")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root().join(".langshake-cache.json")
    }

    /// Write an exported page at `relative` under the input directory
    pub fn add_page(&self, relative: &str, html: &str) -> PathBuf {
        let path = self.input_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, html).unwrap();
        path
    }

    /// Write a page whose JSON-LD is `records`
    pub fn add_json_ld_page(&self, relative: &str, records: &[Value]) -> PathBuf {
        self.add_page(relative, &json_ld_page(records))
    }

    /// Published artifact document for `slug`
    pub fn read_artifact(&self, slug: &str) -> Value {
        read_json(self.out_dir().join(format!("{slug}.json")))
    }

    /// Published verification document
    pub fn read_index(&self) -> Value {
        read_json(self.index_path())
    }
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

fn read_json(path: impl AsRef<Path>) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}
