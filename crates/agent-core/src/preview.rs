//! Generated Files & Inline Preview
//!
//! The output step may carry `index.html`, `styles.css` and `app.js`. They are
//! shown as code blocks and stitched into one document for a sandboxed frame.
//! Content is concatenated verbatim; nothing is escaped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::step::value_as_text;

pub const INDEX_HTML: &str = "index.html";
pub const STYLES_CSS: &str = "styles.css";
pub const APP_JS: &str = "app.js";

/// Preview frame height in pixels
pub const PREVIEW_HEIGHT: u32 = 600;

/// Highlighting hint for a generated file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeLanguage {
    Html,
    Css,
    Javascript,
    Text,
}

impl CodeLanguage {
    /// Infer from the file name suffix
    pub fn for_file(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".html") {
            CodeLanguage::Html
        } else if lower.ends_with(".css") {
            CodeLanguage::Css
        } else if lower.ends_with(".js") {
            CodeLanguage::Javascript
        } else {
            CodeLanguage::Text
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn language(&self) -> CodeLanguage {
        CodeLanguage::for_file(&self.name)
    }
}

/// Files from one output step, in the order the model listed them
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFiles {
    files: Vec<GeneratedFile>,
}

impl GeneratedFiles {
    /// Build from a `files` JSON object. Empty or non-object values yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let files: Vec<_> = obj
            .iter()
            .map(|(name, content)| GeneratedFile {
                name: name.clone(),
                content: value_as_text(content).unwrap_or_default(),
            })
            .collect();

        if files.is_empty() {
            None
        } else {
            Some(Self { files })
        }
    }

    pub fn from_pairs<I, N, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            files: pairs
                .into_iter()
                .map(|(name, content)| GeneratedFile {
                    name: name.into(),
                    content: content.into(),
                })
                .collect(),
        }
    }

    /// Content of a file by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.content.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneratedFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Compose the single-document preview
    pub fn preview(&self) -> PreviewDocument {
        PreviewDocument::compose(
            self.get(INDEX_HTML).unwrap_or_default(),
            self.get(STYLES_CSS).unwrap_or_default(),
            self.get(APP_JS).unwrap_or_default(),
        )
    }
}

impl<'a> IntoIterator for &'a GeneratedFiles {
    type Item = &'a GeneratedFile;
    type IntoIter = std::slice::Iter<'a, GeneratedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Composite HTML for the preview frame
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewDocument {
    pub html: String,
    pub height: u32,
    pub scrolling: bool,
}

impl PreviewDocument {
    pub fn compose(body: &str, css: &str, js: &str) -> Self {
        let html = format!(
            "<html>\n<head>\n<style>{css}</style>\n</head>\n<body>\n{body}\n<script>{js}</script>\n</body>\n</html>\n"
        );
        Self {
            html,
            height: PREVIEW_HEIGHT,
            scrolling: true,
        }
    }
}
