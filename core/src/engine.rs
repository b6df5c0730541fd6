//! Turns a persisted merged tree into output files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{format, resolve::resolve_tree, Error, Result, TokenGroup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    /// `css/variables`: custom properties declared under `selector`.
    CssVariables { selector: String },
    /// `json/nested`: the token tree with resolved values.
    JsonNested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub destination: String,
    pub format: Format,
}

/// One output target: a directory and the files written into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub name: String,
    pub build_path: PathBuf,
    pub files: Vec<OutputFile>,
}

pub trait Engine {
    /// Builds every file of every platform from the token tree stored at
    /// `source`, returning the paths written.
    fn build(&self, source: &Path, platforms: &[Platform]) -> Result<Vec<PathBuf>>;
}

/// The built-in engine: resolves references, math and color modifiers, then
/// writes the requested formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleEngine;

impl Engine for StyleEngine {
    fn build(&self, source: &Path, platforms: &[Platform]) -> Result<Vec<PathBuf>> {
        let data = fs::read_to_string(source).map_err(|err| Error::Read {
            path: source.to_path_buf(),
            source: err,
        })?;
        let tree: TokenGroup = serde_json::from_str(&data).map_err(|err| Error::Json {
            path: source.to_path_buf(),
            source: err,
        })?;
        let tokens = resolve_tree(&tree)?;
        tracing::debug!(source = %source.display(), tokens = tokens.len(), "resolved tokens");

        let mut written = Vec::new();
        for platform in platforms {
            fs::create_dir_all(&platform.build_path).map_err(|err| Error::Write {
                path: platform.build_path.clone(),
                source: err,
            })?;
            for file in &platform.files {
                let contents = match &file.format {
                    Format::CssVariables { selector } => format::css_variables(&tokens, selector),
                    Format::JsonNested => format::json_nested(&tokens)?,
                };
                let path = platform.build_path.join(&file.destination);
                fs::write(&path, contents).map_err(|err| Error::Write {
                    path: path.clone(),
                    source: err,
                })?;
                tracing::debug!(platform = %platform.name, path = %path.display(), "wrote output");
                written.push(path);
            }
        }
        Ok(written)
    }
}
