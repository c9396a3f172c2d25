//! Configuration management for docbuild.
//!
//! The configuration is fixed before the pipeline starts and then only read.
//! Child processes see it through [`DocBuildConfig::child_env`] rather than
//! through a mutated process environment.

pub mod loader;
pub mod validator;

use serde::{Deserialize, Serialize};

/// Everything the pipeline needs to know about the documentation tree and
/// the tools that build it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocBuildConfig {
    /// Environment variable carrying the docstring footprint to children
    pub footprint_env: String,

    /// How much docstring detail downstream generators render
    pub docstring_footprint: i32,

    /// Output format selector (site-generator builder name, output dir name)
    pub output_format: String,

    /// Cache-map renderer, run from the repository root
    pub cmap_generator: String,

    /// Dependency lister, run from the repository root
    pub dependency_lister: String,

    /// Documentation source tree, relative to the repository root
    pub source_dir: String,

    pub latex_compiler: String,

    /// LaTeX document compiled into the cheatsheet PDF
    pub cheatsheet_source: String,

    /// Static asset directory inside the source tree
    pub static_dir: String,

    /// Downloads directory inside the generated output tree
    pub downloads_dir: String,

    /// Static-site generator names, highest priority first
    pub site_generator_candidates: Vec<String>,
}

impl Default for DocBuildConfig {
    fn default() -> Self {
        DocBuildConfig {
            footprint_env: "FOOTPRINT_DOCSTRINGS".to_string(),
            docstring_footprint: 0,
            output_format: "html".to_string(),
            cmap_generator: "./gen_cmaps.py".to_string(),
            dependency_lister: "./list_dependencies.py".to_string(),
            source_dir: "source".to_string(),
            latex_compiler: "pdflatex".to_string(),
            cheatsheet_source: "cheatsheet.tex".to_string(),
            static_dir: "_static".to_string(),
            downloads_dir: "_downloads".to_string(),
            site_generator_candidates: vec![
                "sphinx-build".to_string(),
                "sphinx-build3".to_string(),
            ],
        }
    }
}

impl DocBuildConfig {
    /// Environment overlay applied to every child process.
    pub fn child_env(&self) -> Vec<(String, String)> {
        vec![(
            self.footprint_env.clone(),
            self.docstring_footprint.to_string(),
        )]
    }

    /// Output directory name, a sibling of the source tree.
    pub fn output_dir_name(&self) -> &str {
        &self.output_format
    }

    /// PDF the LaTeX compiler produces for the cheatsheet source.
    pub fn cheatsheet_pdf_name(&self) -> String {
        let stem = std::path::Path::new(&self.cheatsheet_source)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.cheatsheet_source.clone());
        format!("{}.pdf", stem)
    }

    /// Arguments passed to the resolved site generator.
    pub fn site_generator_args(&self) -> Vec<String> {
        vec![
            "-b".to_string(),
            self.output_format.clone(),
            ".".to_string(),
            format!("../{}", self.output_dir_name()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_child_env() {
        let config = DocBuildConfig::default();
        assert_eq!(
            config.child_env(),
            vec![("FOOTPRINT_DOCSTRINGS".to_string(), "0".to_string())]
        );
    }

    #[test]
    fn test_cheatsheet_pdf_name_derived_from_source() {
        let mut config = DocBuildConfig::default();
        assert_eq!(config.cheatsheet_pdf_name(), "cheatsheet.pdf");

        config.cheatsheet_source = "refcard.tex".to_string();
        assert_eq!(config.cheatsheet_pdf_name(), "refcard.pdf");
    }

    #[test]
    fn test_site_generator_args_follow_format() {
        let mut config = DocBuildConfig::default();
        assert_eq!(config.site_generator_args(), vec!["-b", "html", ".", "../html"]);

        config.output_format = "singlehtml".to_string();
        assert_eq!(
            config.site_generator_args(),
            vec!["-b", "singlehtml", ".", "../singlehtml"]
        );
    }
}
