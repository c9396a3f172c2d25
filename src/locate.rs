//! Location of the generated documentation for the `locate` command.

use std::path::{Path, PathBuf};

use crate::config::DocBuildConfig;

/// Generated output tree: `<root>/<format>`, absolute when `root` exists.
pub fn output_dir(root: &Path, config: &DocBuildConfig) -> PathBuf {
    std::fs::canonicalize(root)
        .unwrap_or_else(|_| root.to_path_buf())
        .join(config.output_dir_name())
}

/// `file://` URL of the index page, or of the search page for `search`.
///
/// The term is passed through as typed.
pub fn docs_url(out_dir: &Path, search: Option<&str>) -> String {
    match search {
        Some(term) => format!("file://{}?q={}", out_dir.join("search.html").display(), term),
        None => format!("file://{}", out_dir.join("index.html").display()),
    }
}

/// URL to hand to the browser for `--open`.
///
/// Nothing is opened unless asked; when it is, a search term selects the
/// search page over the index.
pub fn url_to_open(out_dir: &Path, open: bool, search: Option<&str>) -> Option<String> {
    open.then(|| docs_url(out_dir, search))
}

/// Open `url` in the default web browser.
pub fn open_in_browser(url: &str) -> std::io::Result<()> {
    open::that(url)
}
