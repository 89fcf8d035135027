use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Serves the pre-built frontend bundle. Paths that match no file get the
/// bundle's `index.html` so client-side routes resolve.
pub fn spa_service(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(dir.join("index.html")))
}
