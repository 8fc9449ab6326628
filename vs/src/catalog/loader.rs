//! Catalog loading
//!
//! The catalog document comes from a local file or an http(s) URL. Loading never
//! fails: any problem is logged and the built-in catalog is returned instead.

use std::path::Path;
use std::time::Duration;

use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use super::lookup::Catalog;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Load the catalog from `source`, or the built-in catalog when `source` is unset
pub async fn load_catalog(source: Option<&str>) -> Catalog {
    debug!(?source, "load_catalog: called");
    let Some(source) = source else {
        debug!("load_catalog: no source configured, using builtin");
        return Catalog::builtin();
    };

    match try_load(source).await {
        Ok(catalog) if !catalog.is_empty() => {
            info!("Loaded {} themes from {}", catalog.len(), source);
            catalog
        }
        Ok(_) => {
            warn!(%source, "load_catalog: catalog is empty, using builtin");
            Catalog::builtin()
        }
        Err(e) => {
            warn!(%source, error = %e, "load_catalog: failed to load catalog, using builtin");
            Catalog::builtin()
        }
    }
}

async fn try_load(source: &str) -> Result<Catalog> {
    debug!(%source, "try_load: called");
    let content = if source.starts_with("http://") || source.starts_with("https://") {
        fetch(source).await?
    } else {
        read_file(Path::new(source)).await?
    };

    Catalog::from_json(&content).context("Failed to parse catalog JSON")
}

async fn read_file(path: &Path) -> Result<String> {
    debug!(?path, "read_file: called");
    tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Failed to read catalog {}", path.display()))
}

async fn fetch(url: &str) -> Result<String> {
    debug!(%url, "fetch: called");
    let http = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = http.get(url).send().await.context("Catalog request failed")?;
    let status = response.status();
    if !status.is_success() {
        debug!(%status, "fetch: non-success status");
        return Err(eyre!("Catalog request returned HTTP {}", status));
    }

    response.text().await.context("Failed to read catalog response body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_no_source_uses_builtin() {
        let catalog = load_catalog(None).await;
        assert_eq!(catalog.len(), Catalog::builtin().len());
    }

    #[tokio::test]
    async fn test_missing_file_falls_back() {
        let catalog = load_catalog(Some("/nonexistent/vocabscene/themes.json")).await;
        assert!(catalog.find_theme("超市").is_some());
    }

    #[tokio::test]
    async fn test_invalid_json_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let catalog = load_catalog(file.path().to_str()).await;
        assert_eq!(catalog.len(), Catalog::builtin().len());
    }

    #[tokio::test]
    async fn test_empty_catalog_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let catalog = load_catalog(file.path().to_str()).await;
        assert!(!catalog.is_empty());
    }

    #[tokio::test]
    async fn test_loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bakery": {{"name": "面包店", "titles": ["香香面包店"], "vocabularies": {{"characters": [["miàn bāo shī", "面包师"]]}}}}}}"#
        )
        .unwrap();

        let catalog = load_catalog(file.path().to_str()).await;
        assert_eq!(catalog.len(), 1);
        let theme = catalog.find_theme("面包店").unwrap();
        assert_eq!(theme.titles, vec!["香香面包店"]);
        assert_eq!(theme.vocabularies.characters[0].label, "面包师");
    }
}
