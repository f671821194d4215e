use anyhow::{anyhow, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{info, warn};
use url::Url;

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Download the source listing document and save it under `dest_dir` using the
/// original filename. Returns the full path of the saved file.
pub async fn download_document(
    client: &Client,
    url_str: &str,
    dest_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    let url = Url::parse(url_str)?;
    let filename = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .unwrap_or("listing.txt");
    let dest_path = dest_dir.join(filename);

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut attempt = 0;
    let bytes = loop {
        attempt += 1;
        match client.get(url.as_str()).send().await {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => break bytes,
                Err(_) if attempt < MAX_RETRIES => {
                    warn!(url = %url, attempt, "body read failed; retrying");
                    sleep(RETRY_DELAY).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            },
            Err(_) if attempt < MAX_RETRIES => {
                warn!(url = %url, attempt, "request failed; retrying");
                sleep(RETRY_DELAY).await;
                continue;
            }
            Ok(resp) => return Err(anyhow!("HTTP error: {}", resp.status())),
            Err(e) => return Err(e.into()),
        }
    };

    fs::write(&dest_path, &bytes).await?;
    info!(path = %dest_path.display(), bytes = bytes.len(), "document saved");

    Ok(dest_path)
}
