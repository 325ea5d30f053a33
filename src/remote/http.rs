use std::path::Path;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Stream `url` into `path`, returning the number of bytes written.
///
/// A partially written file is removed when the transfer fails.
pub async fn download_file(client: &reqwest::Client, url: &str, path: &Path) -> Result<u64> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::network(format!("Failed to download {url}: {e}")))?;

    let status = response.status();
    if status.as_u16() == 429 {
        return Err(Error::RateLimit { retry_after: None });
    }
    if status.as_u16() == 404 {
        return Err(Error::NotFound(url.to_string()));
    }
    if !status.is_success() {
        return Err(Error::network(format!(
            "Unexpected response downloading {url}: {status}"
        )));
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let written = match write_body(response, path).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(path).await;
            return Err(e);
        }
    };

    tracing::debug!("Downloaded {} ({} bytes) to {}", url, written, path.display());
    Ok(written)
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::network(format!("Download interrupted: {e}")))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}
