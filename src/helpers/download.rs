//! Download helpers for acquiring archives
//!
//! Archives land in a content-addressed cache
//! (`<cache>/<sha256>--<filename>`). A download is streamed to an
//! `.incomplete` file and only moved into place once its digest matches.

use crate::core::error::{FormulaError, Result};
use crate::core::output;
use crate::formula::Resource;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{hash, url};

/// Options shared by every fetch in one run
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    /// Ignore cached archives and download every URL again
    pub force: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::core::config::DEFAULT_HTTP_TIMEOUT_SECS),
            force: false,
        }
    }
}

/// Where `resource` is stored in the cache
pub fn cache_path(cache_dir: &Path, resource: &Resource) -> PathBuf {
    cache_dir.join(format!("{}--{}", resource.sha256, resource.filename()))
}

/// Fetch a resource into the cache and verify it.
///
/// Returns the path of the verified archive. A cached archive that no
/// longer matches its digest is discarded and downloaded again; a fresh
/// download that does not match is an integrity failure.
pub fn fetch(resource: &Resource, cache_dir: &Path, opts: &FetchOptions) -> Result<PathBuf> {
    let dest = cache_path(cache_dir, resource);

    if !opts.force && dest.exists() {
        match hash::verify_file(&dest, &resource.name, &resource.sha256) {
            Ok(()) => {
                output::detail(&format!("cached {}", resource.filename()));
                return Ok(dest);
            }
            Err(e) if e.is_integrity() => {
                output::warning(&format!(
                    "cached {} is corrupt, downloading again",
                    resource.filename()
                ));
                std::fs::remove_file(&dest)?;
            }
            Err(e) => return Err(e),
        }
    }

    std::fs::create_dir_all(cache_dir)?;
    let partial = cache_dir.join(format!(
        "{}.incomplete",
        dest.file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "download".to_string())
    ));

    let result = download_to(&resource.url, &partial, opts.timeout).and_then(|bytes| {
        hash::verify_file(&partial, &resource.name, &resource.sha256)?;
        Ok(bytes)
    });

    match result {
        Ok(bytes) => {
            std::fs::rename(&partial, &dest)?;
            output::detail(&format!(
                "downloaded {} ({})",
                resource.filename(),
                output::human_size(bytes)
            ));
            Ok(dest)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            Err(e)
        }
    }
}

/// Download `source_url` to `dest`, returning the number of bytes written.
pub fn download_to(source_url: &str, dest: &Path, timeout: Duration) -> Result<u64> {
    if let Some(src) = url::file_url_path(source_url) {
        return std::fs::copy(&src, dest).map_err(|e| FormulaError::unavailable(source_url, e));
    }

    let filename = url::extract_filename(source_url);
    let pb = output::spinner(&format!("downloading {}", filename));

    let response = match ureq::get(source_url).timeout(timeout).call() {
        Ok(response) => response,
        Err(e) => {
            pb.finish_and_clear();
            return Err(FormulaError::unavailable(source_url, describe_error(e)));
        }
    };

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        output::upgrade_to_bytes(&pb, len);
    }

    let mut file = std::fs::File::create(dest)?;
    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(n) => n,
            Err(e) => {
                pb.finish_and_clear();
                return Err(FormulaError::unavailable(source_url, e));
            }
        };
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        total_bytes += bytes_read as u64;
        pb.set_position(total_bytes);
    }

    file.flush()?;
    pb.finish_and_clear();
    Ok(total_bytes)
}

fn describe_error(e: ureq::Error) -> String {
    match e {
        ureq::Error::Status(code, _) => format!("HTTP status {}", code),
        ureq::Error::Transport(t) => t.to_string(),
    }
}
