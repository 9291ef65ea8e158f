// Copyright 2024 the Sonntagsfrage developers.
// This file is part of Sonntagsfrage.
// Sonntagsfrage is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// Sonntagsfrage is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with Sonntagsfrage.  If not, see <https://www.gnu.org/licenses/>.


//! Fetching the raw results pages. A non-success status is fatal for that
//! pollster's run; there are no retries. Requests are rate limited globally
//! to one per second to be polite to the source site.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::sleep;
use std::time::Duration;
use log::info;
use once_cell::sync::OnceCell;
use thiserror::Error;

#[derive(Error,Debug)]
pub enum FetchError {
    #[error("could not retrieve {url}: status {status}")]
    Status { url : String, status : reqwest::StatusCode },
    #[error("could not retrieve page: {0}")]
    Network(#[from] reqwest::Error),
}

fn rate_limit() {
    static DOWNLOAD_RATE_LIMIT_MUTEX: OnceCell<Mutex<()>> = OnceCell::new();
    let _lock = DOWNLOAD_RATE_LIMIT_MUTEX.get_or_init(||Mutex::new(())).lock().unwrap();
    sleep(Duration::from_millis(1000));
}

/// Fetch a results page as text. Fails loudly on a non-2xx status.
pub fn fetch_document(url:&str) -> Result<String,FetchError> {
    rate_limit();
    info!("fetching {}",url);
    let response = reqwest::blocking::get(url)?;
    let status = response.status();
    if !status.is_success() { return Err(FetchError::Status{url:url.to_string(),status}); }
    Ok(response.text()?)
}

/// Helper for keeping a local file mirror of fetched URLs, for development
/// runs against already-downloaded pages. Tries to make the file layout an
/// obvious mirror of the URL.
pub struct CacheDir {
    base : PathBuf,
}

impl CacheDir {
    pub fn new<P:AsRef<Path>>(path:P) -> Self {
        CacheDir{ base: path.as_ref().to_path_buf() }
    }

    /// Get where a file representing said URL should be stored.
    pub fn file(&self,url:&str) -> PathBuf {
        let url_path = url.trim_start_matches("https://").trim_start_matches("http://");
        let res = self.base.join(url_path);
        if url_path.chars().last().map(std::path::is_separator).unwrap_or(true) { res.join("index.html") } else { res }
    }

    /// Return the cached copy of a URL, fetching and storing it first if absent.
    pub fn get_or_fetch(&self,url:&str) -> anyhow::Result<String> {
        let file = self.file(url);
        match std::fs::read_to_string(&file) {
            Ok(contents) => Ok(contents),
            Err(_) => {
                let contents = fetch_document(url)?;
                if let Some(p) = file.parent() {
                    std::fs::create_dir_all(p)?;
                }
                std::fs::write(&file,&contents)?;
                Ok(contents)
            }
        }
    }
}
