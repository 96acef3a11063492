//! CIFAR-100 download and extraction
//!
//! Fetches the binary archive once and unpacks it next to itself. Work that
//! is already on disk is skipped, so repeated calls are cheap.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::utils::error::{BenchError, Result};

/// Location of the binary CIFAR-100 distribution
pub const CIFAR100_URL: &str = "https://www.cs.toronto.edu/~kriz/cifar-100-binary.tar.gz";

/// Archive file name inside the data directory
pub const ARCHIVE_NAME: &str = "cifar-100-binary.tar.gz";

/// Directory the archive unpacks into
pub const EXTRACTED_DIR: &str = "cifar-100-binary";

/// Time allowed to establish the connection; the transfer itself is unbounded
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Directory holding `train.bin`, `test.bin` and the label names
pub fn extracted_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(EXTRACTED_DIR)
}

/// Whether both splits are already unpacked under `data_dir`
pub fn is_extracted(data_dir: &Path) -> bool {
    let dir = extracted_dir(data_dir);
    dir.join("train.bin").is_file() && dir.join("test.bin").is_file()
}

/// Download and unpack CIFAR-100 into `data_dir`, returning the extracted directory
pub fn download_cifar100(data_dir: &Path) -> Result<PathBuf> {
    if is_extracted(data_dir) {
        info!("CIFAR-100 already present in {:?}", extracted_dir(data_dir));
        return Ok(extracted_dir(data_dir));
    }

    fs::create_dir_all(data_dir)?;
    let archive_path = data_dir.join(ARCHIVE_NAME);

    if archive_path.is_file() {
        info!("CIFAR-100 archive already exists, skipping download");
    } else {
        fetch(CIFAR100_URL, &archive_path)?;
    }

    info!("Extracting {:?}...", archive_path);
    extract_tar_gz(&archive_path, data_dir)?;

    if !is_extracted(data_dir) {
        return Err(BenchError::Archive(
            archive_path,
            format!("archive did not contain {}/train.bin and test.bin", EXTRACTED_DIR),
        ));
    }

    info!("Extraction complete");
    Ok(extracted_dir(data_dir))
}

fn fetch(url: &str, destination: &Path) -> Result<()> {
    info!("Downloading CIFAR-100 from {}...", url);

    let download_err = |reason: String| BenchError::Download {
        url: url.to_string(),
        reason,
    };

    // Only connecting is bounded; the body may take as long as it needs.
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(None)
        .build()
        .map_err(|e| download_err(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| download_err(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(download_err(format!("server responded with {}", status)));
    }

    // Stream into a partial file so an interrupted download is never
    // mistaken for a complete archive.
    let partial = destination.with_extension("part");
    let mut file = File::create(&partial)?;
    let written = match response.copy_to(&mut file) {
        Ok(written) => written,
        Err(e) => {
            drop(file);
            let _ = fs::remove_file(&partial);
            return Err(download_err(format!("transfer interrupted: {}", e)));
        }
    };
    file.sync_all()?;
    drop(file);
    fs::rename(&partial, destination)?;

    info!("Downloaded {:.1} MB", written as f64 / 1_048_576.0);
    Ok(())
}

/// Extract a tar.gz file into `output_dir`
fn extract_tar_gz(tar_gz_path: &Path, output_dir: &Path) -> Result<()> {
    let tar_gz = File::open(tar_gz_path)?;
    let decompressor = flate2::read::GzDecoder::new(tar_gz);
    let mut archive = tar::Archive::new(decompressor);

    archive
        .unpack(output_dir)
        .map_err(|e| BenchError::Archive(tar_gz_path.to_path_buf(), e.to_string()))
}
