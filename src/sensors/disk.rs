use super::{usage_percentage, SampleError, SensorError};
use crate::core::{Reading, Sensor};
use async_trait::async_trait;
use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

const ORIGIN: &str = "statvfs";

/// Space used on the filesystem holding `path`, as a percentage of its blocks.
#[derive(Debug, Clone)]
pub struct DiskSensor {
    path: PathBuf,
    reading_name: String,
}

impl DiskSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let reading_name = format!("{} usage", path.display());
        Self { path, reading_name }
    }
}

/// Block counts reported by `statvfs`, in fragment-size units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockCounts {
    pub total: u64,
    /// Blocks available to unprivileged users.
    pub available: u64,
}

impl BlockCounts {
    pub fn usage_percentage(&self) -> Result<f64, SensorError> {
        let used = self.total.checked_sub(self.available).ok_or_else(|| {
            SensorError::format(
                ORIGIN,
                format!("{} available blocks out of {}", self.available, self.total),
            )
        })?;
        usage_percentage(ORIGIN, used, self.total)
    }
}

/// Queries the filesystem containing `path`. Blocking.
pub fn block_counts(path: &Path) -> Result<BlockCounts, SensorError> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| SensorError::format(ORIGIN, "path contains a NUL byte"))?;

    // SAFETY: `c_path` is NUL-terminated and `stat` is a valid out-pointer
    // that statvfs fully initializes on success.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if ret != 0 {
        let err = io::Error::last_os_error();
        return Err(match err.kind() {
            io::ErrorKind::NotFound => SensorError::NotFound {
                kind: "path",
                name: path.display().to_string(),
            },
            _ => SensorError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        });
    }

    Ok(BlockCounts {
        total: stat.f_blocks as u64,
        available: stat.f_bavail as u64,
    })
}

#[async_trait]
impl Sensor for DiskSensor {
    fn name(&self) -> &str {
        "disk"
    }

    async fn sample(&self) -> Result<Vec<Reading>, SampleError> {
        let path = self.path.clone();
        let counts = tokio::task::spawn_blocking(move || block_counts(&path))
            .await
            .map_err(|e| SensorError::Io {
                path: self.path.clone(),
                source: io::Error::other(e),
            })??;
        Ok(vec![Reading::percentage(
            self.reading_name.clone(),
            counts.usage_percentage()?,
        )])
    }
}
