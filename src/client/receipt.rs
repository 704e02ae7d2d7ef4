use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

/// 本地投票凭据的固定键名
pub const RECEIPT_KEY: &str = "kaizen_voted";
const RECEIPT_VALUE: &str = "true";

/// 本地投票凭据
///
/// 只作用于当前客户端，不是服务端去重手段。
pub trait ReceiptStore: Send + Sync {
    fn has_voted(&self) -> bool;
    fn record_vote(&self) -> io::Result<()>;
}

/// 以数据目录下的 `kaizen_voted` 文件保存凭据，重启后仍然有效
pub struct FileReceiptStore {
    path: PathBuf,
}

impl FileReceiptStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(RECEIPT_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReceiptStore for FileReceiptStore {
    fn has_voted(&self) -> bool {
        match fs::read_to_string(&self.path) {
            Ok(value) => value.trim() == RECEIPT_VALUE,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!("Failed to read vote receipt {}: {}", self.path.display(), e);
                false
            }
        }
    }

    fn record_vote(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, RECEIPT_VALUE)
    }
}

#[derive(Default)]
pub struct MemoryReceiptStore {
    voted: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voted() -> Self {
        let store = Self::default();
        store.voted.store(true, Ordering::SeqCst);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ReceiptStore for MemoryReceiptStore {
    fn has_voted(&self) -> bool {
        self.voted.load(Ordering::SeqCst)
    }

    fn record_vote(&self) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other("receipt storage unavailable"));
        }
        self.voted.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_receipt_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let receipts = FileReceiptStore::new(dir.path().join("nested"));
        assert!(!receipts.has_voted());

        receipts.record_vote().unwrap();
        assert_eq!(fs::read_to_string(receipts.path()).unwrap(), "true");

        let reopened = FileReceiptStore::new(dir.path().join("nested"));
        assert!(reopened.has_voted());
    }

    #[test]
    fn other_values_do_not_count_as_voted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RECEIPT_KEY), "false").unwrap();
        assert!(!FileReceiptStore::new(dir.path()).has_voted());
    }
}
