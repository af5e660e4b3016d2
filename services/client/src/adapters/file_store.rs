//! services/client/src/adapters/file_store.rs
//!
//! A `KeyValueStore` persisted as a single JSON object on disk. Writes go to
//! a uniquely named, owner-only sibling file that is then renamed over the
//! target, so a crash never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use classroom_core::ports::{KeyValueStore, PortError, PortResult};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

type Entries = BTreeMap<String, String>;

enum Loaded {
    Entries(Entries),
    Corrupt(serde_json::Error),
}

pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> PortResult<Loaded> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(Loaded::Entries(Entries::new())),
            Ok(raw) => Ok(match serde_json::from_str(&raw) {
                Ok(entries) => Loaded::Entries(entries),
                Err(e) => Loaded::Corrupt(e),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Loaded::Entries(Entries::new())),
            Err(e) => Err(storage_error(&self.path, e)),
        }
    }

    async fn read_entries(&self) -> PortResult<Entries> {
        match self.load().await? {
            Loaded::Entries(entries) => Ok(entries),
            Loaded::Corrupt(e) => Err(PortError::Storage(format!(
                "{} is corrupt: {e}",
                self.path.display()
            ))),
        }
    }

    /// Like `read_entries`, but a corrupt file is replaced rather than
    /// blocking every future write.
    async fn read_entries_for_update(&self) -> PortResult<Entries> {
        match self.load().await? {
            Loaded::Entries(entries) => Ok(entries),
            Loaded::Corrupt(e) => {
                warn!(path = %self.path.display(), error = %e, "Replacing corrupt store file");
                Ok(Entries::new())
            }
        }
    }

    async fn write_entries(&self, entries: &Entries) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }

        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let tmp = self.temp_path();
        if let Err(e) = write_private(&tmp, raw.as_bytes()).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(storage_error(&tmp, e));
        }

        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error(&self.path, e))
    }

    /// A sibling path no other writer, in this process or another, will pick.
    fn temp_path(&self) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = self
            .path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.{n}.tmp", std::process::id()))
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creates `path` readable by the owner only, then writes and syncs `data`.
async fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

fn storage_error(path: &Path, err: std::io::Error) -> PortError {
    PortError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries_for_update().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries_for_update().await?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::domain::{SignInResponse, UserProfile};
    use classroom_core::ports::AuthTransport;
    use classroom_core::session::{AuthStatus, SessionStore, TOKEN_KEY, USER_KEY};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn values_survive_a_new_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileStore::new(&path);
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        store.set("other", "w").await.unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("v"));

        reopened.remove("k").await.unwrap();
        reopened.remove("missing").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.get("other").await.unwrap().as_deref(), Some("w"));
    }

    #[tokio::test]
    async fn writes_leave_only_the_target_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let (a, b) = (FileStore::new(&path), FileStore::new(&path));

        // Two instances share no lock, as if they were separate processes.
        let (x, y) = tokio::join!(a.set("a", "1"), b.set("b", "2"));
        x.unwrap();
        y.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);
        assert!(a.get("a").await.unwrap().is_some() || a.get("b").await.unwrap().is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn store_file_is_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let store = FileStore::new(&path);
        store.set("auth_token", "abc123").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn concurrent_writes_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));

        let (a, b) = tokio::join!(store.set("a", "1"), store.set("b", "2"));
        a.unwrap();
        b.unwrap();

        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn corrupt_file_fails_reads_but_not_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{oops").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get("k").await, Err(PortError::Storage(_))));

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    struct StaticTransport;

    #[async_trait]
    impl AuthTransport for StaticTransport {
        async fn sign_in(&self, email: &str, _password: &str) -> PortResult<SignInResponse> {
            Ok(SignInResponse {
                token: "abc123".into(),
                profile: UserProfile {
                    id: "u1".into(),
                    firstname: "A".into(),
                    lastname: "B".into(),
                    email: email.into(),
                    role: "student".into(),
                    account_type: "student".into(),
                    confirmed: true,
                    education: None,
                    image: None,
                    created_at: None,
                    updated_at: None,
                },
            })
        }

        async fn sign_out(&self, _token: &str) -> PortResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn session_persists_across_process_restarts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let first = SessionStore::new(Arc::new(FileStore::new(&path)), Arc::new(StaticTransport));
        first.initialize().await;
        first.sign_in("a@b.com", "pw").await.unwrap();

        let disk = FileStore::new(&path);
        assert_eq!(disk.get(TOKEN_KEY).await.unwrap().as_deref(), Some("abc123"));
        assert!(disk.get(USER_KEY).await.unwrap().is_some());

        let second = SessionStore::new(Arc::new(FileStore::new(&path)), Arc::new(StaticTransport));
        second.initialize().await;
        assert_eq!(second.status(), AuthStatus::Authenticated);

        second.sign_out().await.await.unwrap();
        assert_eq!(disk.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(disk.get(USER_KEY).await.unwrap(), None);
    }
}
