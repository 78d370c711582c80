use crate::domain::model::{DigitalObject, ObjectId, RegistryKey, RegistryRecord};
use crate::domain::ports::{ObjectStore, PiRegistry, StoreTransaction, UnitOfWork};
use crate::utils::error::{CorrecterError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const OBJECTS_DIR: &str = "objects";
const REGISTRY_FILE: &str = "pi_registry.json";
const STAGING_SUFFIX: &str = "staged";

/// Directory-backed store.
///
/// ```text
/// <base>/objects/<objectId>.json
/// <base>/pi_registry.json
/// ```
#[derive(Debug, Clone)]
pub struct LocalRepository {
    base_path: PathBuf,
}

impl LocalRepository {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Like `new`, but the base directory has to exist already.
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        if !base_path.is_dir() {
            return Err(CorrecterError::StorageError {
                message: format!("data directory {} does not exist", base_path.display()),
            });
        }
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.base_path
            .join(OBJECTS_DIR)
            .join(format!("{}.json", id))
    }

    pub fn registry_path(&self) -> PathBuf {
        self.base_path.join(REGISTRY_FILE)
    }

    pub async fn load_registry(&self) -> Result<Vec<RegistryRecord>> {
        let path = self.registry_path();
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalRepository {
    async fn exists(&self, id: &ObjectId) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.object_path(id)).await?)
    }

    async fn retrieve(&self, id: &ObjectId) -> Result<DigitalObject> {
        let path = self.object_path(id);
        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CorrecterError::ObjectNotFound {
                    object_id: id.to_string(),
                }
            } else {
                e.into()
            }
        })?;
        let object: DigitalObject = serde_json::from_slice(&data)?;

        if &object.id != id {
            return Err(CorrecterError::StorageError {
                message: format!("{} holds object {}", path.display(), object.id),
            });
        }
        Ok(object)
    }
}

#[async_trait]
impl PiRegistry for LocalRepository {
    async fn get(
        &self,
        service: &str,
        object_id: &ObjectId,
        additional: &str,
    ) -> Result<Option<RegistryRecord>> {
        Ok(self.load_registry().await?.into_iter().find(|record| {
            record.service == service
                && &record.mycore_id == object_id
                && record.additional == additional
        }))
    }
}

#[async_trait]
impl UnitOfWork for LocalRepository {
    type Transaction = LocalTransaction;

    async fn begin(&self) -> Result<LocalTransaction> {
        let registry = self.load_registry().await?;
        Ok(LocalTransaction {
            repository: self.clone(),
            registry,
            registry_dirty: false,
            objects: Vec::new(),
        })
    }
}

/// Buffers every write until `commit`.
#[derive(Debug)]
pub struct LocalTransaction {
    repository: LocalRepository,
    registry: Vec<RegistryRecord>,
    registry_dirty: bool,
    objects: Vec<DigitalObject>,
}

impl LocalTransaction {
    fn next_row_id(&self) -> u64 {
        self.registry
            .iter()
            .filter_map(|record| record.id)
            .max()
            .map_or(1, |id| id + 1)
    }
}

fn staged_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".");
    staged.push(STAGING_SUFFIX);
    PathBuf::from(staged)
}

async fn stage(path: &Path, data: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let staged = staged_path(path);
    if let Err(e) = tokio::fs::write(&staged, data).await {
        let _ = tokio::fs::remove_file(&staged).await;
        return Err(e.into());
    }
    Ok(staged)
}

async fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        match tokio::fs::remove_file(tmp).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not remove staged file {}: {}", tmp.display(), e),
        }
    }
}

/// Previous content of a committed file; `None` if the file was new.
async fn snapshot(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Puts already replaced files back, newest first.
async fn roll_back(applied: &[(PathBuf, Option<Vec<u8>>)]) {
    for (path, previous) in applied.iter().rev() {
        let restored = match previous {
            Some(data) => match stage(path, data).await {
                Ok(tmp) => tokio::fs::rename(&tmp, path).await.map_err(CorrecterError::from),
                Err(e) => Err(e),
            },
            None => tokio::fs::remove_file(path).await.map_err(CorrecterError::from),
        };
        if let Err(e) = restored {
            tracing::error!("Could not roll back {}: {}", path.display(), e);
        }
    }
}

async fn apply(staged: &[(PathBuf, PathBuf)]) -> Result<()> {
    let mut applied = Vec::with_capacity(staged.len());
    for (tmp, path) in staged {
        let replaced = match snapshot(path).await {
            Ok(previous) => tokio::fs::rename(tmp, path)
                .await
                .map(|()| previous)
                .map_err(CorrecterError::from),
            Err(e) => Err(e),
        };
        match replaced {
            Ok(previous) => applied.push((path.clone(), previous)),
            Err(e) => {
                tracing::warn!("Commit failed at {}, rolling back: {}", path.display(), e);
                roll_back(&applied).await;
                return Err(e);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl StoreTransaction for LocalTransaction {
    async fn save(&mut self, object: &DigitalObject) -> Result<()> {
        self.objects.retain(|pending| pending.id != object.id);
        self.objects.push(object.clone());
        Ok(())
    }

    async fn delete(&mut self, key: &RegistryKey) -> Result<bool> {
        let before = self.registry.len();
        self.registry.retain(|record| !record.matches(key));
        let removed = self.registry.len() != before;
        self.registry_dirty |= removed;
        Ok(removed)
    }

    async fn insert(&mut self, mut record: RegistryRecord) -> Result<()> {
        if self.registry.iter().any(|existing| existing.matches(&record.key())) {
            return Err(CorrecterError::StorageError {
                message: format!(
                    "registry already holds a {} record for {}",
                    record.service, record.mycore_id
                ),
            });
        }
        record.id = Some(self.next_row_id());
        self.registry.push(record);
        self.registry_dirty = true;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        // 先寫入暫存檔，全部成功後才覆蓋正式檔案；失敗時還原已覆蓋的檔案
        let mut staged = Vec::new();

        // registry goes last so a record never lands before its object
        let mut writes = Vec::new();
        for object in &self.objects {
            writes.push((
                self.repository.object_path(&object.id),
                serde_json::to_vec_pretty(object)?,
            ));
        }
        if self.registry_dirty {
            writes.push((
                self.repository.registry_path(),
                serde_json::to_vec_pretty(&self.registry)?,
            ));
        }

        for (path, data) in writes {
            match stage(&path, &data).await {
                Ok(tmp) => staged.push((tmp, path)),
                Err(e) => {
                    discard(&staged).await;
                    return Err(e);
                }
            }
        }

        let applied = apply(&staged).await;
        discard(&staged).await;
        applied?;

        tracing::debug!(
            "Committed {} object(s) to {}",
            self.objects.len(),
            self.repository.base_path().display()
        );
        Ok(())
    }
}
