use std::path::Path;

use tokio::sync::{mpsc, oneshot};

use marquee_core::error::CoreError;
use marquee_core::models::WatchEntry;
use marquee_core::storage::Storage;

type Reply<T> = oneshot::Sender<Result<T, CoreError>>;

/// Handle to the storage thread. Cheap to clone.
#[derive(Clone)]
pub struct DbHandle {
    tx: mpsc::UnboundedSender<DbCommand>,
}

enum DbCommand {
    SaveToken {
        service: String,
        token: String,
        reply: Reply<()>,
    },
    GetToken {
        service: String,
        reply: Reply<Option<String>>,
    },
    ClearToken {
        service: String,
        reply: Reply<()>,
    },
    RecordProgress {
        entry: WatchEntry,
        reply: Reply<()>,
    },
    RecentHistory {
        limit: usize,
        reply: Reply<Vec<WatchEntry>>,
    },
    GetHistory {
        media_id: u32,
        reply: Reply<Option<WatchEntry>>,
    },
    RemoveHistory {
        media_id: u32,
        reply: Reply<bool>,
    },
    SetIntent {
        key: String,
        value: String,
        reply: Reply<()>,
    },
    TakeIntent {
        key: String,
        reply: Reply<Option<String>>,
    },
}

impl DbHandle {
    pub fn open(path: &Path) -> Option<Self> {
        let storage = Storage::open(path)
            .map_err(|e| tracing::error!("Failed to open database: {e}"))
            .ok()?;
        Self::spawn(storage)
    }

    /// In-memory database, for tests and throwaway sessions.
    pub fn open_memory() -> Option<Self> {
        let storage = Storage::open_memory()
            .map_err(|e| tracing::error!("Failed to open in-memory database: {e}"))
            .ok()?;
        Self::spawn(storage)
    }

    fn spawn(storage: Storage) -> Option<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("db-actor".into())
            .spawn(move || actor_loop(storage, rx))
            .map_err(|e| tracing::error!("Failed to spawn DB thread: {e}"))
            .ok()?;

        Some(Self { tx })
    }

    async fn call<T>(&self, command: impl FnOnce(Reply<T>) -> DbCommand) -> Result<T, CoreError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(command(reply));
        rx.await
            .unwrap_or_else(|_| Err(CoreError::Config("DB actor closed".into())))
    }

    pub async fn save_token(&self, service: &str, token: String) -> Result<(), CoreError> {
        let service = service.to_string();
        self.call(|reply| DbCommand::SaveToken {
            service,
            token,
            reply,
        })
        .await
    }

    pub async fn get_token(&self, service: &str) -> Result<Option<String>, CoreError> {
        let service = service.to_string();
        self.call(|reply| DbCommand::GetToken { service, reply })
            .await
    }

    pub async fn clear_token(&self, service: &str) -> Result<(), CoreError> {
        let service = service.to_string();
        self.call(|reply| DbCommand::ClearToken { service, reply })
            .await
    }

    pub async fn record_progress(&self, entry: WatchEntry) -> Result<(), CoreError> {
        self.call(|reply| DbCommand::RecordProgress { entry, reply })
            .await
    }

    pub async fn recent_history(&self, limit: usize) -> Result<Vec<WatchEntry>, CoreError> {
        self.call(|reply| DbCommand::RecentHistory { limit, reply })
            .await
    }

    pub async fn get_history(&self, media_id: u32) -> Result<Option<WatchEntry>, CoreError> {
        self.call(|reply| DbCommand::GetHistory { media_id, reply })
            .await
    }

    pub async fn remove_history(&self, media_id: u32) -> Result<bool, CoreError> {
        self.call(|reply| DbCommand::RemoveHistory { media_id, reply })
            .await
    }

    pub async fn set_intent(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let key = key.to_string();
        let value = value.to_string();
        self.call(|reply| DbCommand::SetIntent { key, value, reply })
            .await
    }

    pub async fn take_intent(&self, key: &str) -> Result<Option<String>, CoreError> {
        let key = key.to_string();
        self.call(|reply| DbCommand::TakeIntent { key, reply })
            .await
    }
}

fn actor_loop(mut storage: Storage, mut rx: mpsc::UnboundedReceiver<DbCommand>) {
    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            DbCommand::SaveToken {
                service,
                token,
                reply,
            } => {
                let _ = reply.send(storage.save_token(&service, &token));
            }
            DbCommand::GetToken { service, reply } => {
                let _ = reply.send(storage.get_token(&service));
            }
            DbCommand::ClearToken { service, reply } => {
                let _ = reply.send(storage.clear_token(&service));
            }
            DbCommand::RecordProgress { entry, reply } => {
                let _ = reply.send(storage.record_progress(&entry));
            }
            DbCommand::RecentHistory { limit, reply } => {
                let _ = reply.send(storage.recent_history(limit));
            }
            DbCommand::GetHistory { media_id, reply } => {
                let _ = reply.send(storage.get_history(media_id));
            }
            DbCommand::RemoveHistory { media_id, reply } => {
                let _ = reply.send(storage.remove_history(media_id));
            }
            DbCommand::SetIntent { key, value, reply } => {
                let _ = reply.send(storage.set_intent(&key, &value));
            }
            DbCommand::TakeIntent { key, reply } => {
                let _ = reply.send(storage.take_intent(&key));
            }
        }
    }
    tracing::debug!("DB actor stopped");
}

#[cfg(test)]
mod tests {
    use marquee_core::storage::SESSION_SERVICE;

    use super::*;

    #[tokio::test]
    async fn test_token_through_actor() {
        let db = DbHandle::open_memory().unwrap();
        db.save_token(SESSION_SERVICE, "a.b.c".into()).await.unwrap();
        assert_eq!(
            db.get_token(SESSION_SERVICE).await.unwrap().as_deref(),
            Some("a.b.c")
        );
        db.clear_token(SESSION_SERVICE).await.unwrap();
        assert_eq!(db.get_token(SESSION_SERVICE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_intent_taken_once() {
        let db = DbHandle::open_memory().unwrap();
        db.set_intent("redirect_after_login", "/subscription")
            .await
            .unwrap();
        assert_eq!(
            db.take_intent("redirect_after_login").await.unwrap().as_deref(),
            Some("/subscription")
        );
        assert_eq!(db.take_intent("redirect_after_login").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_one_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbHandle::open(&dir.path().join("marquee.db")).unwrap();
        let other = db.clone();
        db.save_token(SESSION_SERVICE, "shared.tok.en".into())
            .await
            .unwrap();
        assert_eq!(
            other.get_token(SESSION_SERVICE).await.unwrap().as_deref(),
            Some("shared.tok.en")
        );
    }
}
