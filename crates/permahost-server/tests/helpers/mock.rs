//! In-memory mirror and app fixture.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use permahost_mirror::{
    MirrorError, MirrorExecutor, MirrorOutcome, MirrorStep, RefreshScheduler, SyncEngine,
    SyncOptions,
};
use permahost_server::{AppState, create_router};
use permahost_store::RepoStore;
use tempfile::TempDir;

use super::TestClient;

/// Mirror executor returning queued outcomes, then a fixed one.
pub struct FakeMirror {
    queued: Mutex<VecDeque<Result<String, String>>>,
    default: Mutex<Result<String, String>>,
    unpinned: Mutex<Vec<String>>,
    fail_unpin: Mutex<bool>,
}

impl FakeMirror {
    pub fn new(content_hash: &str) -> Arc<Self> {
        Arc::new(Self {
            queued: Mutex::new(VecDeque::new()),
            default: Mutex::new(Ok(content_hash.to_string())),
            unpinned: Mutex::new(Vec::new()),
            fail_unpin: Mutex::new(false),
        })
    }

    pub fn succeed_with(&self, content_hash: &str) {
        *self.default.lock() = Ok(content_hash.to_string());
    }

    pub fn fail_with(&self, message: &str) {
        *self.default.lock() = Err(message.to_string());
    }

    pub fn then(&self, result: Result<&str, &str>) {
        self.queued
            .lock()
            .push_back(result.map(String::from).map_err(String::from));
    }

    pub fn fail_unpins(&self) {
        *self.fail_unpin.lock() = true;
    }

    pub fn unpinned(&self) -> Vec<String> {
        self.unpinned.lock().clone()
    }
}

#[async_trait]
impl MirrorExecutor for FakeMirror {
    async fn mirror(&self, _link: &str) -> Result<MirrorOutcome, MirrorError> {
        let next = self.queued.lock().pop_front();
        let result = next.unwrap_or_else(|| self.default.lock().clone());

        result
            .map(MirrorOutcome::new)
            .map_err(|stderr| MirrorError::Command {
                step: MirrorStep::Clone,
                program: "git".to_string(),
                status: "exit status: 128".to_string(),
                stderr,
            })
    }

    async fn unpin(&self, content_hash: &str) -> Result<(), MirrorError> {
        self.unpinned.lock().push(content_hash.to_string());
        if *self.fail_unpin.lock() {
            return Err(MirrorError::Timeout {
                step: MirrorStep::Unpin,
                seconds: 600,
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// A router over a temporary store, with handles on its parts.
pub struct TestApp {
    pub client: TestClient,
    pub mirror: Arc<FakeMirror>,
    pub engine: Arc<SyncEngine>,
    _dir: TempDir,
}

impl TestApp {
    /// Runs one refresh pass over every tracked repository.
    pub async fn refresh(&self) {
        RefreshScheduler::with_defaults(Arc::clone(&self.engine))
            .refresh_all()
            .await;
    }
}

pub fn app() -> TestApp {
    app_with(FakeMirror::new("Qm123"))
}

pub fn app_with(mirror: Arc<FakeMirror>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RepoStore::open(dir.path()).unwrap());
    let engine = Arc::new(SyncEngine::new(
        store,
        mirror.clone(),
        SyncOptions::default(),
    ));

    TestApp {
        client: TestClient::new(create_router(AppState::new(Arc::clone(&engine)))),
        mirror,
        engine,
        _dir: dir,
    }
}
