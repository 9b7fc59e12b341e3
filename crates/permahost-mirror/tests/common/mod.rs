//! Shared fixtures for mirror pipeline tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use permahost_core::Link;
use permahost_mirror::{
    MirrorError, MirrorExecutor, MirrorOutcome, MirrorStep, SyncEngine, SyncOptions,
};
use permahost_store::RepoStore;
use tempfile::TempDir;

type Scripted = Result<MirrorOutcome, String>;

struct Script {
    default: Scripted,
    per_link: HashMap<String, Scripted>,
    queued: VecDeque<MirrorOutcome>,
    delay: Option<Duration>,
    fail_unpin: bool,
    unpinned: Vec<String>,
    discarded: Vec<String>,
}

/// A mirror executor whose outcomes are set by the test.
pub struct ScriptedMirror {
    script: Mutex<Script>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedMirror {
    /// Every mirror run succeeds with `content_hash` until told otherwise.
    pub fn new(content_hash: &str) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script {
                default: Ok(outcome(content_hash)),
                per_link: HashMap::new(),
                queued: VecDeque::new(),
                delay: None,
                fail_unpin: false,
                unpinned: Vec::new(),
                discarded: Vec::new(),
            }),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn succeed_with(&self, content_hash: &str) {
        self.script.lock().default = Ok(outcome(content_hash));
    }

    pub fn fail_with(&self, message: &str) {
        self.script.lock().default = Err(message.to_string());
    }

    pub fn fail_link(&self, link: &str, message: &str) {
        self.script
            .lock()
            .per_link
            .insert(link.to_string(), Err(message.to_string()));
    }

    /// Outcomes returned by the next runs, in order, before the default.
    pub fn queue(&self, outcomes: impl IntoIterator<Item = MirrorOutcome>) {
        self.script.lock().queued.extend(outcomes);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.script.lock().delay = Some(delay);
    }

    pub fn fail_unpins(&self) {
        self.script.lock().fail_unpin = true;
    }

    pub fn unpinned(&self) -> Vec<String> {
        self.script.lock().unpinned.clone()
    }

    pub fn discarded(&self) -> Vec<String> {
        self.script.lock().discarded.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MirrorExecutor for ScriptedMirror {
    async fn mirror(&self, link: &str) -> Result<MirrorOutcome, MirrorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.script.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let result = {
            let mut script = self.script.lock();
            match script.per_link.get(link) {
                Some(result) => result.clone(),
                None => match script.queued.pop_front() {
                    Some(queued) => Ok(queued),
                    None => script.default.clone(),
                },
            }
        };

        result.map_err(|stderr| MirrorError::Command {
            step: MirrorStep::Pin,
            program: "ipfs-cluster-ctl".to_string(),
            status: "exit status: 1".to_string(),
            stderr,
        })
    }

    async fn unpin(&self, content_hash: &str) -> Result<(), MirrorError> {
        let mut script = self.script.lock();
        script.unpinned.push(content_hash.to_string());
        if script.fail_unpin {
            return Err(MirrorError::Timeout {
                step: MirrorStep::Unpin,
                seconds: 1,
            });
        }
        Ok(())
    }

    async fn discard(&self, link: &str) -> Result<(), MirrorError> {
        self.script.lock().discarded.push(link.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn outcome(content_hash: &str) -> MirrorOutcome {
    MirrorOutcome {
        content_hash: content_hash.to_string(),
        commit: Some(format!("commit-of-{content_hash}")),
        name: None,
    }
}

pub fn link(s: &str) -> Link {
    Link::parse(s).unwrap()
}

/// An engine over a fresh store in a temporary directory.
pub fn engine(mirror: Arc<ScriptedMirror>, options: SyncOptions) -> (TempDir, Arc<SyncEngine>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RepoStore::open(dir.path()).unwrap());
    (dir, Arc::new(SyncEngine::new(store, mirror, options)))
}
