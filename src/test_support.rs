//! Fake store clients for exercising failure paths the in-memory store
//! cannot produce.

use crate::services::storage_service::{StoreClient, WriteStream};
use bytes::Bytes;
use futures::future::BoxFuture;
use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Clone, Copy, Debug)]
pub enum FakeBehavior {
    Succeed,
    FailWrite,
    FailCommit,
    StallCommit(Duration),
}

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    aborts: AtomicUsize,
    commits: AtomicUsize,
    content_types: Mutex<Vec<String>>,
}

/// Records every call so tests can assert what reached the store.
pub struct FakeClient {
    behavior: FakeBehavior,
    counters: Arc<Counters>,
}

impl FakeClient {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            counters: Arc::default(),
        }
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> usize {
        self.counters.aborts.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub fn content_types(&self) -> Vec<String> {
        self.counters.content_types.lock().unwrap().clone()
    }
}

impl StoreClient for FakeClient {
    fn open(&self, _bucket: &str, _object_name: &str) -> io::Result<Box<dyn WriteStream>> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            behavior: self.behavior,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeStream {
    behavior: FakeBehavior,
    counters: Arc<Counters>,
}

impl WriteStream for FakeStream {
    fn set_content_type(&mut self, content_type: &str) {
        self.counters
            .content_types
            .lock()
            .unwrap()
            .push(content_type.to_string());
    }

    fn write(&mut self, _bytes: Bytes) -> BoxFuture<'_, io::Result<()>> {
        let behavior = self.behavior;
        Box::pin(async move {
            match behavior {
                FakeBehavior::FailWrite => Err(io::Error::other("connection reset by peer")),
                _ => Ok(()),
            }
        })
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, io::Result<()>> {
        Box::pin(async move {
            match self.behavior {
                FakeBehavior::FailCommit => return Err(io::Error::other("precondition failed")),
                FakeBehavior::StallCommit(delay) => tokio::time::sleep(delay).await,
                _ => {}
            }
            self.counters.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn abort(self: Box<Self>) -> BoxFuture<'static, io::Result<()>> {
        self.counters.aborts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}
