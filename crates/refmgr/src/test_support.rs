//! In-memory runtime for unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use parking_lot::Mutex;
use crate::config::DirectoryLocation;
use crate::descriptor::EndpointDescriptor;
use crate::error::{RefError, Result};
use crate::runtime::{NamingDirectory, ObjectRuntime, RuntimeFactory};

#[derive(Default)]
struct MockState {
    bindings: Mutex<HashMap<(String, String), String>>,
    bad_descriptors: Mutex<HashSet<String>>,
    released: Mutex<HashMap<u64, usize>>,
    next_handle: AtomicU64,
    created: AtomicUsize,
    shutdowns: AtomicUsize,
    directory_opens: AtomicUsize,
    directory_closes: AtomicUsize,
    resolves: AtomicUsize,
    fail_init: AtomicBool,
    fail_shutdown: AtomicBool,
    fail_release: AtomicBool,
    fail_close: AtomicBool,
    unreachable: AtomicBool,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockHandle {
    pub id: u64,
    pub descriptor: EndpointDescriptor,
}

pub struct MockDirectory {
    state: Arc<MockState>,
}

impl NamingDirectory for MockDirectory {
    fn resolve(&self, context: &str, leaf: &str) -> Result<EndpointDescriptor> {
        self.state.resolves.fetch_add(1, Ordering::SeqCst);
        self.state
            .bindings
            .lock()
            .get(&(context.to_string(), leaf.to_string()))
            .map(|d| EndpointDescriptor::new(d.clone()))
            .ok_or_else(|| {
                RefError::Naming(naming::NamingError::NotFound(format!("{}/{}", context, leaf)))
            })
    }

    fn close(self) -> Result<()> {
        self.state.directory_closes.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(RefError::Release("directory close refused".into()));
        }
        Ok(())
    }
}

pub struct MockRuntime {
    state: Arc<MockState>,
}

impl ObjectRuntime for MockRuntime {
    type Handle = MockHandle;
    type Directory = MockDirectory;

    fn open_directory(&self, location: &DirectoryLocation) -> Result<MockDirectory> {
        if self.state.unreachable.load(Ordering::SeqCst) {
            return Err(RefError::DirectoryUnavailable {
                location: location.to_string(),
                reason: "connection refused".into(),
            });
        }
        self.state.directory_opens.fetch_add(1, Ordering::SeqCst);
        Ok(MockDirectory {
            state: Arc::clone(&self.state),
        })
    }

    fn endpoint_to_handle(&self, descriptor: &EndpointDescriptor) -> Result<MockHandle> {
        if self.state.bad_descriptors.lock().contains(descriptor.as_str()) {
            return Err(RefError::InvalidDescriptor(descriptor.to_string()));
        }
        self.state.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockHandle {
            id: self.state.next_handle.fetch_add(1, Ordering::SeqCst),
            descriptor: descriptor.clone(),
        })
    }

    fn release(&self, handle: MockHandle) -> Result<()> {
        *self.state.released.lock().entry(handle.id).or_insert(0) += 1;
        if self.state.fail_release.load(Ordering::SeqCst) {
            return Err(RefError::Release(format!("handle {} refused", handle.id)));
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        self.state.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_shutdown.load(Ordering::SeqCst) {
            return Err(RefError::Release("shutdown refused".into()));
        }
        Ok(())
    }
}

/// Factory producing [`MockRuntime`]s that share one observable state
#[derive(Clone, Default)]
pub struct MockFactory {
    state: Arc<MockState>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binding(self, context: &str, leaf: &str, descriptor: &str) -> Self {
        self.state
            .bindings
            .lock()
            .insert((context.to_string(), leaf.to_string()), descriptor.to_string());
        self
    }

    pub fn bad_descriptor(self, descriptor: &str) -> Self {
        self.state.bad_descriptors.lock().insert(descriptor.to_string());
        self
    }

    pub fn failing_init(self) -> Self {
        self.state.fail_init.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_shutdown(self) -> Self {
        self.state.fail_shutdown.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_release(self) -> Self {
        self.state.fail_release.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_close(self) -> Self {
        self.state.fail_close.store(true, Ordering::SeqCst);
        self
    }

    pub fn unreachable(self) -> Self {
        self.state.unreachable.store(true, Ordering::SeqCst);
        self
    }

    pub fn unbind(&self, context: &str, leaf: &str) {
        self.state
            .bindings
            .lock()
            .remove(&(context.to_string(), leaf.to_string()));
    }

    pub fn created(&self) -> usize {
        self.state.created.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.state.shutdowns.load(Ordering::SeqCst)
    }

    pub fn resolves(&self) -> usize {
        self.state.resolves.load(Ordering::SeqCst)
    }

    pub fn directory_opens(&self) -> usize {
        self.state.directory_opens.load(Ordering::SeqCst)
    }

    pub fn directory_closes(&self) -> usize {
        self.state.directory_closes.load(Ordering::SeqCst)
    }

    /// Number of distinct handles released
    pub fn released(&self) -> usize {
        self.state.released.lock().len()
    }

    /// Every created handle was released, and none more than once
    pub fn all_released_once(&self) -> bool {
        let released = self.state.released.lock();
        released.len() == self.created() && released.values().all(|n| *n == 1)
    }
}

impl RuntimeFactory for MockFactory {
    type Runtime = MockRuntime;

    fn init(&self) -> Result<MockRuntime> {
        if self.state.fail_init.load(Ordering::SeqCst) {
            return Err(RefError::RuntimeInitFailed("mock runtime refused to start".into()));
        }
        Ok(MockRuntime {
            state: Arc::clone(&self.state),
        })
    }
}

/// Buffer collecting formatted log lines
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with every event on this thread formatted into the buffer
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        let buf = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || buf.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buf.lock())
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Number of lines containing `needle`
    pub fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }

    /// Number of lines at `level` containing `needle`
    pub fn count_at(&self, level: &str, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|l| l.contains(level) && l.contains(needle))
            .count()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
