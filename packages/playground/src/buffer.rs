use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Position of an edit in the session. Strictly increasing, never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Revision(u64);

impl Revision {
    /// Before any edit
    pub const INITIAL: Revision = Revision(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Revision {
    fn from(value: u64) -> Self {
        Revision(value)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Revision source shared by every buffer of one session, so revisions are
/// unique across buffers as well as within one
#[derive(Debug, Clone, Default)]
pub struct EditClock(Arc<AtomicU64>);

impl EditClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> Revision {
        Revision(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Latest revision handed out
    pub fn current(&self) -> Revision {
        Revision(self.0.load(Ordering::SeqCst))
    }
}

/// An immutable value tagged with the revision that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub revision: Revision,
    pub value: T,
}

/// Snapshot of a text buffer
pub type SourceText = Versioned<Arc<str>>;

type ChangeListener<T> = Box<dyn Fn(&Versioned<T>) + Send + Sync>;

/// A mutable slot whose every write produces a new revision.
///
/// No validation happens here; listeners see each new snapshot synchronously.
pub struct EditableBuffer<T> {
    clock: EditClock,
    current: Versioned<T>,
    listeners: Vec<ChangeListener<T>>,
}

impl<T: Clone> EditableBuffer<T> {
    pub fn new(clock: EditClock, initial: T) -> Self {
        let revision = clock.tick();
        Self {
            clock,
            current: Versioned {
                revision,
                value: initial,
            },
            listeners: Vec::new(),
        }
    }

    /// Replace the content and notify listeners
    pub fn set(&mut self, value: T) -> Revision {
        self.current = Versioned {
            revision: self.clock.tick(),
            value,
        };
        self.notify();
        self.current.revision
    }

    /// Edit the content in place. Counts as a write even if nothing changed.
    pub fn update(&mut self, edit: impl FnOnce(&mut T)) -> Revision {
        let mut value = self.current.value.clone();
        edit(&mut value);
        self.set(value)
    }

    pub fn on_change(&mut self, listener: impl Fn(&Versioned<T>) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn snapshot(&self) -> Versioned<T> {
        self.current.clone()
    }

    pub fn get(&self) -> &T {
        &self.current.value
    }

    pub fn revision(&self) -> Revision {
        self.current.revision
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.current);
        }
    }
}

impl EditableBuffer<Arc<str>> {
    pub fn set_text(&mut self, text: impl Into<Arc<str>>) -> Revision {
        self.set(text.into())
    }

    pub fn text(&self) -> &str {
        &self.current.value
    }
}

impl<T: fmt::Debug> fmt::Debug for EditableBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableBuffer")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
