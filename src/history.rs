//! Bounded linear undo/redo over whole snapshots.

pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    snapshots: Vec<T>,
    index: usize,
    capacity: usize,
}

impl<T: Clone> HistoryStack<T> {
    pub fn new(initial: T) -> Self {
        Self::with_capacity(initial, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(initial: T, capacity: usize) -> Self {
        Self {
            snapshots: vec![initial],
            index: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn current(&self) -> &T {
        &self.snapshots[self.index]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    /// Records a new snapshot, discarding any redo entries and evicting the
    /// oldest snapshot once the stack is over capacity.
    pub fn push(&mut self, snapshot: T) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(snapshot);
        self.index = self.snapshots.len() - 1;

        if self.snapshots.len() > self.capacity {
            let overflow = self.snapshots.len() - self.capacity;
            self.snapshots.drain(..overflow);
            self.index -= overflow;
        }
    }

    pub fn undo(&mut self) -> &T {
        if self.can_undo() {
            self.index -= 1;
        } else {
            tracing::debug!("undo at oldest snapshot ignored");
        }
        self.current()
    }

    pub fn redo(&mut self) -> &T {
        if self.can_redo() {
            self.index += 1;
        } else {
            tracing::debug!("redo at newest snapshot ignored");
        }
        self.current()
    }

    /// Drops every snapshot except the current one.
    pub fn reset(&mut self, snapshot: T) {
        self.snapshots.clear();
        self.snapshots.push(snapshot);
        self.index = 0;
    }
}
