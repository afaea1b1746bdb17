use crossbeam_channel::{bounded, Receiver, Sender};

/// Counting semaphore over a bounded channel: a slot is taken by sending a
/// token and given back by receiving one.
#[derive(Debug)]
pub struct Gate {
    sender: Sender<()>,
    receiver: Receiver<()>,
    capacity: usize,
}

/// A held slot of a [Gate], released on drop.
#[derive(Debug)]
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct Permit<'a> {
    gate: &'a Gate,
}

impl Gate {
    /// `capacity` must be nonzero, a zero capacity channel never buffers a
    /// token and every [Gate::try_acquire] would fail.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held.
    pub fn in_use(&self) -> usize {
        self.sender.len()
    }

    /// Takes a slot if one is free, without waiting.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        self.sender.try_send(()).ok().map(|_| Permit { gate: self })
    }

    /// Takes a slot, waiting for one to be released if the gate is full.
    pub fn acquire(&self) -> Permit<'_> {
        // the gate owns the receiver, the channel cannot be disconnected
        let _ = self.sender.send(());
        Permit { gate: self }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let _ = self.gate.receiver.try_recv();
    }
}

/// Admission pool and concurrency gate of one pipeline.
#[derive(Debug)]
pub struct RequestPool {
    admission: Gate,
    running: Gate,
}

/// Both slots of an admitted, running request. Fields drop in declaration
/// order, so the running slot is freed before the admission slot.
#[derive(Debug)]
pub struct RequestPermit<'a> {
    _running: Permit<'a>,
    _admission: Permit<'a>,
}

impl RequestPool {
    pub fn new(pool_size: usize, max_concurrent: usize) -> Self {
        Self {
            admission: Gate::new(pool_size),
            running: Gate::new(max_concurrent),
        }
    }

    pub fn admission(&self) -> &Gate {
        &self.admission
    }

    pub fn running(&self) -> &Gate {
        &self.running
    }

    /// Non-blocking admission into the pool.
    pub fn try_admit(&self) -> Option<Permit<'_>> {
        self.admission.try_acquire()
    }

    /// Waits for a running slot for an admitted request.
    pub fn run<'a>(&'a self, admission: Permit<'a>) -> RequestPermit<'a> {
        RequestPermit {
            _running: self.running.acquire(),
            _admission: admission,
        }
    }
}
