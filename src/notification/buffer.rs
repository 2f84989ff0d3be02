use std::fmt;
use std::io::{self, Cursor, Read};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, LazyLock, Mutex};

const MAX_POOLED: usize = 64;
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

static SHARED_POOL: LazyLock<BufferPool> = LazyLock::new(BufferPool::default);

/// A pool of reusable byte buffers for rendering notification bodies.
///
/// Buffers are handed out as [`PooledBuffer`] guards and go back to the pool
/// when the guard is dropped, so every exit path releases them.
#[derive(Default, Clone)]
pub struct BufferPool {
    free: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide pool used by notification encoders.
    pub fn shared() -> &'static BufferPool {
        &SHARED_POOL
    }

    pub fn acquire(&self) -> PooledBuffer {
        let buf = self
            .free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()
            .unwrap_or_default();
        PooledBuffer {
            buf,
            pool: self.clone(),
        }
    }

    /// Number of idle buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut free = self
            .free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if free.len() < MAX_POOLED {
            free.push(buf);
        }
    }
}

/// A buffer on loan from a [`BufferPool`].
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: BufferPool,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer").field("len", &self.len()).finish()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

/// Single-use byte stream over a signed notification.
///
/// Owns the pooled buffer holding the serialized body; the buffer returns to
/// its pool once the reader is dropped.
pub struct NotificationReader {
    inner: Cursor<PooledBuffer>,
}

impl NotificationReader {
    pub(crate) fn new(buf: PooledBuffer) -> Self {
        Self {
            inner: Cursor::new(buf),
        }
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        let read = usize::try_from(self.inner.position()).unwrap_or(usize::MAX);
        self.inner.get_ref().len().saturating_sub(read)
    }
}

impl Read for NotificationReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.inner.read(out)
    }
}

impl fmt::Debug for NotificationReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationReader")
            .field("len", &self.inner.get_ref().len())
            .field("pos", &self.inner.position())
            .finish()
    }
}
