//! Host-owned I/O areas.
//!
//! The host allocates these and keeps them alive; a node only holds a shared
//! reference while bound. Every field the node and the host both touch during
//! a quantum is atomic, so neither side ever waits on the other.

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Sentinel for "no buffer" in [`IoBuffers::buffer_id`].
pub const ID_INVALID: u32 = u32::MAX;

/// Default upper bound on the number of buffers in an exchange table.
pub const MAX_BUFFERS: u32 = 16;

/// Kinds of I/O area a host can hand to a node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IoKind {
    Buffers,
    Range,
    Clock,
    Latency,
    Control,
    Notify,
    Position,
    RateMatch,
    Memory,
}

/// Processing status, shared through [`IoBuffers::status`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Status(pub i32);

impl Status {
    pub const OK: Status = Status(0);
    pub const NEED_DATA: Status = Status(1);
    pub const HAVE_DATA: Status = Status(2);
}

/// Valid region of a buffer's payload, written by the producer each cycle.
#[derive(Debug, Default)]
pub struct Chunk {
    offset: AtomicU32,
    size: AtomicU32,
    stride: AtomicI32,
}

impl Chunk {
    pub fn new(offset: u32, size: u32, stride: i32) -> Self {
        Self {
            offset: AtomicU32::new(offset),
            size: AtomicU32::new(size),
            stride: AtomicI32::new(stride),
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset.load(Ordering::Acquire)
    }

    /// Payload size in bytes
    #[inline]
    pub fn size(&self) -> u32 {
        self.size.load(Ordering::Acquire)
    }

    #[inline]
    pub fn stride(&self) -> i32 {
        self.stride.load(Ordering::Acquire)
    }

    pub fn set_offset(&self, offset: u32) {
        self.offset.store(offset, Ordering::Release);
    }

    pub fn set_size(&self, size: u32) {
        self.size.store(size, Ordering::Release);
    }

    pub fn set_stride(&self, stride: i32) {
        self.stride.store(stride, Ordering::Release);
    }
}

/// Describes one host buffer. Nodes read metadata only.
#[derive(Debug)]
pub struct BufferDescriptor {
    id: u32,
    max_size: u32,
    chunk: Option<Chunk>,
}

impl BufferDescriptor {
    /// A buffer of `max_size` bytes with chunk metadata initialised to empty
    pub fn new(id: u32, max_size: u32) -> Self {
        Self {
            id,
            max_size,
            chunk: Some(Chunk::default()),
        }
    }

    /// A buffer that carries no chunk metadata
    pub fn without_chunk(id: u32, max_size: u32) -> Self {
        Self {
            id,
            max_size,
            chunk: None,
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    #[inline]
    pub fn chunk(&self) -> Option<&Chunk> {
        self.chunk.as_ref()
    }
}

/// Buffer-exchange area: the pending buffer index plus the table it indexes.
///
/// The host writes a buffer index when data is ready; the consuming node sets it
/// back to [`ID_INVALID`] once it is done with that buffer.
pub struct IoBuffers {
    status: AtomicI32,
    buffer_id: AtomicU32,
    buffers: Box<[Option<BufferDescriptor>]>,
}

impl IoBuffers {
    /// Create an area over a buffer table. Empty slots are allowed.
    pub fn new(buffers: Vec<Option<BufferDescriptor>>) -> Self {
        Self {
            status: AtomicI32::new(Status::OK.0),
            buffer_id: AtomicU32::new(ID_INVALID),
            buffers: buffers.into_boxed_slice(),
        }
    }

    /// Create an area with `count` buffers of `max_size` bytes, ids `0..count`
    pub fn with_buffers(count: u32, max_size: u32) -> Self {
        Self::new((0..count).map(|id| Some(BufferDescriptor::new(id, max_size))).collect())
    }

    #[inline]
    pub fn buffer_id(&self) -> u32 {
        self.buffer_id.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_buffer_id(&self, id: u32) {
        self.buffer_id.store(id, Ordering::Release);
    }

    #[inline]
    pub fn status(&self) -> Status {
        Status(self.status.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set_status(&self, status: Status) {
        self.status.store(status.0, Ordering::Release);
    }

    /// Number of slots in the buffer table
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffers.len()
    }

    /// Resolve a slot. `None` for empty slots and out-of-range ids.
    #[inline]
    pub fn buffer(&self, id: u32) -> Option<&BufferDescriptor> {
        self.buffers.get(id as usize).and_then(Option::as_ref)
    }

    /// Host-side helper: set the chunk size of buffer `id` and mark it pending.
    ///
    /// Returns `false` if the slot is empty or has no chunk metadata.
    pub fn queue(&self, id: u32, size: u32) -> bool {
        match self.buffer(id).and_then(BufferDescriptor::chunk) {
            Some(chunk) => {
                chunk.set_size(size);
                self.set_status(Status::HAVE_DATA);
                self.set_buffer_id(id);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for IoBuffers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoBuffers")
            .field("status", &self.status())
            .field("buffer_id", &self.buffer_id())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Rate-matching area. Informational for a sink that never resamples.
#[derive(Debug, Default)]
pub struct RateMatch {
    delay: AtomicI32,
    size: AtomicU32,
    rate_bits: AtomicU64,
    flags: AtomicU32,
}

impl RateMatch {
    pub fn new() -> Self {
        let rm = Self::default();
        rm.set_rate(1.0);
        rm
    }

    pub fn delay(&self) -> i32 {
        self.delay.load(Ordering::Relaxed)
    }

    pub fn set_delay(&self, delay: i32) {
        self.delay.store(delay, Ordering::Relaxed);
    }

    /// Requested quantum size in frames
    pub fn size(&self) -> u32 {
        self.size.load(Ordering::Relaxed)
    }

    pub fn set_size(&self, size: u32) {
        self.size.store(size, Ordering::Relaxed);
    }

    /// Resampling ratio requested by the driver
    pub fn rate(&self) -> f64 {
        f64::from_bits(self.rate_bits.load(Ordering::Relaxed))
    }

    pub fn set_rate(&self, rate: f64) {
        self.rate_bits.store(rate.to_bits(), Ordering::Relaxed);
    }

    pub fn flags(&self) -> u32 {
        self.flags.load(Ordering::Relaxed)
    }

    pub fn set_flags(&self, flags: u32) {
        self.flags.store(flags, Ordering::Relaxed);
    }
}

/// A host area offered to a node, with the size the host claims for it.
///
/// The area is type-erased the way a host would pass an untyped region; the
/// node checks both the declared size and the concrete type before using it.
#[derive(Clone)]
pub struct IoBinding {
    area: Arc<dyn Any + Send + Sync>,
    size: usize,
}

impl IoBinding {
    /// Offer `area`, declaring its full size
    pub fn new<T: Any + Send + Sync>(area: Arc<T>) -> Self {
        Self {
            area,
            size: core::mem::size_of::<T>(),
        }
    }

    /// Override the declared size
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The area as `T`, if it is one and the declared size covers a `T`
    pub(crate) fn resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        if self.size < core::mem::size_of::<T>() {
            return None;
        }
        Arc::clone(&self.area).downcast::<T>().ok()
    }
}

impl fmt::Debug for IoBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoBinding").field("size", &self.size).finish()
    }
}
