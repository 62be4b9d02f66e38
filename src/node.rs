//! Node interfaces and the vocabulary they share.
//!
//! A node exposes two operation sets, one per execution context:
//!
//! - [`Node`] is the **control** interface. Hosts call it from a single
//!   non-real-time thread to bind I/O, negotiate a format and drive the
//!   lifecycle. It may log, allocate and call listeners.
//! - [`Process`] is the **real-time** interface. Hosts call it once per
//!   quantum from the audio thread. It never blocks, never allocates and never
//!   fails.
//!
//! The two halves of a node may run concurrently on different threads.

use core::fmt;

use crate::error::NodeError;
use crate::events::{ListenerId, NodeEvents, NodeInfo, PortInfo};
use crate::format::FormatParam;
use crate::io::{IoBinding, IoKind, Status};

/// Lifecycle of a node.
///
/// ```text
/// Created -> Configured -> Started <-> Suspended
///     \__________\______________\__________\____-> Destroyed
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum LifecycleState {
    /// No format negotiated
    Created = 0,
    /// Format negotiated, not running
    Configured = 1,
    /// Consuming buffers
    Started = 2,
    /// Stopped with configuration kept
    Suspended = 3,
    /// Torn down, terminal
    Destroyed = 4,
}

impl LifecycleState {
    pub(crate) fn from_u8(v: u8) -> LifecycleState {
        match v {
            1 => LifecycleState::Configured,
            2 => LifecycleState::Started,
            3 => LifecycleState::Suspended,
            4 => LifecycleState::Destroyed,
            _ => LifecycleState::Created,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Created => "created",
            LifecycleState::Configured => "configured",
            LifecycleState::Started => "started",
            LifecycleState::Suspended => "suspended",
            LifecycleState::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

/// Port direction
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Input,
    Output,
}

/// Commands a host can send to a node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Command {
    Suspend,
    Pause,
    Start,
    Enable,
    Disable,
    Flush,
    Drain,
    Marker,
    ParamBegin,
    ParamEnd,
    RequestProcess,
}

/// Parameter identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ParamId {
    /// Formats the node can accept
    EnumFormat,
    /// The negotiated format
    Format,
    Props,
    Buffers,
    Latency,
    PortConfig,
}

/// Control-context node operations.
///
/// Every method returns an explicit error to its caller. None of them may be
/// called from the real-time thread.
pub trait Node: Send {
    /// Register a listener. Listeners are notified in registration order.
    ///
    /// The new listener immediately receives the current node info and the
    /// info of every port.
    fn add_listener(&mut self, events: Box<dyn NodeEvents>) -> Result<ListenerId, NodeError>;

    /// Unregister a listener. Returns `false` if it was not registered.
    fn remove_listener(&mut self, id: ListenerId) -> bool;

    /// Current node info
    fn info(&self) -> &NodeInfo;

    /// Bind (`Some`) or unbind (`None`) an I/O area.
    ///
    /// A binding whose declared size or type doesn't match the kind is stored
    /// as "not bound" rather than rejected.
    fn set_io(&mut self, kind: IoKind, binding: Option<IoBinding>) -> Result<(), NodeError>;

    fn send_command(&mut self, command: Command) -> Result<(), NodeError>;

    /// Enumerate parameters of kind `id`, delivering each through the
    /// listeners' `result` callback tagged with `seq`.
    ///
    /// Returns the number of items produced.
    fn enum_params(&mut self, seq: i32, id: ParamId, start: u32, num: u32) -> Result<u32, NodeError>;

    /// Set (`Some`) or clear (`None`) a parameter
    fn set_param(&mut self, id: ParamId, param: Option<&FormatParam>) -> Result<(), NodeError>;

    /// Enumerate ports in `direction`, delivering them through `result`.
    fn enum_ports(&mut self, seq: i32, direction: Direction, start: u32, num: u32) -> Result<u32, NodeError>;

    fn port_info(&self, direction: Direction, port_id: u32) -> Result<&PortInfo, NodeError>;

    fn port_enum_params(
        &mut self,
        seq: i32,
        direction: Direction,
        port_id: u32,
        id: ParamId,
        start: u32,
        num: u32,
    ) -> Result<u32, NodeError>;

    fn port_set_param(
        &mut self,
        direction: Direction,
        port_id: u32,
        id: ParamId,
        param: Option<&FormatParam>,
    ) -> Result<(), NodeError>;

    fn port_set_io(
        &mut self,
        direction: Direction,
        port_id: u32,
        kind: IoKind,
        binding: Option<IoBinding>,
    ) -> Result<(), NodeError>;

    /// Tell the node how many buffers the host allocated for a port
    fn port_use_buffers(&mut self, direction: Direction, port_id: u32, n_buffers: u32) -> Result<(), NodeError>;

    /// Hand a buffer back to an output port. Sinks have nothing to recycle.
    fn port_reuse_buffer(&mut self, port_id: u32, buffer_id: u32) -> Result<(), NodeError>;

    /// Enumerate the formats this node can accept
    fn enumerate_formats(&mut self, seq: i32, start: u32, limit: u32) -> Result<u32, NodeError> {
        self.enum_params(seq, ParamId::EnumFormat, start, limit)
    }

    /// Negotiate (`Some`) or clear (`None`) the format
    fn set_format(&mut self, format: Option<&FormatParam>) -> Result<(), NodeError> {
        self.set_param(ParamId::Format, format)
    }
}

/// Real-time node operation.
///
/// Implementations must be wait-free and allocation-free. `&mut self` makes the
/// host's serialization of calls explicit: only one thread owns the processor.
pub trait Process: Send + 'static {
    /// Run one quantum. Anomalies degrade to a no-op; the status is always
    /// [`Status::OK`].
    fn process(&mut self) -> Status;
}
