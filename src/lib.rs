//! A null audio sink for real-time audio graphs.
//!
//! The sink takes part in everything a graph node is expected to do (discovery
//! through a factory, format negotiation, I/O binding, lifecycle commands and
//! listener notifications) and then drops every buffer it is handed.
//!
//! Design principles:
//! - Control and audio threads get separate objects: [`SinkNode`] implements the
//!   control interface [`Node`], [`SinkProcessor`] implements [`Process`]
//! - No locks and no allocation on the audio thread; control changes reach it
//!   through atomics
//! - The processing step never fails; anomalies become queued reports that the
//!   control side logs with `tracing`
//! - I/O areas and buffers belong to the host; the node only borrows them

pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod io;
pub mod node;
pub mod plugin;
pub mod sink;

pub use config::SinkConfig;
pub use error::{ErrorKind, FactoryError, FormatError, NodeError};
pub use events::{ListenerId, Listeners, NodeEvents, NodeInfo, NodeResult, ParamInfo, PortInfo};
pub use format::{
    AudioFormat, AudioInfoRaw, FormatParam, MediaSubtype, MediaType, SampleFormat, ASSUMED_SAMPLE_WIDTH,
    MAX_CHANNELS, MAX_RATE,
};
pub use io::{BufferDescriptor, Chunk, IoBinding, IoBuffers, IoKind, RateMatch, Status, ID_INVALID, MAX_BUFFERS};
pub use node::{Command, Direction, LifecycleState, Node, ParamId, Process};
pub use plugin::{
    enum_factory, find_factory, Dict, Handle, HandleFactory, MonotonicSystem, NullSinkFactory, NullSinkHandle,
    Support, SupportItem, System, FACTORY_NULL_SINK, INTERFACE_NODE,
};
pub use sink::{SinkNode, SinkProcessor, StatsSnapshot, ADVERTISED_FORMAT};
