//! The null sink: a single-input node that consumes buffers and drops them.
//!
//! [`SinkNode::new`] returns the node split in two, like the two ends of a ring
//! buffer:
//!
//! - [`SinkNode`] stays on the control thread and implements [`Node`].
//! - [`SinkProcessor`] moves to the audio thread and implements [`Process`](crate::Process).
//!
//! They share lifecycle state and format through atomics. Buffer-area bindings
//! travel to the processor over a ring buffer and replaced areas come back the
//! same way, so control changes show up on the audio thread without either side
//! waiting and the audio thread never drops the last reference to anything. The
//! processor never logs; it queues [`Report`]s that the control half logs on
//! its next operation or on [`SinkNode::drain_reports`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use null_sink::{
//!     AudioInfoRaw, Command, FormatParam, IoBinding, IoBuffers, IoKind, MonotonicSystem, Node,
//!     Process, SampleFormat, SinkConfig, SinkNode, ID_INVALID,
//! };
//!
//! let (mut node, mut processor) = SinkNode::new(
//!     SinkConfig::default(),
//!     tracing::Dispatch::none(),
//!     Arc::new(MonotonicSystem::new()),
//! );
//!
//! let io = Arc::new(IoBuffers::with_buffers(4, 8192));
//! node.set_io(IoKind::Buffers, Some(IoBinding::new(io.clone()))).unwrap();
//! node.set_format(Some(&FormatParam::audio_raw(AudioInfoRaw::new(SampleFormat::F32, 2, 48000))))
//!     .unwrap();
//! node.send_command(Command::Start).unwrap();
//!
//! io.queue(0, 4096);
//! processor.process();
//!
//! assert_eq!(node.stats().frames, 512);
//! assert_eq!(io.buffer_id(), ID_INVALID);
//! ```

mod processor;
mod shared;

use std::sync::Arc;
use std::time::Duration;

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, error, info, trace, warn, Dispatch};

use crate::config::SinkConfig;
use crate::error::NodeError;
use crate::events::{ListenerId, Listeners, NodeEvents, NodeInfo, NodeResult, ParamInfo, PortInfo};
use crate::format::{AudioFormat, AudioInfoRaw, FormatParam, SampleFormat};
use crate::io::{IoBinding, IoBuffers, IoKind, RateMatch};
use crate::node::{Command, Direction, LifecycleState, Node, ParamId};
use crate::plugin::System;

pub use processor::SinkProcessor;
pub(crate) use shared::Report;
pub use shared::StatsSnapshot;
use shared::Shared;

/// Binding changes that may wait for the processor at once
const BINDING_QUEUE_SIZE: usize = 16;

/// The one format advertised during enumeration.
pub const ADVERTISED_FORMAT: AudioInfoRaw = AudioInfoRaw {
    format: SampleFormat::F32P,
    channels: 2,
    rate: 48_000,
};

const PARAMS: [ParamInfo; 2] = [
    ParamInfo::read(ParamId::EnumFormat),
    ParamInfo::read_write(ParamId::Format),
];

/// Control half of the null sink.
pub struct SinkNode {
    config: SinkConfig,
    shared: Arc<Shared>,
    reports: Consumer<Report>,
    bindings: Producer<Option<Arc<IoBuffers>>>,
    retired: Consumer<Arc<IoBuffers>>,
    /// What the processor will see once it has caught up
    io: Option<Arc<IoBuffers>>,
    rate_match: Option<Arc<RateMatch>>,
    listeners: Listeners,
    info: NodeInfo,
    port_info: PortInfo,
    log: Dispatch,
    system: Arc<dyn System>,
    /// System time of the last transition to `Started`
    started_at: Option<Duration>,
}

impl SinkNode {
    /// Create a node in the `Created` state.
    ///
    /// `log` receives every record the node emits; `system` provides the clock.
    pub fn new(config: SinkConfig, log: Dispatch, system: Arc<dyn System>) -> (SinkNode, SinkProcessor) {
        let shared = Arc::new(Shared::new());
        let (producer, consumer) = RingBuffer::new(config.report_queue_size.max(1));
        let (bindings, binding_rx) = RingBuffer::new(BINDING_QUEUE_SIZE);
        let (retired_tx, retired) = RingBuffer::new(BINDING_QUEUE_SIZE);

        let processor = SinkProcessor::new(
            Arc::clone(&shared),
            producer,
            binding_rx,
            retired_tx,
            config.max_buffers,
            config.report_interval,
        );

        let node = SinkNode {
            shared,
            reports: consumer,
            bindings,
            retired,
            io: None,
            rate_match: None,
            listeners: Listeners::new(),
            info: NodeInfo {
                max_input_ports: 1,
                max_output_ports: 0,
                realtime: true,
                state: LifecycleState::Created,
                params: PARAMS,
            },
            port_info: PortInfo {
                no_ref: true,
                rate: None,
                n_buffers: 0,
                params: PARAMS,
            },
            log,
            system,
            started_at: None,
            config,
        };

        node.scoped_ref(|node| info!(max_buffers = node.config.max_buffers, "initialized"));
        (node, processor)
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    /// The negotiated format, if any
    pub fn format(&self) -> Option<AudioFormat> {
        self.shared.format()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats()
    }

    /// Whether a usable buffer-exchange area is bound
    pub fn has_io(&self) -> bool {
        self.io.is_some()
    }

    /// The bound rate-matching area, if any
    pub fn rate_match(&self) -> Option<Arc<RateMatch>> {
        self.rate_match.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Log everything the processor has queued. Returns how many reports were
    /// drained.
    pub fn drain_reports(&mut self) -> usize {
        let log = self.log.clone();
        tracing::dispatcher::with_default(&log, || self.flush_reports())
    }

    /// Tear the node down: stop processing, drop the bindings and release every
    /// listener. Safe to call more than once.
    pub fn clear(&mut self) {
        if self.state() == LifecycleState::Destroyed {
            return;
        }
        self.scoped(|node| {
            node.shared.set_state(LifecycleState::Destroyed);
            node.shared.set_format(None);
            // the processor is already gated off; a full queue only delays the release
            if node.io.take().is_some() {
                let _ = node.bindings.push(None);
            }
            node.rate_match = None;
            node.collect_retired();
            node.started_at = None;
            node.info.state = LifecycleState::Destroyed;
            node.emit_info();
            node.listeners.clear();

            let stats = node.shared.stats();
            info!(frames = stats.frames, buffers = stats.buffers, "destroyed");
        });
    }

    /// Run `f` with this node's dispatcher and span, after draining reports.
    fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let log = self.log.clone();
        tracing::dispatcher::with_default(&log, || {
            let _span = tracing::info_span!("null-sink", node = %self.config.name).entered();
            self.flush_reports();
            f(self)
        })
    }

    fn scoped_ref<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        tracing::dispatcher::with_default(&self.log, || {
            let _span = tracing::info_span!("null-sink", node = %self.config.name).entered();
            f(self)
        })
    }

    /// Drop areas the processor has let go of
    fn collect_retired(&mut self) {
        while self.retired.pop().is_ok() {}
    }

    fn flush_reports(&mut self) -> usize {
        self.collect_retired();
        let mut count = 0;
        while let Ok(report) = self.reports.pop() {
            match report {
                Report::InvalidBufferId { id, capacity } => {
                    warn!(id, capacity, "invalid buffer id");
                }
                Report::MissingBuffer { id } => {
                    warn!(id, "null buffer");
                }
                Report::Dropped { frames, buffers } => {
                    trace!(frames, buffers, "dropped frames");
                }
            }
            count += 1;
        }
        count
    }

    fn ensure_alive(&self) -> Result<(), NodeError> {
        if self.state() == LifecycleState::Destroyed {
            return Err(NodeError::Destroyed);
        }
        Ok(())
    }

    fn check_port(direction: Direction, port_id: u32) -> Result<(), NodeError> {
        if direction != Direction::Input || port_id != 0 {
            return Err(NodeError::InvalidPort { direction, port_id });
        }
        Ok(())
    }

    fn transition(&mut self, state: LifecycleState) {
        let from = self.shared.state();
        if from == state {
            return;
        }
        self.shared.set_state(state);
        self.info.state = state;
        debug!(%from, to = %state, "state changed");
        self.emit_info();
    }

    fn emit_info(&mut self) {
        let info = &self.info;
        self.listeners.emit(|l| l.info(info));
    }

    fn set_port_rate(&mut self, rate: Option<u32>) {
        if self.port_info.rate == rate {
            return;
        }
        self.port_info.rate = rate;
        let port_info = &self.port_info;
        self.listeners
            .emit(|l| l.port_info(Direction::Input, 0, port_info));
    }

    fn do_set_io(&mut self, kind: IoKind, binding: Option<IoBinding>) -> Result<(), NodeError> {
        match kind {
            IoKind::Buffers => {
                let area = binding.as_ref().and_then(IoBinding::resolve::<IoBuffers>);
                if binding.is_some() && area.is_none() {
                    debug!(size = binding.as_ref().map(IoBinding::size), "buffer io area unusable, unbinding");
                }
                self.bindings.push(area.clone()).map_err(|_| {
                    warn!("binding queue full, processor is not keeping up");
                    NodeError::Busy
                })?;
                debug!(bound = area.is_some(), "buffer io");
                self.io = area;
            }
            IoKind::RateMatch => {
                let area = binding.as_ref().and_then(IoBinding::resolve::<RateMatch>);
                if binding.is_some() && area.is_none() {
                    debug!(size = binding.as_ref().map(IoBinding::size), "rate match area unusable, unbinding");
                }
                debug!(bound = area.is_some(), "rate match io");
                self.rate_match = area;
            }
            other => {
                debug!(kind = ?other, "unsupported io");
                return Err(NodeError::UnsupportedIo(other));
            }
        }
        Ok(())
    }

    fn do_send_command(&mut self, command: Command) -> Result<(), NodeError> {
        match command {
            Command::Start => {
                let format = match self.shared.format() {
                    Some(format) => format,
                    None => {
                        error!("no format configured");
                        return Err(NodeError::NotReady);
                    }
                };
                if self.state() != LifecycleState::Started {
                    self.started_at = Some(self.system.now());
                    self.transition(LifecycleState::Started);
                    info!(%format, "started");
                }
                Ok(())
            }
            Command::Suspend | Command::Pause => {
                match self.state() {
                    LifecycleState::Started => {
                        let ran_for = self
                            .started_at
                            .take()
                            .map(|t| self.system.now().saturating_sub(t))
                            .unwrap_or_default();
                        self.transition(LifecycleState::Suspended);
                        let stats = self.shared.stats();
                        info!(
                            ?command,
                            ran_ms = ran_for.as_millis() as u64,
                            frames = stats.frames,
                            buffers = stats.buffers,
                            "suspended"
                        );
                    }
                    LifecycleState::Suspended => {}
                    state => debug!(%state, ?command, "not started, nothing to suspend"),
                }
                Ok(())
            }
            other => {
                warn!(command = ?other, "unknown command");
                Err(NodeError::UnsupportedCommand(other))
            }
        }
    }

    fn do_set_param(&mut self, id: ParamId, param: Option<&FormatParam>) -> Result<(), NodeError> {
        if id != ParamId::Format {
            debug!(param = ?id, "unsupported param");
            return Err(NodeError::UnsupportedParam(id));
        }

        match param {
            None => {
                // stop the processor before the format disappears under it
                if self.state() != LifecycleState::Created {
                    self.started_at = None;
                    self.transition(LifecycleState::Created);
                }
                self.shared.set_format(None);
                self.set_port_rate(None);
                info!("format cleared");
            }
            Some(candidate) => {
                let format = candidate.parse_audio_raw().map_err(|e| {
                    error!(error = %e, "rejecting format");
                    NodeError::from(e)
                })?;
                self.shared.set_format(Some(format));
                self.set_port_rate(Some(format.rate()));
                info!(
                    channels = format.channels(),
                    rate = format.rate(),
                    format = %format.sample_format(),
                    "format set"
                );
                if self.state() == LifecycleState::Created {
                    self.transition(LifecycleState::Configured);
                }
            }
        }

        self.listeners.emit(|l| l.param_changed(id, param));
        Ok(())
    }

    fn do_enum_params(&mut self, seq: i32, id: ParamId, start: u32, num: u32) -> Result<u32, NodeError> {
        if num == 0 {
            return Err(NodeError::InvalidArgument("num must be non-zero"));
        }

        let param = match id {
            ParamId::EnumFormat => Some(FormatParam::audio_raw(ADVERTISED_FORMAT)),
            ParamId::Format => self.shared.format().map(FormatParam::from),
            _ => None,
        };

        let mut count = 0;
        if let Some(param) = param.as_ref().filter(|_| start == 0) {
            let result = NodeResult::Params {
                id,
                index: 0,
                next: 1,
                param,
            };
            self.listeners.emit(|l| l.result(seq, 0, &result));
            count += 1;
        }
        trace!(seq, param = ?id, start, num, count, "enumerated params");
        Ok(count)
    }
}

impl Node for SinkNode {
    fn add_listener(&mut self, events: Box<dyn NodeEvents>) -> Result<ListenerId, NodeError> {
        self.ensure_alive()?;
        let id = self.listeners.add(events);

        let info = &self.info;
        let port_info = &self.port_info;
        self.listeners.emit_to(id, |l| {
            l.info(info);
            l.port_info(Direction::Input, 0, port_info);
        });
        Ok(id)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        if self.ensure_alive().is_err() {
            return false;
        }
        self.listeners.remove(id)
    }

    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn set_io(&mut self, kind: IoKind, binding: Option<IoBinding>) -> Result<(), NodeError> {
        self.ensure_alive()?;
        self.scoped(|node| node.do_set_io(kind, binding))
    }

    fn send_command(&mut self, command: Command) -> Result<(), NodeError> {
        self.ensure_alive()?;
        self.scoped(|node| node.do_send_command(command))
    }

    fn enum_params(&mut self, seq: i32, id: ParamId, start: u32, num: u32) -> Result<u32, NodeError> {
        self.ensure_alive()?;
        self.scoped(|node| node.do_enum_params(seq, id, start, num))
    }

    fn set_param(&mut self, id: ParamId, param: Option<&FormatParam>) -> Result<(), NodeError> {
        self.ensure_alive()?;
        self.scoped(|node| node.do_set_param(id, param))
    }

    fn enum_ports(&mut self, seq: i32, direction: Direction, start: u32, num: u32) -> Result<u32, NodeError> {
        self.ensure_alive()?;
        if direction != Direction::Input || start != 0 || num == 0 {
            return Ok(0);
        }
        let result = NodeResult::Ports {
            direction,
            port_id: 0,
            next: 1,
        };
        self.listeners.emit(|l| l.result(seq, 0, &result));
        Ok(1)
    }

    fn port_info(&self, direction: Direction, port_id: u32) -> Result<&PortInfo, NodeError> {
        self.ensure_alive()?;
        Self::check_port(direction, port_id)?;
        Ok(&self.port_info)
    }

    fn port_enum_params(
        &mut self,
        seq: i32,
        direction: Direction,
        port_id: u32,
        id: ParamId,
        start: u32,
        num: u32,
    ) -> Result<u32, NodeError> {
        Self::check_port(direction, port_id)?;
        self.enum_params(seq, id, start, num)
    }

    fn port_set_param(
        &mut self,
        direction: Direction,
        port_id: u32,
        id: ParamId,
        param: Option<&FormatParam>,
    ) -> Result<(), NodeError> {
        Self::check_port(direction, port_id)?;
        self.set_param(id, param)
    }

    fn port_set_io(
        &mut self,
        direction: Direction,
        port_id: u32,
        kind: IoKind,
        binding: Option<IoBinding>,
    ) -> Result<(), NodeError> {
        Self::check_port(direction, port_id)?;
        self.set_io(kind, binding)
    }

    fn port_use_buffers(&mut self, direction: Direction, port_id: u32, n_buffers: u32) -> Result<(), NodeError> {
        self.ensure_alive()?;
        Self::check_port(direction, port_id)?;
        self.scoped(|node| {
            node.port_info.n_buffers = n_buffers;
            debug!(n_buffers, "using buffers");
        });
        Ok(())
    }

    fn port_reuse_buffer(&mut self, _port_id: u32, _buffer_id: u32) -> Result<(), NodeError> {
        self.ensure_alive()
    }
}

impl Drop for SinkNode {
    fn drop(&mut self) {
        self.clear();
    }
}
