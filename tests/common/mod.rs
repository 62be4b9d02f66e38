#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use null_sink::{
    AudioInfoRaw, Direction, FormatParam, IoBinding, IoBuffers, IoKind, LifecycleState, MonotonicSystem, Node,
    NodeEvents, NodeInfo, NodeResult, ParamId, PortInfo, SampleFormat, SinkConfig, SinkNode, SinkProcessor,
};
use tracing::Dispatch;

/// What a [`Recorder`] saw, in owned form
#[derive(Clone, Debug, PartialEq)]
pub enum Seen {
    Info(LifecycleState),
    PortInfo {
        direction: Direction,
        port_id: u32,
        rate: Option<u32>,
    },
    ParamChanged(ParamId, Option<FormatParam>),
    Params {
        seq: i32,
        id: ParamId,
        index: u32,
        next: u32,
        param: FormatParam,
    },
    Ports {
        seq: i32,
        direction: Direction,
        port_id: u32,
    },
}

pub type EventLog = Arc<Mutex<Vec<(&'static str, Seen)>>>;

/// Listener that appends everything it sees to a shared log, tagged with its name
pub struct Recorder {
    name: &'static str,
    log: EventLog,
}

impl Recorder {
    pub fn new(name: &'static str, log: &EventLog) -> Box<Self> {
        Box::new(Self {
            name,
            log: Arc::clone(log),
        })
    }

    fn push(&self, seen: Seen) {
        self.log.lock().unwrap().push((self.name, seen));
    }
}

impl NodeEvents for Recorder {
    fn info(&mut self, info: &NodeInfo) {
        self.push(Seen::Info(info.state));
    }

    fn port_info(&mut self, direction: Direction, port_id: u32, info: &PortInfo) {
        self.push(Seen::PortInfo {
            direction,
            port_id,
            rate: info.rate,
        });
    }

    fn param_changed(&mut self, id: ParamId, param: Option<&FormatParam>) {
        self.push(Seen::ParamChanged(id, param.cloned()));
    }

    fn result(&mut self, seq: i32, _res: i32, result: &NodeResult<'_>) {
        let seen = match *result {
            NodeResult::Params {
                id,
                index,
                next,
                param,
            } => Seen::Params {
                seq,
                id,
                index,
                next,
                param: param.clone(),
            },
            NodeResult::Ports {
                direction, port_id, ..
            } => Seen::Ports {
                seq,
                direction,
                port_id,
            },
        };
        self.push(seen);
    }
}

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Everything `name` saw, in order
pub fn seen_by(log: &EventLog, name: &str) -> Vec<Seen> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(n, _)| *n == name)
        .map(|(_, s)| s.clone())
        .collect()
}

pub fn clear_log(log: &EventLog) {
    log.lock().unwrap().clear();
}

/// A dispatcher that prints through the test harness
pub fn test_dispatch() -> Dispatch {
    Dispatch::new(
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .finish(),
    )
}

pub fn new_node() -> (SinkNode, SinkProcessor) {
    new_node_with(SinkConfig::default())
}

pub fn new_node_with(config: SinkConfig) -> (SinkNode, SinkProcessor) {
    SinkNode::new(config, test_dispatch(), Arc::new(MonotonicSystem::new()))
}

pub fn raw(format: SampleFormat, channels: u32, rate: u32) -> FormatParam {
    FormatParam::audio_raw(AudioInfoRaw::new(format, channels, rate))
}

pub fn stereo_48k() -> FormatParam {
    raw(SampleFormat::F32, 2, 48000)
}

/// Bind a fresh exchange area with `count` buffers of 8 KiB
pub fn bind_buffers(node: &mut SinkNode, count: u32) -> Arc<IoBuffers> {
    let io = Arc::new(IoBuffers::with_buffers(count, 8192));
    node.set_io(IoKind::Buffers, Some(IoBinding::new(Arc::clone(&io))))
        .unwrap();
    io
}

/// A node that is bound, configured for `format` and started
pub fn running_node(format: &FormatParam) -> (SinkNode, SinkProcessor, Arc<IoBuffers>) {
    let (mut node, processor) = new_node();
    let io = bind_buffers(&mut node, 4);
    node.set_format(Some(format)).unwrap();
    node.send_command(null_sink::Command::Start).unwrap();
    (node, processor, io)
}
