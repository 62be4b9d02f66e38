//! Listener registry and the notifications a node emits.

use crate::format::FormatParam;
use crate::node::{Direction, LifecycleState, ParamId};

/// Callbacks a node invokes on its listeners.
///
/// All methods default to doing nothing, so a listener only implements what it
/// cares about. Callbacks run synchronously on the thread that triggered them,
/// always a control thread.
pub trait NodeEvents: Send {
    /// Node info changed (including lifecycle state)
    fn info(&mut self, _info: &NodeInfo) {}

    /// Port info changed
    fn port_info(&mut self, _direction: Direction, _port_id: u32, _info: &PortInfo) {}

    /// A parameter was set or cleared
    fn param_changed(&mut self, _id: ParamId, _param: Option<&FormatParam>) {}

    /// Result of an enumeration, tagged with the caller's sequence number
    fn result(&mut self, _seq: i32, _res: i32, _result: &NodeResult<'_>) {}
}

/// Access flags of a parameter
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ParamInfo {
    pub id: ParamId,
    pub read: bool,
    pub write: bool,
}

impl ParamInfo {
    pub const fn read(id: ParamId) -> Self {
        Self { id, read: true, write: false }
    }

    pub const fn read_write(id: ParamId) -> Self {
        Self { id, read: true, write: true }
    }
}

/// Static and dynamic information about a node
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NodeInfo {
    pub max_input_ports: u32,
    pub max_output_ports: u32,
    /// The node's `process` is safe to call from a real-time thread
    pub realtime: bool,
    pub state: LifecycleState,
    pub params: [ParamInfo; 2],
}

/// Information about one port
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PortInfo {
    /// Buffers are never retained past one process call
    pub no_ref: bool,
    /// Sample rate of the negotiated format, if any
    pub rate: Option<u32>,
    /// Buffers the host allocated for this port
    pub n_buffers: u32,
    pub params: [ParamInfo; 2],
}

/// Payload of a [`NodeEvents::result`] notification
#[derive(Clone, Copy, Debug)]
pub enum NodeResult<'a> {
    /// One enumerated parameter
    Params {
        id: ParamId,
        /// Position of this item in the enumeration
        index: u32,
        /// `start` value to resume after this item
        next: u32,
        param: &'a FormatParam,
    },
    /// One enumerated port
    Ports {
        direction: Direction,
        port_id: u32,
        next: u32,
    },
}

/// Returned by registration, used to unregister
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ListenerId(u64);

/// Ordered listener registry.
///
/// No de-duplication: registering the same kind of listener twice notifies it
/// twice. Notification order is registration order.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<(ListenerId, Box<dyn NodeEvents>)>,
    next_id: u64,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, events: Box<dyn NodeEvents>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, events));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.entries.iter().position(|(entry, _)| *entry == id) {
            Some(pos) => {
                // keep order for the rest
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Call `f` on the listener `id` only
    pub fn emit_to<F: FnMut(&mut dyn NodeEvents)>(&mut self, id: ListenerId, mut f: F) {
        if let Some((_, events)) = self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            f(events.as_mut());
        }
    }

    /// Call `f` on every listener, in registration order
    pub fn emit<F: FnMut(&mut dyn NodeEvents)>(&mut self, mut f: F) {
        for (_, events) in self.entries.iter_mut() {
            f(events.as_mut());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every listener
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
