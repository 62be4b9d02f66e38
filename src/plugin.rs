//! Factory and handle: how a host discovers, creates and destroys nodes.
//!
//! A host walks [`enum_factory`] (or calls [`find_factory`]), creates a
//! [`Handle`] with [`HandleFactory::init`], asks it for the `"Node"` interface
//! and, separately, takes the real-time processor to its audio thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use tracing::Dispatch;

use crate::config::SinkConfig;
use crate::error::FactoryError;
use crate::node::{Node, Process};
use crate::sink::{SinkNode, SinkProcessor};

/// Name of the null sink factory
pub const FACTORY_NULL_SINK: &str = "api.null.sink";

/// Interface type of the control interface
pub const INTERFACE_NODE: &str = "Node";

/// Support type carrying a [`tracing::Dispatch`]
pub const SUPPORT_LOG: &str = "Log";
/// Support type carrying a [`System`]
pub const SUPPORT_SYSTEM: &str = "System";
/// Support type for the data loop; accepted but unused by the null sink
pub const SUPPORT_DATA_LOOP: &str = "DataLoop";

/// Timing services the host provides to its nodes.
pub trait System: Send + Sync {
    /// Monotonic time since an arbitrary, fixed origin
    fn now(&self) -> Duration;
}

/// [`System`] backed by [`std::time::Instant`]
#[derive(Clone, Copy, Debug)]
pub struct MonotonicSystem {
    origin: Instant,
}

impl MonotonicSystem {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MonotonicSystem {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// One service in a [`Support`] list
#[derive(Clone)]
pub enum SupportItem {
    Log(Dispatch),
    System(Arc<dyn System>),
    /// Anything else a host wants to expose
    Other(Arc<dyn core::any::Any + Send + Sync>),
}

/// Services a host hands to factories, keyed by interface type.
#[derive(Clone, Default)]
pub struct Support {
    items: HashMap<&'static str, SupportItem>,
}

impl Support {
    pub fn new() -> Self {
        Self::default()
    }

    /// The usual host services: the current default dispatcher and a
    /// monotonic clock.
    pub fn host_defaults() -> Self {
        let log = tracing::dispatcher::get_default(|d| d.clone());
        Self::new()
            .with(SUPPORT_LOG, SupportItem::Log(log))
            .with(SUPPORT_SYSTEM, SupportItem::System(Arc::new(MonotonicSystem::new())))
    }

    /// Add or replace the item for `ty`
    pub fn with(mut self, ty: &'static str, item: SupportItem) -> Self {
        self.items.insert(ty, item);
        self
    }

    pub fn get(&self, ty: &str) -> Option<&SupportItem> {
        self.items.get(ty)
    }

    pub fn log(&self) -> Option<Dispatch> {
        match self.items.get(SUPPORT_LOG) {
            Some(SupportItem::Log(d)) => Some(d.clone()),
            _ => None,
        }
    }

    pub fn system(&self) -> Option<Arc<dyn System>> {
        match self.items.get(SUPPORT_SYSTEM) {
            Some(SupportItem::System(s)) => Some(Arc::clone(s)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ordered string properties passed to [`HandleFactory::init`]
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Dict {
    items: Vec<(String, String)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key = value`; a later duplicate shadows an earlier one
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.items.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// An interface type a factory's handles implement
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InterfaceInfo {
    pub type_name: &'static str,
}

/// A live node instance created by a factory.
pub trait Handle: Send {
    /// Look up an interface by type name
    fn get_interface(&mut self, type_name: &str) -> Result<&mut dyn Node, FactoryError>;

    /// Hand out the real-time half. Returns `Some` exactly once.
    fn take_processor(&mut self) -> Option<Box<dyn Process>>;

    /// Release everything the instance holds. Idempotent.
    fn clear(&mut self);
}

/// Creates [`Handle`]s.
pub trait HandleFactory: Sync {
    fn name(&self) -> &'static str;

    /// Bytes needed for one instance
    fn instance_size(&self, info: Option<&Dict>) -> usize;

    /// Create an instance. `support` must provide `"Log"` and `"System"`.
    fn init(&self, info: Option<&Dict>, support: &Support) -> Result<Box<dyn Handle>, FactoryError>;

    /// Interface types implemented by instances, by index
    fn interface_info(&self, index: u32) -> Option<InterfaceInfo>;
}

/// Factory for [`NullSinkHandle`]s
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSinkFactory;

const NULL_SINK_INTERFACES: [InterfaceInfo; 1] = [InterfaceInfo {
    type_name: INTERFACE_NODE,
}];

impl NullSinkFactory {
    /// Typed variant of [`HandleFactory::init`]
    pub fn create(&self, info: Option<&Dict>, support: &Support) -> Result<NullSinkHandle, FactoryError> {
        let log = support.log().ok_or(FactoryError::MissingSupport(SUPPORT_LOG))?;
        let system = support
            .system()
            .ok_or(FactoryError::MissingSupport(SUPPORT_SYSTEM))?;
        let config = match info {
            Some(dict) => SinkConfig::from_dict(dict)?,
            None => SinkConfig::default(),
        };

        let (node, processor) = SinkNode::new(config, log, system);
        Ok(NullSinkHandle {
            node,
            processor: Some(processor),
        })
    }
}

impl HandleFactory for NullSinkFactory {
    fn name(&self) -> &'static str {
        FACTORY_NULL_SINK
    }

    fn instance_size(&self, _info: Option<&Dict>) -> usize {
        core::mem::size_of::<NullSinkHandle>()
    }

    fn init(&self, info: Option<&Dict>, support: &Support) -> Result<Box<dyn Handle>, FactoryError> {
        Ok(Box::new(self.create(info, support)?))
    }

    fn interface_info(&self, index: u32) -> Option<InterfaceInfo> {
        NULL_SINK_INTERFACES.get(index as usize).copied()
    }
}

/// A null sink instance: the node plus its not-yet-claimed processor
pub struct NullSinkHandle {
    node: SinkNode,
    processor: Option<SinkProcessor>,
}

impl NullSinkHandle {
    pub fn node(&mut self) -> &mut SinkNode {
        &mut self.node
    }

    /// Typed variant of [`Handle::take_processor`]
    pub fn take_sink_processor(&mut self) -> Option<SinkProcessor> {
        self.processor.take()
    }
}

impl Handle for NullSinkHandle {
    fn get_interface(&mut self, type_name: &str) -> Result<&mut dyn Node, FactoryError> {
        if type_name == INTERFACE_NODE {
            Ok(&mut self.node)
        } else {
            Err(FactoryError::InterfaceNotFound(type_name.to_string()))
        }
    }

    fn take_processor(&mut self) -> Option<Box<dyn Process>> {
        self.processor
            .take()
            .map(|p| Box::new(p) as Box<dyn Process>)
    }

    fn clear(&mut self) {
        self.node.clear();
    }
}

static NULL_SINK_FACTORY: NullSinkFactory = NullSinkFactory;

/// Plugin entry point: the factory at `index`, or `None` past the end
pub fn enum_factory(index: u32) -> Option<&'static dyn HandleFactory> {
    match index {
        0 => Some(&NULL_SINK_FACTORY),
        _ => None,
    }
}

/// All factories, in enumeration order
pub fn factories() -> impl Iterator<Item = &'static dyn HandleFactory> {
    (0..).map_while(enum_factory)
}

pub fn find_factory(name: &str) -> Option<&'static dyn HandleFactory> {
    factories().find(|f| f.name() == name)
}
