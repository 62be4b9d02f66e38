//! Error types.
//!
//! Control operations report failures through [`NodeError`]; factory and
//! handle operations through [`FactoryError`]. The processing step has no
//! error type at all.

use core::fmt;

use crate::format::{MediaSubtype, MediaType};
use crate::io::IoKind;
use crate::node::{Command, Direction, ParamId};

/// Coarse classification of a [`NodeError`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Invalid parameters, rejected without touching state
    Configuration,
    /// The request is invalid in the current lifecycle state
    Sequencing,
    /// The node doesn't implement what was asked for
    Unsupported,
}

/// Why a format candidate was rejected.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FormatError {
    /// Anything other than `audio/raw`
    UnsupportedMediaType {
        media_type: MediaType,
        media_subtype: MediaSubtype,
    },
    /// `audio/raw` without raw audio properties
    MissingAudioInfo,
    InvalidChannels(u32),
    InvalidRate(u32),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedMediaType {
                media_type,
                media_subtype,
            } => write!(f, "unsupported media type {media_type:?}/{media_subtype:?}"),
            Self::MissingAudioInfo => write!(f, "format carries no raw audio properties"),
            Self::InvalidChannels(n) => write!(f, "invalid channel count {n}"),
            Self::InvalidRate(r) => write!(f, "invalid sample rate {r}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// Errors returned by control operations.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NodeError {
    /// The format candidate failed validation
    InvalidFormat(FormatError),
    /// A malformed argument, e.g. a zero item limit
    InvalidArgument(&'static str),
    /// Start requested without a negotiated format
    NotReady,
    /// The node has been cleaned up
    Destroyed,
    /// Too many binding changes are waiting for the processor to pick them up
    Busy,
    UnsupportedIo(IoKind),
    UnsupportedParam(ParamId),
    UnsupportedCommand(Command),
    /// No such port on this node
    InvalidPort { direction: Direction, port_id: u32 },
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat(_) | Self::InvalidArgument(_) | Self::InvalidPort { .. } => {
                ErrorKind::Configuration
            }
            Self::NotReady | Self::Destroyed | Self::Busy => ErrorKind::Sequencing,
            Self::UnsupportedIo(_) | Self::UnsupportedParam(_) | Self::UnsupportedCommand(_) => {
                ErrorKind::Unsupported
            }
        }
    }

    /// Negative errno equivalent, for hosts that speak C result codes
    pub fn errno(&self) -> i32 {
        const ENOENT: i32 = 2;
        const EIO: i32 = 5;
        const EBUSY: i32 = 16;
        const EINVAL: i32 = 22;
        const EPIPE: i32 = 32;
        const ENOTSUP: i32 = 95;

        match self {
            Self::InvalidFormat(_) | Self::InvalidArgument(_) | Self::InvalidPort { .. } => -EINVAL,
            Self::NotReady => -EIO,
            Self::Destroyed => -EPIPE,
            Self::Busy => -EBUSY,
            Self::UnsupportedIo(_) => -ENOENT,
            Self::UnsupportedParam(_) | Self::UnsupportedCommand(_) => -ENOTSUP,
        }
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(e) => write!(f, "invalid format: {e}"),
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Self::NotReady => write!(f, "no format configured"),
            Self::Destroyed => write!(f, "node has been destroyed"),
            Self::Busy => write!(f, "binding queue is full"),
            Self::UnsupportedIo(kind) => write!(f, "io kind {kind:?} not supported"),
            Self::UnsupportedParam(id) => write!(f, "param {id:?} not supported"),
            Self::UnsupportedCommand(cmd) => write!(f, "command {cmd:?} not supported"),
            Self::InvalidPort { direction, port_id } => {
                write!(f, "no {direction:?} port {port_id}")
            }
        }
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidFormat(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FormatError> for NodeError {
    fn from(e: FormatError) -> Self {
        NodeError::InvalidFormat(e)
    }
}

/// Errors from factories and handles.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FactoryError {
    /// A mandatory support service was not provided
    MissingSupport(&'static str),
    /// The handle doesn't implement the requested interface type
    InterfaceNotFound(String),
    /// A factory info property could not be parsed
    InvalidProperty { key: String, value: String },
}

impl fmt::Display for FactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSupport(ty) => write!(f, "missing support interface {ty}"),
            Self::InterfaceNotFound(ty) => write!(f, "interface {ty} not found"),
            Self::InvalidProperty { key, value } => write!(f, "invalid value {value:?} for {key}"),
        }
    }
}

impl std::error::Error for FactoryError {}
