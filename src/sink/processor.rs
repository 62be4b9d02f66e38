//! Real-time half of the null sink.

use std::sync::Arc;

use rtrb::{Consumer, Producer};

use crate::io::{IoBuffers, Status, ID_INVALID};
use crate::node::{LifecycleState, Process};
use crate::sink::shared::{Report, Shared};

/// The part of a [`SinkNode`](crate::sink::SinkNode) that runs on the audio
/// thread.
///
/// Move it to the thread that drives the graph and call
/// [`process`](Process::process) once per quantum. Each call touches a handful
/// of atomics and a few ring buffers; it never allocates and never frees.
///
/// The processor owns its view of the buffer-exchange area. Rebinding arrives
/// over a ring buffer, and the area it replaces goes back to the control half
/// on another one, so the last reference is never dropped here.
pub struct SinkProcessor {
    shared: Arc<Shared>,
    reports: Producer<Report>,
    bindings: Consumer<Option<Arc<IoBuffers>>>,
    retired: Producer<Arc<IoBuffers>>,
    io: Option<Arc<IoBuffers>>,
    max_buffers: u32,
    report_interval: u64,
}

impl SinkProcessor {
    pub(crate) fn new(
        shared: Arc<Shared>,
        reports: Producer<Report>,
        bindings: Consumer<Option<Arc<IoBuffers>>>,
        retired: Producer<Arc<IoBuffers>>,
        max_buffers: u32,
        report_interval: u64,
    ) -> Self {
        Self {
            shared,
            reports,
            bindings,
            retired,
            io: None,
            max_buffers,
            report_interval,
        }
    }

    /// Take pending binding changes, handing replaced areas back.
    fn apply_bindings(&mut self) {
        // only take a change whose old area has somewhere to go
        while self.retired.slots() > 0 {
            let next = match self.bindings.pop() {
                Ok(next) => next,
                Err(_) => break,
            };
            if let Some(old) = core::mem::replace(&mut self.io, next) {
                // a slot was checked above and this is the only producer
                let _ = self.retired.push(old);
            }
        }
    }
}

// Never blocks: a full queue loses the report, not the quantum.
#[inline]
fn push_report(reports: &mut Producer<Report>, shared: &Shared, report: Report) {
    if reports.push(report).is_err() {
        shared.report_lost();
    }
}

impl Process for SinkProcessor {
    fn process(&mut self) -> Status {
        self.apply_bindings();

        let shared = &*self.shared;
        let reports = &mut self.reports;

        if shared.state() != LifecycleState::Started {
            return Status::OK;
        }
        let format = match shared.format() {
            Some(format) => format,
            None => return Status::OK,
        };

        let io = match &self.io {
            Some(io) => io,
            None => return Status::OK,
        };

        let id = io.buffer_id();
        if id == ID_INVALID {
            return Status::OK;
        }

        let capacity = io.capacity().min(self.max_buffers as usize);
        if id as usize >= capacity {
            push_report(
                reports,
                shared,
                Report::InvalidBufferId {
                    id,
                    capacity: capacity as u32,
                },
            );
            io.set_buffer_id(ID_INVALID);
            return Status::OK;
        }

        let buffer = match io.buffer(id) {
            Some(buffer) => buffer,
            None => {
                push_report(reports, shared, Report::MissingBuffer { id });
                io.set_buffer_id(ID_INVALID);
                return Status::OK;
            }
        };

        if let Some(chunk) = buffer.chunk() {
            let buffers = shared.record(format.frames_in(chunk.size()));
            if self.report_interval != 0 && buffers % self.report_interval == 0 {
                let frames = shared.frames();
                push_report(reports, shared, Report::Dropped { frames, buffers });
            }
        }

        // payload is discarded; hand the buffer back
        io.set_buffer_id(ID_INVALID);
        Status::OK
    }
}
