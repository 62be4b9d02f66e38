//! A minimal host: discover the null sink, wire it up and drive it from an
//! audio thread while a control thread suspends and resumes it.
//!
//! Run with: cargo run --example host_loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, sleep};
use std::time::Duration;

use null_sink::plugin::{SUPPORT_LOG, SUPPORT_SYSTEM};
use null_sink::{
    find_factory, AudioInfoRaw, Command, Dict, FormatParam, HandleFactory, IoBinding, IoBuffers, IoKind, MonotonicSystem,
    NullSinkFactory, SampleFormat, Support, SupportItem, ID_INVALID, FACTORY_NULL_SINK,
};
use null_sink::{Node, Process};

const QUANTUM_FRAMES: u32 = 48;
const CHANNELS: u32 = 2;

fn main() {
    let log = tracing::Dispatch::new(
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .finish(),
    );

    let support = Support::new()
        .with(SUPPORT_LOG, SupportItem::Log(log))
        .with(SUPPORT_SYSTEM, SupportItem::System(Arc::new(MonotonicSystem::new())));

    let factory = find_factory(FACTORY_NULL_SINK).expect("null sink factory is built in");
    println!("found factory {}", factory.name());

    // the typed factory gives access to the stats; `factory.init` would do otherwise
    let info = Dict::new()
        .with("node.name", "demo-sink")
        .with("node.report-interval", "250");
    let mut handle = NullSinkFactory
        .create(Some(&info), &support)
        .expect("support is complete");
    let mut processor = handle.take_sink_processor().expect("fresh handle");

    let io = Arc::new(IoBuffers::with_buffers(4, QUANTUM_FRAMES * CHANNELS * 4));
    let node = handle.node();
    node.set_io(IoKind::Buffers, Some(IoBinding::new(io.clone())))
        .unwrap();
    node.set_format(Some(&FormatParam::audio_raw(AudioInfoRaw::new(
        SampleFormat::F32,
        CHANNELS,
        48000,
    ))))
    .unwrap();
    node.send_command(Command::Start).unwrap();

    let running = Arc::new(AtomicBool::new(true));
    let audio = {
        let io = io.clone();
        let running = running.clone();
        thread::spawn(move || {
            let mut next = 0;
            while running.load(Ordering::Relaxed) {
                // pretend an upstream node produced one quantum
                if io.buffer_id() == ID_INVALID {
                    io.queue(next, QUANTUM_FRAMES * CHANNELS * 4);
                    next = (next + 1) % 4;
                }
                processor.process();
                sleep(Duration::from_millis(1));
            }
        })
    };

    for round in 0..4 {
        sleep(Duration::from_millis(500));
        let node = handle.node();
        if round % 2 == 0 {
            node.send_command(Command::Suspend).unwrap();
        } else {
            node.send_command(Command::Start).unwrap();
        }
        node.drain_reports();
        let stats = node.stats();
        println!("{}: {} frames in {} buffers", node.state(), stats.frames, stats.buffers);
    }

    running.store(false, Ordering::Relaxed);
    audio.join().unwrap();
    handle.node().clear();
}
