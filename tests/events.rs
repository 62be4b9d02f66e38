mod common;

use common::{clear_log, event_log, new_node, seen_by, stereo_48k, Recorder, Seen};
use null_sink::{Command, Direction, IoKind, LifecycleState, Node, NodeError, ParamId};

#[test]
/// A new listener gets the current node and port info, and nobody else does
fn replays_info_to_new_listener() {
    let (mut node, _processor) = new_node();
    let log = event_log();

    node.add_listener(Recorder::new("a", &log)).unwrap();
    node.set_format(Some(&stereo_48k())).unwrap();
    clear_log(&log);

    node.add_listener(Recorder::new("b", &log)).unwrap();

    assert!(seen_by(&log, "a").is_empty());
    assert_eq!(
        seen_by(&log, "b"),
        vec![
            Seen::Info(LifecycleState::Configured),
            Seen::PortInfo {
                direction: Direction::Input,
                port_id: 0,
                rate: Some(48_000),
            },
        ]
    );
    assert_eq!(node.listener_count(), 2);
}

#[test]
/// Listeners are notified in registration order
fn notifies_in_registration_order() {
    let (mut node, _processor) = new_node();
    let log = event_log();

    for name in ["first", "second", "third"] {
        node.add_listener(Recorder::new(name, &log)).unwrap();
    }
    clear_log(&log);

    node.set_format(Some(&stereo_48k())).unwrap();

    let order: Vec<&str> = log
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, s)| matches!(s, Seen::Info(_)))
        .map(|(name, _)| *name)
        .collect();
    assert_eq!(order, ["first", "second", "third"]);
}

#[test]
fn info_reflects_transitions() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    node.add_listener(Recorder::new("a", &log)).unwrap();
    clear_log(&log);

    node.set_format(Some(&stereo_48k())).unwrap();
    node.send_command(Command::Start).unwrap();
    node.send_command(Command::Suspend).unwrap();
    node.set_format(None).unwrap();

    let states: Vec<LifecycleState> = seen_by(&log, "a")
        .into_iter()
        .filter_map(|s| match s {
            Seen::Info(state) => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        [
            LifecycleState::Configured,
            LifecycleState::Started,
            LifecycleState::Suspended,
            LifecycleState::Created,
        ]
    );
}

#[test]
fn removed_listener_hears_nothing() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    let a = node.add_listener(Recorder::new("a", &log)).unwrap();
    node.add_listener(Recorder::new("b", &log)).unwrap();
    clear_log(&log);

    assert!(node.remove_listener(a));
    assert!(!node.remove_listener(a));
    node.set_format(Some(&stereo_48k())).unwrap();

    assert!(seen_by(&log, "a").is_empty());
    assert!(!seen_by(&log, "b").is_empty());
    assert_eq!(node.listener_count(), 1);
}

#[test]
/// The same sequence number comes back with the result
fn results_carry_sequence_number() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    node.add_listener(Recorder::new("a", &log)).unwrap();
    node.add_listener(Recorder::new("b", &log)).unwrap();
    clear_log(&log);

    node.enumerate_formats(42, 0, 1).unwrap();

    for name in ["a", "b"] {
        let seen = seen_by(&log, name);
        assert_eq!(seen.len(), 1);
        assert!(matches!(
            seen[0],
            Seen::Params {
                seq: 42,
                id: ParamId::EnumFormat,
                ..
            }
        ));
    }
}

#[test]
fn enumerates_single_input_port() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    node.add_listener(Recorder::new("a", &log)).unwrap();
    clear_log(&log);

    assert_eq!(node.enum_ports(5, Direction::Input, 0, 8).unwrap(), 1);
    assert_eq!(
        seen_by(&log, "a"),
        vec![Seen::Ports {
            seq: 5,
            direction: Direction::Input,
            port_id: 0,
        }]
    );

    assert_eq!(node.enum_ports(6, Direction::Output, 0, 8).unwrap(), 0);
    assert_eq!(node.enum_ports(7, Direction::Input, 1, 8).unwrap(), 0);
    assert_eq!(seen_by(&log, "a").len(), 1);

    let info = node.info();
    assert_eq!(info.max_input_ports, 1);
    assert_eq!(info.max_output_ports, 0);
    assert!(info.realtime);
}

#[test]
/// Port operations address input port 0 and act on the node
fn port_operations() {
    let (mut node, _processor) = new_node();

    let port = node.port_info(Direction::Input, 0).unwrap();
    assert!(port.no_ref);
    assert_eq!(port.n_buffers, 0);

    node.port_set_param(Direction::Input, 0, ParamId::Format, Some(&stereo_48k()))
        .unwrap();
    assert_eq!(node.state(), LifecycleState::Configured);

    let io = std::sync::Arc::new(null_sink::IoBuffers::with_buffers(2, 1024));
    node.port_set_io(
        Direction::Input,
        0,
        IoKind::Buffers,
        Some(null_sink::IoBinding::new(io)),
    )
    .unwrap();
    assert!(node.has_io());

    node.port_use_buffers(Direction::Input, 0, 2).unwrap();
    assert_eq!(node.port_info(Direction::Input, 0).unwrap().n_buffers, 2);
    node.port_reuse_buffer(0, 1).unwrap();

    assert_eq!(
        node.port_enum_params(1, Direction::Input, 0, ParamId::EnumFormat, 0, 1)
            .unwrap(),
        1
    );
}

#[test]
fn rejects_unknown_ports() {
    let (mut node, _processor) = new_node();
    let bad = NodeError::InvalidPort {
        direction: Direction::Output,
        port_id: 0,
    };

    assert_eq!(node.port_info(Direction::Output, 0).unwrap_err(), bad);
    assert_eq!(
        node.port_set_param(Direction::Output, 0, ParamId::Format, None),
        Err(bad.clone())
    );
    assert_eq!(
        node.port_set_io(Direction::Input, 1, IoKind::Buffers, None),
        Err(NodeError::InvalidPort {
            direction: Direction::Input,
            port_id: 1,
        })
    );
    assert_eq!(node.port_use_buffers(Direction::Output, 0, 1), Err(bad));
}

#[test]
/// Registering the same listener twice means hearing everything twice
fn does_not_deduplicate_listeners() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    let first = node.add_listener(Recorder::new("a", &log)).unwrap();
    let second = node.add_listener(Recorder::new("a", &log)).unwrap();
    assert_ne!(first, second);
    clear_log(&log);

    node.enumerate_formats(3, 0, 1).unwrap();

    let seen = seen_by(&log, "a");
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(node.listener_count(), 2);
}

#[test]
/// Every listener learns about a new port rate, once per change
fn broadcasts_port_rate_changes() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    node.add_listener(Recorder::new("a", &log)).unwrap();
    node.add_listener(Recorder::new("b", &log)).unwrap();
    clear_log(&log);

    node.set_format(Some(&stereo_48k())).unwrap();
    node.set_format(Some(&common::raw(null_sink::SampleFormat::S16, 1, 48_000)))
        .unwrap();
    node.set_format(None).unwrap();
    node.set_format(None).unwrap();

    for name in ["a", "b"] {
        let rates: Vec<Option<u32>> = seen_by(&log, name)
            .into_iter()
            .filter_map(|s| match s {
                Seen::PortInfo { rate, .. } => Some(rate),
                _ => None,
            })
            .collect();
        assert_eq!(rates, [Some(48_000), None]);
    }
}
