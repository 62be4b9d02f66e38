mod common;

use common::{clear_log, event_log, new_node, raw, seen_by, stereo_48k, Recorder, Seen};
use null_sink::{
    AudioInfoRaw, ErrorKind, FormatError, FormatParam, LifecycleState, MediaSubtype, MediaType, Node, NodeError,
    ParamId, SampleFormat, ADVERTISED_FORMAT, MAX_CHANNELS, MAX_RATE,
};

#[test]
/// Every channel count and the rate bounds are accepted and read back unchanged
fn accepts_every_valid_channel_count() {
    let (mut node, _processor) = new_node();

    for channels in 1..=MAX_CHANNELS {
        for rate in [1, 44_100, 48_000, MAX_RATE] {
            node.set_format(Some(&raw(SampleFormat::F32, channels, rate)))
                .unwrap();

            let format = node.format().unwrap();
            assert_eq!(format.channels(), channels);
            assert_eq!(format.rate(), rate);
            assert_eq!(format.sample_format(), SampleFormat::F32);
        }
    }
    assert_eq!(node.state(), LifecycleState::Configured);
}

#[test]
/// Out-of-range candidates fail and leave the previous format in place
fn rejects_out_of_range_and_keeps_previous() {
    let (mut node, _processor) = new_node();
    node.set_format(Some(&stereo_48k())).unwrap();
    let before = node.format();

    let cases = [
        (raw(SampleFormat::F32, 0, 48_000), FormatError::InvalidChannels(0)),
        (raw(SampleFormat::F32, 65, 48_000), FormatError::InvalidChannels(65)),
        (raw(SampleFormat::F32, 2, 0), FormatError::InvalidRate(0)),
        (raw(SampleFormat::F32, 2, 192_001), FormatError::InvalidRate(192_001)),
    ];

    for (candidate, expected) in cases {
        let err = node.set_format(Some(&candidate)).unwrap_err();
        assert_eq!(err, NodeError::InvalidFormat(expected));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.errno(), -22);
        assert_eq!(node.format(), before);
    }
    assert_eq!(node.state(), LifecycleState::Configured);
}

#[test]
/// Channels are checked before the rate
fn reports_channels_before_rate() {
    let (mut node, _processor) = new_node();
    let err = node
        .set_format(Some(&raw(SampleFormat::F32, 0, 0)))
        .unwrap_err();
    assert_eq!(err, NodeError::InvalidFormat(FormatError::InvalidChannels(0)));
}

#[test]
fn rejects_non_raw_media() {
    let (mut node, _processor) = new_node();

    for (media_type, media_subtype) in [
        (MediaType::Audio, MediaSubtype::Mp3),
        (MediaType::Audio, MediaSubtype::Dsp),
        (MediaType::Video, MediaSubtype::Raw),
    ] {
        let err = node
            .set_format(Some(&FormatParam::other(media_type, media_subtype)))
            .unwrap_err();
        assert_eq!(
            err,
            NodeError::InvalidFormat(FormatError::UnsupportedMediaType {
                media_type,
                media_subtype
            })
        );
    }

    // audio/raw without properties
    let bare = FormatParam {
        media_type: MediaType::Audio,
        media_subtype: MediaSubtype::Raw,
        raw: None,
    };
    assert_eq!(
        node.set_format(Some(&bare)).unwrap_err(),
        NodeError::InvalidFormat(FormatError::MissingAudioInfo)
    );

    assert_eq!(node.format(), None);
    assert_eq!(node.state(), LifecycleState::Created);
}

#[test]
/// Sample encoding is recorded but never restricts acceptance
fn accepts_any_sample_encoding() {
    let (mut node, _processor) = new_node();

    for format in [SampleFormat::S16, SampleFormat::F64P, SampleFormat::Unknown] {
        node.set_format(Some(&raw(format, 2, 44_100))).unwrap();
        assert_eq!(node.format().unwrap().sample_format(), format);
    }
}

#[test]
fn clearing_is_idempotent() {
    let (mut node, _processor) = new_node();

    node.set_format(None).unwrap();
    assert_eq!(node.state(), LifecycleState::Created);

    node.set_format(Some(&stereo_48k())).unwrap();
    node.set_format(None).unwrap();
    node.set_format(None).unwrap();
    assert_eq!(node.format(), None);
    assert_eq!(node.state(), LifecycleState::Created);
}

#[test]
/// Exactly one format is advertised, at index 0
fn advertises_one_format() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    node.add_listener(Recorder::new("a", &log)).unwrap();
    clear_log(&log);

    assert_eq!(node.enumerate_formats(7, 0, 10).unwrap(), 1);
    assert_eq!(
        seen_by(&log, "a"),
        vec![Seen::Params {
            seq: 7,
            id: ParamId::EnumFormat,
            index: 0,
            next: 1,
            param: FormatParam::audio_raw(ADVERTISED_FORMAT),
        }]
    );
    assert_eq!(
        ADVERTISED_FORMAT,
        AudioInfoRaw::new(SampleFormat::F32P, 2, 48_000)
    );

    clear_log(&log);
    assert_eq!(node.enumerate_formats(8, 1, 10).unwrap(), 0);
    assert!(seen_by(&log, "a").is_empty());
}

#[test]
fn enumeration_needs_a_limit() {
    let (mut node, _processor) = new_node();
    let err = node.enumerate_formats(1, 0, 0).unwrap_err();
    assert!(matches!(err, NodeError::InvalidArgument(_)));
    assert_eq!(err.errno(), -22);
}

#[test]
/// The negotiated format can be read back through enumeration
fn reads_back_current_format() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    node.add_listener(Recorder::new("a", &log)).unwrap();

    assert_eq!(node.enum_params(1, ParamId::Format, 0, 1).unwrap(), 0);

    let candidate = raw(SampleFormat::S32, 6, 96_000);
    node.set_format(Some(&candidate)).unwrap();
    clear_log(&log);

    assert_eq!(node.enum_params(2, ParamId::Format, 0, 1).unwrap(), 1);
    assert_eq!(
        seen_by(&log, "a"),
        vec![Seen::Params {
            seq: 2,
            id: ParamId::Format,
            index: 0,
            next: 1,
            param: candidate,
        }]
    );

    // other ids produce nothing
    assert_eq!(node.enum_params(3, ParamId::Latency, 0, 1).unwrap(), 0);
}

#[test]
fn only_format_is_writable() {
    let (mut node, _processor) = new_node();

    let err = node
        .set_param(ParamId::Props, Some(&stereo_48k()))
        .unwrap_err();
    assert_eq!(err, NodeError::UnsupportedParam(ParamId::Props));
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert_eq!(err.errno(), -95);
    assert_eq!(node.format(), None);
}

#[test]
/// Listeners hear about accepted changes and clears, not rejections
fn notifies_param_changes() {
    let (mut node, _processor) = new_node();
    let log = event_log();
    node.add_listener(Recorder::new("a", &log)).unwrap();
    clear_log(&log);

    let candidate = stereo_48k();
    node.set_format(Some(&candidate)).unwrap();
    node.set_format(Some(&raw(SampleFormat::F32, 0, 48_000)))
        .unwrap_err();
    node.set_format(None).unwrap();

    let changes: Vec<Seen> = seen_by(&log, "a")
        .into_iter()
        .filter(|s| matches!(s, Seen::ParamChanged(..)))
        .collect();
    assert_eq!(
        changes,
        vec![
            Seen::ParamChanged(ParamId::Format, Some(candidate)),
            Seen::ParamChanged(ParamId::Format, None),
        ]
    );
}

#[test]
fn port_rate_follows_format() {
    let (mut node, _processor) = new_node();
    let input = null_sink::Direction::Input;

    assert_eq!(node.port_info(input, 0).unwrap().rate, None);
    node.set_format(Some(&raw(SampleFormat::F32, 1, 22_050)))
        .unwrap();
    assert_eq!(node.port_info(input, 0).unwrap().rate, Some(22_050));
    node.set_format(None).unwrap();
    assert_eq!(node.port_info(input, 0).unwrap().rate, None);
}
