use crate::error::ConfigError;
use crate::net::{ChannelConfig, Segment, SegmentChannel, UnreliableChannel};
use crate::sim::Iteration;
use crate::viz::{VizEventKind, VizLogger};

fn burst() -> Vec<Segment> {
    vec![
        Segment::data(1, "abcd"),
        Segment::data(5, "efgh"),
        Segment::ack(5, false),
    ]
}

fn faulty(cfg: ChannelConfig) -> UnreliableChannel {
    UnreliableChannel::new("test", cfg, 7).expect("valid config")
}

#[test]
fn default_config_is_pass_through() {
    let mut ch = UnreliableChannel::perfect("fwd");
    assert_eq!(ch.name(), "fwd");
    assert_eq!(ch.config(), &ChannelConfig::default());
    for s in burst() {
        ch.send(s);
    }
    assert!(ch.receive().is_empty(), "nothing delivered before advance");

    ch.advance(Iteration(1), None);
    assert_eq!(ch.receive(), burst());
    assert!(ch.receive().is_empty());

    assert_eq!(ch.stats.data_segments, 2);
    assert_eq!(ch.stats.ack_segments, 1);
    assert_eq!(ch.stats.total(), 3);
    assert_eq!(ch.stats.delivered, 3);
    assert_eq!(ch.stats.dropped + ch.stats.corrupted + ch.stats.reordered, 0);
}

#[test]
fn drop_all() {
    let mut ch = faulty(ChannelConfig {
        drop_ratio: 1.0,
        ..ChannelConfig::default()
    });
    for s in burst() {
        ch.send(s);
    }
    ch.advance(Iteration(1), None);
    assert!(ch.receive().is_empty());
    assert_eq!(ch.stats.dropped, 3);
    assert_eq!(ch.stats.delivered, 0);
}

#[test]
fn corruption_only_touches_data_segments() {
    let mut ch = faulty(ChannelConfig {
        corrupt_ratio: 1.0,
        ..ChannelConfig::default()
    });
    for s in burst() {
        ch.send(s);
    }
    ch.advance(Iteration(1), None);
    let got = ch.receive();
    assert_eq!(got.len(), 3);

    for s in &got {
        match s {
            Segment::Data(d) => {
                assert!(d.is_corrupted());
                assert_eq!(d.len(), 4);
            }
            Segment::Ack(a) => assert_eq!((a.ack, a.gap), (5, false)),
        }
    }
    assert_eq!(ch.stats.corrupted, 2);
}

#[test]
fn delayed_segments_are_released_after_delay_iterations() {
    let mut ch = faulty(ChannelConfig {
        delay_ratio: 1.0,
        delay_iterations: 2,
        ..ChannelConfig::default()
    });
    ch.send(Segment::data(1, "abcd"));
    ch.advance(Iteration(3), None);
    assert!(ch.receive().is_empty());
    assert_eq!(ch.delayed_len(), 1);

    ch.advance(Iteration(4), None);
    assert!(ch.receive().is_empty());

    ch.advance(Iteration(5), None);
    assert_eq!(ch.receive(), vec![Segment::data(1, "abcd")]);
    assert_eq!(ch.delayed_len(), 0);
    assert_eq!(ch.stats.delayed, 1);
}

#[test]
fn duplicate_all_delivers_each_segment_twice() {
    let mut ch = faulty(ChannelConfig {
        duplicate_ratio: 1.0,
        ..ChannelConfig::default()
    });
    ch.send(Segment::data(1, "abcd"));
    ch.send(Segment::ack(5, true));
    ch.advance(Iteration(1), None);

    let got = ch.receive();
    assert_eq!(
        got,
        vec![
            Segment::data(1, "abcd"),
            Segment::data(1, "abcd"),
            Segment::ack(5, true),
            Segment::ack(5, true),
        ]
    );
    assert_eq!(ch.stats.duplicated, 2);
    assert_eq!(ch.stats.delivered, 4);
}

#[test]
fn reorder_keeps_the_same_multiset() {
    let mut ch = faulty(ChannelConfig {
        reorder_ratio: 1.0,
        ..ChannelConfig::default()
    });
    for s in burst() {
        ch.send(s);
    }
    ch.advance(Iteration(1), None);

    let mut got: Vec<String> = ch
        .receive()
        .iter()
        .map(|s| serde_json::to_string(s).expect("serialize"))
        .collect();
    let mut want: Vec<String> = burst()
        .iter()
        .map(|s| serde_json::to_string(s).expect("serialize"))
        .collect();
    got.sort();
    want.sort();
    assert_eq!(got, want);
}

#[test]
fn ratio_outside_unit_interval_is_rejected() {
    let cfg = ChannelConfig {
        corrupt_ratio: 1.5,
        ..ChannelConfig::default()
    };
    let err = UnreliableChannel::new("bad", cfg, 1).expect_err("invalid ratio");
    assert!(matches!(
        err,
        ConfigError::InvalidRatio {
            name: "corrupt_ratio",
            ..
        }
    ));
    assert!(err.to_string().contains("corrupt_ratio"));

    let cfg = ChannelConfig {
        drop_ratio: -0.1,
        ..ChannelConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn same_seed_gives_same_fault_sequence() {
    let cfg = ChannelConfig {
        drop_ratio: 0.3,
        corrupt_ratio: 0.3,
        reorder_ratio: 0.3,
        duplicate_ratio: 0.2,
        ..ChannelConfig::default()
    };
    let run = |seed: u64| {
        let mut ch = UnreliableChannel::new("fwd", cfg.clone(), seed).expect("valid config");
        let mut delivered = Vec::new();
        for i in 1..=20u64 {
            for s in burst() {
                ch.send(s);
            }
            ch.advance(Iteration(i), None);
            delivered.extend(ch.receive());
        }
        (delivered, ch.stats)
    };

    let (a, sa) = run(42);
    let (b, sb) = run(42);
    assert_eq!(a, b);
    assert_eq!(sa, sb);
}

#[test]
fn advance_records_viz_events_with_channel_name() {
    let mut ch = faulty(ChannelConfig {
        drop_ratio: 1.0,
        ..ChannelConfig::default()
    });
    let mut viz = VizLogger::default();
    ch.send(Segment::data(1, "abcd"));
    ch.advance(Iteration(2), Some(&mut viz));

    assert_eq!(viz.events.len(), 2);
    assert!(matches!(viz.events[0].kind, VizEventKind::Transmit { .. }));
    assert!(matches!(viz.events[1].kind, VizEventKind::Drop { .. }));
    assert!(
        viz.events
            .iter()
            .all(|e| e.iteration == 2 && e.channel.as_deref() == Some("test"))
    );
}
