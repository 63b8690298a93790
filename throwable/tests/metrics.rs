use std::hint::black_box;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use throwable::{
    metric_consts::{STACK_CAPTURES, STACK_CAPTURE_DEPTH, STACK_CAPTURE_RETRIES},
    Throwable,
};

#[inline(never)]
fn recurse(depth: usize, bounded: bool) -> Throwable {
    if depth == 0 {
        if bounded {
            Throwable::with_depth_limit("bounded", None, 4)
        } else {
            Throwable::new("unlimited", None)
        }
    } else {
        black_box(recurse(depth - 1, bounded))
    }
}

#[test]
fn capture_reports_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().unwrap();

    recurse(32, false);
    recurse(32, true);

    let snapshot = snapshotter.snapshot().into_vec();
    let counter = |name: &str, mode: Option<&str>| -> u64 {
        snapshot
            .iter()
            .filter(|(key, _, _, _)| key.key().name() == name)
            .filter(|(key, _, _, _)| match mode {
                Some(mode) => key
                    .key()
                    .labels()
                    .any(|l| l.key() == "mode" && l.value() == mode),
                None => true,
            })
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(v) => *v,
                _ => 0,
            })
            .sum()
    };

    assert_eq!(counter(STACK_CAPTURES, Some("unlimited")), 1);
    assert_eq!(counter(STACK_CAPTURES, Some("bounded")), 1);
    // A 32 deep recursion can't fit the default 16 frame buffer
    assert_eq!(counter(STACK_CAPTURE_RETRIES, None), 1);

    let depths = snapshot
        .iter()
        .find(|(key, _, _, _)| key.key().name() == STACK_CAPTURE_DEPTH)
        .map(|(_, _, _, value)| match value {
            DebugValue::Histogram(values) => values.iter().map(|v| v.into_inner()).collect(),
            _ => Vec::new(),
        })
        .unwrap();
    assert_eq!(depths.len(), 2);
    assert!(depths.contains(&4.0));
    assert!(depths.iter().any(|d| *d > 32.0));
}
