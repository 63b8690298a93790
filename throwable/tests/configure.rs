use std::hint::black_box;

use throwable::{capturer, configure, CaptureConfig, Error, Throw, Throwable};

#[inline(never)]
fn recurse(depth: usize) -> Throwable {
    if depth == 0 {
        black_box(Throwable::new("configured", None))
    } else {
        black_box(recurse(depth - 1))
    }
}

#[test]
fn global_capturer_is_configured_once() {
    let invalid = CaptureConfig {
        initial_depth: 0,
        growth_factor: 2,
    };
    assert!(matches!(configure(invalid), Err(Error::InvalidConfig(_))));

    let config = CaptureConfig {
        initial_depth: 2,
        growth_factor: 2,
    };
    configure(config.clone()).unwrap();
    assert_eq!(capturer().config(), &config);

    assert!(matches!(
        configure(CaptureConfig::default()),
        Err(Error::AlreadyConfigured)
    ));

    // Tiny buffers still end up with the whole stack
    let shallow = recurse(0);
    let deep = recurse(20);
    assert_eq!(
        deep.stack_trace().len(),
        shallow.stack_trace().len() + 20
    );
}
