use std::{
    hint::black_box,
    io::{self, Write},
    sync::Arc,
};

use envconfig::Envconfig;
use throwable::{NullReference, Throw, Throwable};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;

mod config;

fn setup_tracing() {
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

#[inline(never)]
fn recurse(depth: usize) -> Throwable {
    if depth == 0 {
        black_box(Throwable::new("thrown from the bottom of a recursion", None))
    } else {
        black_box(recurse(depth - 1))
    }
}

fn dump(out: &mut dyn Write, title: &str, t: &dyn Throw, symbolize: bool) -> io::Result<()> {
    writeln!(out, "== {title}")?;
    writeln!(out, "{t}")?;
    writeln!(out, "raw: {:?}", t.stack_trace())?;
    writeln!(out, "eliminated: {:?}", t.eliminated_stack_trace())?;
    if symbolize {
        throwable::write_throwable(t, &throwable::SymbolResolver, out)?;
    }
    writeln!(out)
}

fn main() -> anyhow::Result<()> {
    setup_tracing();

    let config = Config::init_from_env()?;
    throwable::configure(config.capture.clone())?;
    info!(
        initial_depth = config.capture.initial_depth,
        growth_factor = config.capture.growth_factor,
        "capturer configured"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let plain = Throwable::new("an exception", None);
    dump(&mut out, "new", &plain, config.symbolize)?;

    let bounded = Throwable::with_depth_limit("an exception", None, config.depth_limit);
    dump(&mut out, "bounded", &bounded, config.symbolize)?;

    let recursive: Arc<dyn Throw> = Arc::new(recurse(config.recursion_depth));
    dump(&mut out, "recursive", &*recursive, config.symbolize)?;

    let wrapped = NullReference::new("wrapping a recursive failure", Some(recursive));
    dump(&mut out, "cause chain", &wrapped, config.symbolize)?;

    Ok(())
}
