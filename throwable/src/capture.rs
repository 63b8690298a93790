use std::sync::OnceLock;

use tracing::debug;

use crate::{
    config::CaptureConfig,
    error::Error,
    frames::{FrameId, StackTrace},
    metric_consts::{STACK_CAPTURES, STACK_CAPTURE_DEPTH, STACK_CAPTURE_RETRIES},
};

/// The primitive every capture is built on: walk the current stack and
/// record frame ids into a caller-provided buffer.
pub trait CaptureFrames {
    /// Fills `buf` with up to `buf.len()` frame ids and returns how many were
    /// written. `skip` counts from the caller of `callers`: 0 makes that caller
    /// the first frame written, 1 its caller, and so on.
    fn callers(&self, skip: usize, buf: &mut [FrameId]) -> usize;
}

/// Walks the real stack of the current thread with the system unwinder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwinder;

impl CaptureFrames for Unwinder {
    #[inline(never)]
    fn callers(&self, skip: usize, buf: &mut [FrameId]) -> usize {
        // 1 to hide this function from the result. black_box keeps the call out of tail
        // position, a tail call would drop this frame and throw the count off by one
        std::hint::black_box(unwind_into(skip + 1, buf))
    }
}

// The unwinder reports its own internal frames first, and how many of those there are
// depends on the platform and backend. Instead of guessing, we find our own frame on the
// stack and only count from there.
#[inline(never)]
fn unwind_into(skip: usize, buf: &mut [FrameId]) -> usize {
    let anchor = unwind_into as *const () as usize;
    if let Some(written) = walk(Some(anchor), skip, buf) {
        return written;
    }
    // Some backends can't report the start address of a frame's function, in which case
    // we'd never see the anchor. A stack with a few extra frames on top is still more
    // useful than an empty one.
    debug!(anchor, "could not locate capture frame, keeping unwinder frames");
    walk(None, 0, buf).unwrap_or(0)
}

fn walk(anchor: Option<usize>, skip: usize, buf: &mut [FrameId]) -> Option<usize> {
    let mut anchored = anchor.is_none();
    let mut to_skip = skip;
    let mut written = 0;
    backtrace::trace(|frame| {
        if !anchored {
            anchored = Some(frame.symbol_address() as usize) == anchor;
            return true;
        }
        if to_skip > 0 {
            to_skip -= 1;
            return true;
        }
        if written == buf.len() {
            return false;
        }
        buf[written] = FrameId::from(frame.ip());
        written += 1;
        written < buf.len()
    });
    anchored.then_some(written)
}

/// The largest buffer a bounded capture allocates, in frames. Far deeper than
/// any real stack, but small enough that `usize::MAX` as a limit is harmless.
pub const MAX_BOUNDED_DEPTH: usize = 1 << 20;

/// Captures call stacks of unknown depth.
///
/// The unlimited mode guesses a buffer size, and grows it whenever the
/// primitive fills it completely: a full buffer can't be told apart from a
/// truncated stack, so only a result strictly shorter than the buffer is
/// trusted. The bounded mode makes exactly one attempt and silently truncates,
/// for call sites that can't afford the retries.
#[derive(Debug, Clone)]
pub struct StackCapturer<C = Unwinder> {
    primitive: C,
    config: CaptureConfig,
}

impl Default for StackCapturer<Unwinder> {
    fn default() -> Self {
        Self::new(Unwinder, CaptureConfig::default())
    }
}

impl<C: CaptureFrames> StackCapturer<C> {
    pub fn new(primitive: C, config: CaptureConfig) -> Self {
        Self { primitive, config }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Captures the whole stack. `skip` counts from the caller of `capture`,
    /// as for [`CaptureFrames::callers`].
    #[inline(never)]
    pub fn capture(&self, skip: usize) -> StackTrace {
        // Unvalidated configs must not turn this into an endless loop
        let mut capacity = self.config.initial_depth.max(1);
        let growth_factor = self.config.growth_factor.max(2);
        let mut attempt = 0;
        loop {
            let mut buf = vec![FrameId::default(); capacity];
            // Retries happen in this loop, not in a nested call, so they add no
            // frames to skip beyond the first attempt's
            let depth = self.primitive.callers(skip + 1, &mut buf);
            if !is_full(depth, capacity) {
                metrics::counter!(STACK_CAPTURES, "mode" => "unlimited").increment(1);
                metrics::histogram!(STACK_CAPTURE_DEPTH).record(depth as f64);
                // Copy out the frames so the oversized scratch buffer is freed
                return StackTrace::from(&buf[..depth]);
            }

            attempt += 1;
            let grown = capacity.saturating_mul(growth_factor);
            debug!(attempt, capacity, grown, "stack filled capture buffer, retrying");
            metrics::counter!(STACK_CAPTURE_RETRIES).increment(1);
            capacity = grown;
        }
    }

    /// Captures at most `limit` frames in a single attempt. Deeper stacks are
    /// truncated. Limits above [`MAX_BOUNDED_DEPTH`] are treated as that depth.
    #[inline(never)]
    pub fn capture_bounded(&self, skip: usize, limit: usize) -> StackTrace {
        let capacity = limit.min(MAX_BOUNDED_DEPTH);
        if capacity < limit {
            debug!(limit, capacity, "bounded capture limit clamped");
        }
        let mut buf = vec![FrameId::default(); capacity];
        let depth = self.primitive.callers(skip + 1, &mut buf);
        // Only checked for overruns, a full buffer is fine here
        is_full(depth, capacity);
        buf.truncate(depth);
        metrics::counter!(STACK_CAPTURES, "mode" => "bounded").increment(1);
        metrics::histogram!(STACK_CAPTURE_DEPTH).record(depth as f64);
        StackTrace::from(buf)
    }
}

// Whether a capture filled its buffer exactly. The primitive must never report more
// frames than fit in the buffer, if it does we can't trust anything it wrote.
fn is_full(depth: usize, capacity: usize) -> bool {
    if depth > capacity {
        panic!("BUG: stack capture reported {depth} frames for a buffer of {capacity}");
    }
    depth == capacity
}

static CAPTURER: OnceLock<StackCapturer> = OnceLock::new();

/// Sets the configuration of the capturer used by the throwable constructors.
/// Can be called at most once, and only before the first throwable is created.
pub fn configure(config: CaptureConfig) -> Result<(), Error> {
    config.validate()?;
    CAPTURER
        .set(StackCapturer::new(Unwinder, config))
        .map_err(|_| Error::AlreadyConfigured)
}

/// The process-wide capturer, with default settings unless [`configure`] ran first.
pub fn capturer() -> &'static StackCapturer {
    CAPTURER.get_or_init(StackCapturer::default)
}
