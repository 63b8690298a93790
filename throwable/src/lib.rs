//! Error values that carry the call stack of the place they were created.
//!
//! A [`Throwable`] holds a message, an optional cause, and a [`StackTrace`]
//! captured by its constructor, where frame 0 is the function that called the
//! constructor. Stacks of any depth are captured in full; see
//! [`StackCapturer`] for how, and [`Throwable::with_depth_limit`] for the
//! cheaper, truncating variant.
//!
//! Throwables are not a replacement for `Result` errors. They are for the
//! failures nobody is expected to recover from, where the question is where
//! things went wrong rather than what to do about it.
//!
//! New named categories wrap a [`Throwable`] and forward the [`Throw`] trait
//! to it, the way [`NullReference`] does.

pub mod capture;
pub mod config;
pub mod eliminate;
pub mod error;
pub mod frames;
pub mod metric_consts;
pub mod null_reference;
pub mod render;
pub mod throwable;

pub use capture::{capturer, configure, CaptureFrames, StackCapturer, Unwinder, MAX_BOUNDED_DEPTH};
pub use config::CaptureConfig;
pub use eliminate::{eliminate_recursion, recursion_runs, Run};
pub use error::Error;
pub use frames::{FrameId, FrameResolver, ResolvedFrame, StackTrace, SymbolResolver};
pub use null_reference::NullReference;
pub use render::write_throwable;
pub use throwable::{Causes, Throw, Throwable, EXCEPTION_LABEL, MAX_CAUSE_DEPTH};
