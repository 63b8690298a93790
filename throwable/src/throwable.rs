use std::{error::Error, fmt, io, sync::Arc};

use tracing::warn;

use crate::{
    capture::capturer,
    eliminate::eliminate_recursion,
    frames::{FrameResolver, StackTrace, SymbolResolver},
    render::write_throwable,
};

pub const EXCEPTION_LABEL: &str = "Exception";

// Cause chains are built from shared, immutable links and so can't normally form a
// cycle, but nothing walks an unbounded chain regardless.
pub const MAX_CAUSE_DEPTH: usize = 64;

// Frames between a public constructor's caller and the capturer: the constructor itself.
const CONSTRUCTOR_FRAMES: usize = 1;

/// An error value that knows where it was created.
///
/// Everything that can be thrown implements this: [`Throwable`] itself, and
/// the named categories wrapping it, like [`crate::NullReference`].
pub trait Throw: Error + Send + Sync + 'static {
    /// The throwable this one wraps, if any.
    fn caused_by(&self) -> Option<&Arc<dyn Throw>>;

    fn message(&self) -> &str;

    /// The stack as captured when this throwable was created, innermost frame first.
    fn stack_trace(&self) -> &StackTrace;

    fn set_stack_trace(&mut self, stack: StackTrace);

    fn as_error(&self) -> &(dyn Error + 'static);

    /// Like [`Throw::stack_trace`], with runs of self-recursive calls collapsed
    /// to a single frame. Cross recursion (`f -> g -> f -> g`) is kept as is.
    fn eliminated_stack_trace(&self) -> StackTrace {
        StackTrace::from(eliminate_recursion(self.stack_trace()))
    }

    /// Every throwable in the cause chain, starting with the direct cause.
    fn causes(&self) -> Causes<'_> {
        Causes::new(self.caused_by().map(|c| &**c), MAX_CAUSE_DEPTH)
    }

    /// Writes this throwable, its stack and the stacks of its causes to `w`,
    /// symbolized against the running binary.
    fn render(&self, w: &mut dyn io::Write) -> io::Result<()>
    where
        Self: Sized,
    {
        self.render_with(&SymbolResolver, w)
    }

    fn render_with(&self, resolver: &dyn FrameResolver, w: &mut dyn io::Write) -> io::Result<()>
    where
        Self: Sized,
    {
        write_throwable(self, resolver, w)
    }
}

/// Walks a cause chain, stopping after a fixed number of links.
pub struct Causes<'a> {
    next: Option<&'a dyn Throw>,
    remaining: usize,
    max_depth: usize,
}

impl<'a> Causes<'a> {
    pub fn new(first: Option<&'a dyn Throw>, max_depth: usize) -> Self {
        Causes {
            next: first,
            remaining: max_depth,
            max_depth,
        }
    }
}

impl<'a> Iterator for Causes<'a> {
    type Item = &'a dyn Throw;

    fn next(&mut self) -> Option<&'a dyn Throw> {
        let current = self.next?;
        if self.remaining == 0 {
            warn!(max_depth = self.max_depth, "cause chain too long, truncating");
            self.next = None;
            return None;
        }
        self.remaining -= 1;
        self.next = current.caused_by().map(|c| &**c);
        Some(current)
    }
}

/// The base throwable: a message, an optional cause and the stack captured
/// when it was created.
///
/// This is meant for failures nobody is expected to handle, where knowing
/// where things went wrong matters more than the error type. Recoverable
/// errors should stay ordinary `Result` errors.
#[derive(Debug, Clone)]
pub struct Throwable {
    message: String,
    cause: Option<Arc<dyn Throw>>,
    stack_trace: StackTrace,
}

impl Throwable {
    /// Creates a throwable, capturing the whole stack of the caller.
    #[inline(never)]
    pub fn new(message: impl Into<String>, cause: Option<Arc<dyn Throw>>) -> Self {
        let stack_trace = capturer().capture(CONSTRUCTOR_FRAMES);
        Self::from_parts(message, cause, stack_trace)
    }

    /// Like [`Throwable::new`], but captures at most `limit` frames, without
    /// retrying. Use this when only the innermost frames are interesting, or
    /// when creating throwables is hot enough that stack capture shows up.
    #[inline(never)]
    pub fn with_depth_limit(
        message: impl Into<String>,
        cause: Option<Arc<dyn Throw>>,
        limit: usize,
    ) -> Self {
        let stack_trace = capturer().capture_bounded(CONSTRUCTOR_FRAMES, limit);
        Self::from_parts(message, cause, stack_trace)
    }

    /// Converts any error into a throwable, using its `Display` output as the
    /// message.
    ///
    /// The stack is captured here, so it shows where the conversion happened,
    /// not where `err` was created.
    #[inline(never)]
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        let stack_trace = capturer().capture(CONSTRUCTOR_FRAMES);
        Self::from_parts(err.to_string(), None, stack_trace)
    }

    /// Assembles a throwable from a stack captured elsewhere, for constructors
    /// that capture on behalf of the value they build.
    pub fn from_parts(
        message: impl Into<String>,
        cause: Option<Arc<dyn Throw>>,
        stack_trace: StackTrace,
    ) -> Self {
        Throwable {
            message: message.into(),
            cause,
            stack_trace,
        }
    }
}

impl fmt::Display for Throwable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{EXCEPTION_LABEL}: {}", self.message)
    }
}

impl Error for Throwable {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|c| c.as_error())
    }
}

impl Throw for Throwable {
    fn caused_by(&self) -> Option<&Arc<dyn Throw>> {
        self.cause.as_ref()
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn stack_trace(&self) -> &StackTrace {
        &self.stack_trace
    }

    fn set_stack_trace(&mut self, stack: StackTrace) {
        self.stack_trace = stack;
    }

    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frames::FrameId;

    fn link(message: &str, cause: Option<Arc<dyn Throw>>) -> Arc<dyn Throw> {
        Arc::new(Throwable::from_parts(message, cause, StackTrace::empty()))
    }

    #[test]
    fn display_uses_category_label() {
        let t = Throwable::from_parts("it broke", None, StackTrace::empty());
        assert_eq!(t.to_string(), "Exception: it broke");
        assert_eq!(t.message(), "it broke");
    }

    #[test]
    fn set_stack_trace_replaces_whole_stack() {
        let mut t = Throwable::new("replace me", None);
        let stack = StackTrace::from(vec![FrameId::new(3), FrameId::new(2), FrameId::new(1)]);

        t.set_stack_trace(stack.clone());

        assert_eq!(t.stack_trace(), &stack);
    }

    #[test]
    fn eliminated_stack_trace_collapses_runs() {
        let frames = [1, 1, 1, 2, 3].map(FrameId::new);
        let t = Throwable::from_parts("recursive", None, StackTrace::from(&frames[..]));

        assert_eq!(
            t.eliminated_stack_trace().frames(),
            &[1, 2, 3].map(FrameId::new)
        );
        // The raw stack is left alone
        assert_eq!(t.stack_trace().len(), 5);
    }

    #[test]
    fn causes_walk_the_chain() {
        let root = link("root", None);
        let middle = link("middle", Some(root));
        let top = Throwable::from_parts("top", Some(middle), StackTrace::empty());

        let messages: Vec<_> = top.causes().map(|c| c.message().to_string()).collect();
        assert_eq!(messages, vec!["middle", "root"]);
    }

    #[test]
    fn causes_are_bounded() {
        let mut chain = link("0", None);
        for i in 1..(MAX_CAUSE_DEPTH + 10) {
            chain = link(&i.to_string(), Some(chain));
        }
        let top = Throwable::from_parts("top", Some(chain), StackTrace::empty());

        assert_eq!(top.causes().count(), MAX_CAUSE_DEPTH);
    }

    #[test]
    fn shared_cause() {
        let cause = link("shared", None);
        let a = Throwable::from_parts("a", Some(cause.clone()), StackTrace::empty());
        let b = Throwable::from_parts("b", Some(cause.clone()), StackTrace::empty());

        assert!(Arc::ptr_eq(a.caused_by().unwrap(), b.caused_by().unwrap()));
        assert_eq!(Arc::strong_count(&cause), 3);
    }

    #[test]
    fn caused_by_on_shared_throwable() {
        let root = link("root", None);
        let top: Arc<dyn Throw> = Arc::new(Throwable::from_parts(
            "top",
            Some(root.clone()),
            StackTrace::empty(),
        ));

        let cause = top.caused_by().unwrap();
        assert!(Arc::ptr_eq(cause, &root));
        assert!(cause.caused_by().is_none());
        assert_eq!(top.source().unwrap().to_string(), "Exception: root");
    }

    #[test]
    fn source_exposes_cause() {
        let t = Throwable::from_parts("top", Some(link("root", None)), StackTrace::empty());
        assert_eq!(t.source().unwrap().to_string(), "Exception: root");
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Throwable>();
    }
}
