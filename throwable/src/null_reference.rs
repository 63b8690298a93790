use std::{error::Error, fmt, sync::Arc};

use crate::{
    capture::capturer,
    frames::StackTrace,
    throwable::{Throw, Throwable},
};

/// Thrown when something that must be present turns out to be missing.
///
/// A named category with nothing beyond what [`Throwable`] holds; every
/// operation is forwarded to the wrapped value. New categories follow the same
/// pattern.
#[derive(Debug, Clone)]
pub struct NullReference(Throwable);

impl NullReference {
    #[inline(never)]
    pub fn new(message: impl Into<String>, cause: Option<Arc<dyn Throw>>) -> Self {
        // Capture here rather than in Throwable::new, which would add this frame on top
        let stack_trace = capturer().capture(1);
        NullReference(Throwable::from_parts(message, cause, stack_trace))
    }

    pub fn into_inner(self) -> Throwable {
        self.0
    }
}

impl From<Throwable> for NullReference {
    fn from(inner: Throwable) -> Self {
        NullReference(inner)
    }
}

impl AsRef<Throwable> for NullReference {
    fn as_ref(&self) -> &Throwable {
        &self.0
    }
}

impl fmt::Display for NullReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for NullReference {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl Throw for NullReference {
    fn caused_by(&self) -> Option<&Arc<dyn Throw>> {
        self.0.caused_by()
    }

    fn message(&self) -> &str {
        self.0.message()
    }

    fn stack_trace(&self) -> &StackTrace {
        self.0.stack_trace()
    }

    fn set_stack_trace(&mut self, stack: StackTrace) {
        self.0.set_stack_trace(stack)
    }

    fn as_error(&self) -> &(dyn Error + 'static) {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frames::FrameId;

    #[test]
    fn forwards_to_inner() {
        let cause: Arc<dyn Throw> = Arc::new(Throwable::new("root", None));
        let mut t = NullReference::new("missing value", Some(cause));

        assert_eq!(t.message(), "missing value");
        assert_eq!(t.to_string(), "Exception: missing value");
        assert_eq!(t.caused_by().unwrap().message(), "root");
        assert!(!t.stack_trace().is_empty());

        let stack = StackTrace::from(vec![FrameId::new(5), FrameId::new(5)]);
        t.set_stack_trace(stack.clone());
        assert_eq!(t.stack_trace(), &stack);
        assert_eq!(t.as_ref().stack_trace(), &stack);
        assert_eq!(t.eliminated_stack_trace().frames(), &[FrameId::new(5)]);
    }

    #[test]
    fn can_be_a_cause() {
        let null: Arc<dyn Throw> = Arc::new(NullReference::new("no user", None));
        let t = Throwable::new("request failed", Some(null));

        assert_eq!(t.source().unwrap().to_string(), "Exception: no user");
        assert_eq!(t.causes().count(), 1);
    }
}
