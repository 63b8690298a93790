use std::{ffi::c_void, fmt, ops::Deref, sync::Arc};

use serde::Serialize;

/// Identifies one activation record on the call stack, as the instruction
/// pointer observed when the stack was captured.
///
/// Frame ids are only meaningful inside the process that captured them. To
/// ship a frame anywhere else, resolve it into a [`ResolvedFrame`] first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FrameId(usize);

impl FrameId {
    pub const fn new(ip: usize) -> Self {
        FrameId(ip)
    }

    pub const fn ip(self) -> usize {
        self.0
    }

    pub(crate) fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }
}

impl From<*mut c_void> for FrameId {
    fn from(ip: *mut c_void) -> Self {
        FrameId(ip as usize)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({:#x})", self.0)
    }
}

/// A captured call stack, innermost frame first.
///
/// The frames are frozen once captured; cloning shares them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StackTrace(Arc<[FrameId]>);

impl StackTrace {
    pub fn empty() -> Self {
        StackTrace(Arc::from(Vec::new()))
    }

    pub fn frames(&self) -> &[FrameId] {
        &self.0
    }
}

impl Default for StackTrace {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for StackTrace {
    type Target = [FrameId];

    fn deref(&self) -> &[FrameId] {
        &self.0
    }
}

impl From<Vec<FrameId>> for StackTrace {
    fn from(frames: Vec<FrameId>) -> Self {
        StackTrace(Arc::from(frames))
    }
}

impl From<&[FrameId]> for StackTrace {
    fn from(frames: &[FrameId]) -> Self {
        StackTrace(Arc::from(frames))
    }
}

impl FromIterator<FrameId> for StackTrace {
    fn from_iter<I: IntoIterator<Item = FrameId>>(iter: I) -> Self {
        StackTrace(iter.into_iter().collect())
    }
}

impl fmt::Debug for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

// A frame after symbolification. A single frame id can resolve to several of these
// when the compiler inlined functions into the one that was executing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedFrame {
    pub raw_id: String, // The frame id this was resolved from, in hex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>, // Demangled function name, without the hash suffix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>, // The file the function is defined in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl ResolvedFrame {
    pub fn unresolved(frame: FrameId) -> Self {
        ResolvedFrame {
            raw_id: frame.to_string(),
            name: None,
            source: None,
            line: None,
            column: None,
        }
    }

    fn from_symbol(frame: FrameId, symbol: &backtrace::Symbol) -> Self {
        ResolvedFrame {
            raw_id: frame.to_string(),
            name: symbol.name().map(|n| format!("{n:#}")),
            source: symbol.filename().map(|p| p.display().to_string()),
            line: symbol.lineno(),
            column: symbol.colno(),
        }
    }
}

impl fmt::Display for ResolvedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or("<unknown>"))?;
        if let Some(source) = &self.source {
            write!(f, "\n             at {source}")?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
                if let Some(column) = self.column {
                    write!(f, ":{column}")?;
                }
            }
        }
        Ok(())
    }
}

/// Turns frame ids into something a human can read.
pub trait FrameResolver {
    // An empty result means the frame could not be resolved at all.
    fn resolve(&self, frame: FrameId) -> Vec<ResolvedFrame>;
}

/// Resolves frames against the debug info of the running binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolResolver;

impl FrameResolver for SymbolResolver {
    fn resolve(&self, frame: FrameId) -> Vec<ResolvedFrame> {
        let mut resolved = Vec::new();
        backtrace::resolve(frame.as_ptr(), |symbol| {
            resolved.push(ResolvedFrame::from_symbol(frame, symbol));
        });
        resolved
    }
}
