//! Collapsing of self-recursion in captured stacks.
//!
//! A function calling itself leaves a run of identical frames on the stack
//! (`f -> f -> f`), since every recursive call returns to the same call site.
//! Those runs are collapsed to a single frame. Cross recursion
//! (`f -> g -> f -> g`) is left alone; spotting it would need subsequence
//! matching, which is far more expensive than this single pass.

/// A maximal run of identical, adjacent frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<T> {
    pub frame: T,
    /// Index of the first frame of the run in the original stack.
    pub start: usize,
    pub len: usize,
}

pub struct Runs<'a, T> {
    stack: &'a [T],
    pos: usize,
}

/// Splits a stack into runs of identical adjacent frames, innermost first.
pub fn recursion_runs<T: PartialEq>(stack: &[T]) -> Runs<'_, T> {
    Runs { stack, pos: 0 }
}

impl<T: PartialEq + Copy> Iterator for Runs<'_, T> {
    type Item = Run<T>;

    fn next(&mut self) -> Option<Run<T>> {
        let start = self.pos;
        let frame = *self.stack.get(start)?;
        let len = self.stack[start..]
            .iter()
            .take_while(|f| **f == frame)
            .count();
        self.pos = start + len;
        Some(Run { frame, start, len })
    }
}

/// Returns the stack with every run of identical adjacent frames reduced to
/// its first frame. Stacks without such runs come back unchanged.
pub fn eliminate_recursion<T: PartialEq + Copy>(stack: &[T]) -> Vec<T> {
    let mut eliminated = Vec::with_capacity(stack.len());
    for run in recursion_runs(stack) {
        eliminated.push(run.frame);
        if run.start + run.len == stack.len() {
            // The run reaches the outermost frame, nothing left to scan.
            break;
        }
    }
    eliminated
}
