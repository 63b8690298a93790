use std::io::{self, Write};

use crate::{
    eliminate::recursion_runs,
    frames::{FrameResolver, ResolvedFrame, StackTrace},
    throwable::Throw,
};

/// Writes `throwable` and each of its causes, with their stacks symbolized by
/// `resolver`.
pub fn write_throwable(
    throwable: &dyn Throw,
    resolver: &dyn FrameResolver,
    w: &mut dyn Write,
) -> io::Result<()> {
    writeln!(w, "{throwable}")?;
    write_stack(throwable.stack_trace(), resolver, w)?;
    for cause in throwable.causes() {
        writeln!(w, "Caused by: {cause}")?;
        write_stack(cause.stack_trace(), resolver, w)?;
    }
    Ok(())
}

// Frames keep their index in the raw stack, so a collapsed recursion shows up as a
// jump in the numbering as well as in the note below it.
fn write_stack(
    stack: &StackTrace,
    resolver: &dyn FrameResolver,
    w: &mut dyn Write,
) -> io::Result<()> {
    for run in recursion_runs(stack) {
        let mut resolved = resolver.resolve(run.frame);
        if resolved.is_empty() {
            resolved.push(ResolvedFrame::unresolved(run.frame));
        }
        for (i, frame) in resolved.iter().enumerate() {
            if i == 0 {
                writeln!(w, "  {:>4}: {frame}", run.start)?;
            } else {
                writeln!(w, "        {frame}")?;
            }
        }
        if run.len > 1 {
            writeln!(w, "        [... {} recursive calls elided]", run.len - 1)?;
        }
    }
    Ok(())
}
