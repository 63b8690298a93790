pub const STACK_CAPTURES: &str = "throwable_stack_captures";
pub const STACK_CAPTURE_RETRIES: &str = "throwable_stack_capture_retries";
pub const STACK_CAPTURE_DEPTH: &str = "throwable_stack_capture_depth";
