/// Nesting limit for user function calls when nothing else is configured.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Settings for an [`Interpreter`](crate::runtime::Interpreter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of nested user function calls allowed before the run fails
    /// with a stack overflow error.
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
