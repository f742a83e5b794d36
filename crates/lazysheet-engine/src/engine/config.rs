/// Default bound on nested evaluations before giving up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Tunables for a [`Sheet`](super::Sheet).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetConfig {
    /// How many recomputes may run inside one another before `DepthExceeded`
    /// is raised. A recompute nests only when an evaluator reads a cell that
    /// still needs evaluating; declared prerequisites are settled beforehand
    /// and never nest.
    pub max_depth: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SheetConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }
}
