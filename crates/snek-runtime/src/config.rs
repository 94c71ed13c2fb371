//! Interpreter settings.

/// Settings for one [`Vm`](crate::Vm).
///
/// ```
/// use snek_runtime::VmConfig;
///
/// let config = VmConfig::default().with_max_call_depth(64);
/// assert_eq!(config.max_call_depth, 64);
/// assert_eq!(config.memory_pages, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Memory size in pages; `None` uses the size the module imports
    pub memory_pages: Option<u32>,
    /// Nested calls allowed before `CallStackExhausted`
    pub max_call_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_pages: None,
            max_call_depth: 512,
        }
    }
}

impl VmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_pages(mut self, pages: u32) -> Self {
        self.memory_pages = Some(pages);
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
