//! Code generation settings.

/// Settings for the module emitter.
///
/// The defaults produce modules for the standard host ABI: a 100-page memory
/// imported as `imports.mem` and an entry point exported as `_start`.
///
/// ```
/// use snek_compiler::CompileOptions;
///
/// let options = CompileOptions::default().with_memory_pages(2);
/// assert_eq!(options.memory_pages, 2);
/// assert_eq!(options.entry_export, "_start");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Size of the imported memory, in 64 KiB pages
    pub memory_pages: u32,
    /// First address handed out by the bump allocator; address 0 is never used
    pub heap_base: i32,
    /// Initial value of object-typed globals
    pub object_sentinel: i32,
    /// Export name of the entry function
    pub entry_export: String,
    /// Module name for all imports
    pub import_module: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            memory_pages: 100,
            heap_base: 4,
            object_sentinel: -8,
            entry_export: "_start".to_string(),
            import_module: "imports".to_string(),
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_pages(mut self, pages: u32) -> Self {
        self.memory_pages = pages;
        self
    }

    pub fn with_heap_base(mut self, base: i32) -> Self {
        self.heap_base = base;
        self
    }

    pub fn with_object_sentinel(mut self, sentinel: i32) -> Self {
        self.object_sentinel = sentinel;
        self
    }

    pub fn with_entry_export(mut self, name: impl Into<String>) -> Self {
        self.entry_export = name.into();
        self
    }

    pub fn with_import_module(mut self, name: impl Into<String>) -> Self {
        self.import_module = name.into();
        self
    }
}
