/// Default ceiling on input size in bytes.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 16 * 1024 * 1024;

/// Default ceiling on open elements.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Resource ceilings applied to every sanitize call.
///
/// Parsing, sanitizing and serializing recurse once per nesting level, so keep
/// `max_depth` well below what the calling thread's stack can hold.
/// ```rust
/// use spider_sanitizer::configuration::Limits;
///
/// let limits = Limits::default()
///     .with_max_input_bytes(64 * 1024)
///     .with_max_depth(128);
///
/// assert_eq!(limits.max_depth, 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Limits {
    /// Largest input accepted in bytes.
    pub max_input_bytes: usize,
    /// Most elements open at once while parsing.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Limits {
    /// Default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest input accepted in bytes.
    pub fn with_max_input_bytes(mut self, max_input_bytes: usize) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    /// Most elements open at once. A value of zero is raised to one.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }
}
