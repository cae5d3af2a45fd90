use crate::error::Result;
use crate::models::Metadata;

/// Turns the raw bytes of one document into [`Metadata`].
///
/// Implementations are registered per file extension and shared between all
/// parse workers, so they must be stateless (or internally synchronised).
/// Parsing is CPU-bound and synchronous; callers are expected to run it off
/// the async executor.
pub trait FormatParser: Send + Sync {
    /// Human-readable name of the format, used for logging.
    fn name(&self) -> &'static str;

    /// Extract metadata from a complete document.
    fn parse(&self, data: &[u8]) -> Result<Metadata>;
}
