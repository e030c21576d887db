// Record source trait for raw meter rows
use async_trait::async_trait;

use crate::domain::record::RawRecord;

/// Supplies the raw rows the pipeline runs over. Implementations own all
/// I/O (file reads, HTTP fetches); the pipeline itself never touches a file
/// or socket.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Load the full export. An empty export is a valid result, not an
    /// error; it simply yields an empty dashboard downstream.
    async fn load_records(&self) -> anyhow::Result<Vec<RawRecord>>;
}
