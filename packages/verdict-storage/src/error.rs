#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Connectivity failure talking to the vector index. Retry policy is the
	/// caller's responsibility; the adapter never retries.
	#[error("Knowledge store unavailable: {message}")]
	StoreUnavailable { message: String },
	#[error("Malformed knowledge document {doc_id}: {message}")]
	MalformedDocument { doc_id: String, message: String },
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::StoreUnavailable { message: err.to_string() }
	}
}
