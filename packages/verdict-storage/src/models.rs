use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
	Approved,
	Pending,
	Rejected,
}
impl ReviewStatus {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Approved => "approved",
			Self::Pending => "pending",
			Self::Rejected => "rejected",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"approved" => Some(Self::Approved),
			"pending" => Some(Self::Pending),
			"rejected" => Some(Self::Rejected),
			_ => None,
		}
	}
}

/// A guideline document as stored in the knowledge index. The embedding
/// itself lives in the index as the point vector; this struct carries the
/// payload fields the core reads.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KnowledgeDocument {
	pub doc_id: Uuid,
	pub title: String,
	pub content: String,
	pub source: String,
	pub review_status: ReviewStatus,
	#[serde(with = "time::serde::rfc3339")]
	pub last_updated: OffsetDateTime,
}

/// One nearest-neighbor match from the knowledge index, similarity in
/// descending order of `score`.
#[derive(Clone, Debug)]
pub struct SearchHit {
	pub document: KnowledgeDocument,
	pub score: f32,
}
