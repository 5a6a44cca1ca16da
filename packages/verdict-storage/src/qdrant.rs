use std::collections::HashMap;

use qdrant_client::qdrant::{
	GetPointsBuilder, PointId, Query, QueryPointsBuilder, Value, point_id::PointIdOptions,
	value::Kind,
};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{KnowledgeDocument, ReviewStatus, SearchHit},
};

/// Thin, read-only client over the guideline vector index. No retries, no
/// filtering beyond what the index itself does; both are the retrieval
/// pipeline's concern.
pub struct QdrantKnowledge {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantKnowledge {
	pub fn new(cfg: &verdict_config::Knowledge) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn similarity_search(&self, query: &[f32], k: u32) -> Result<Vec<SearchHit>> {
		if query.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"query vector has {} dimensions; the collection expects {}",
				query.len(),
				self.vector_dim,
			)));
		}

		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(query.to_vec()))
			.with_payload(true)
			.limit(u64::from(k));
		let response = self.client.query(search).await?;
		let mut hits = Vec::with_capacity(response.result.len());

		for point in response.result {
			let doc_id = point
				.id
				.as_ref()
				.and_then(point_uuid)
				.ok_or_else(|| Error::MalformedDocument {
					doc_id: "?".to_string(),
					message: "point id is not a UUID".to_string(),
				})?;

			hits.push(SearchHit {
				document: document_from_payload(doc_id, &point.payload)?,
				score: point.score,
			});
		}

		Ok(hits)
	}

	pub async fn fetch(&self, doc_id: Uuid) -> Result<Option<KnowledgeDocument>> {
		let ids = vec![PointId::from(doc_id.to_string())];
		let request = GetPointsBuilder::new(self.collection.clone(), ids).with_payload(true);
		let response = self.client.get_points(request).await?;
		let Some(point) = response.result.into_iter().next() else {
			return Ok(None);
		};

		Ok(Some(document_from_payload(doc_id, &point.payload)?))
	}
}

fn point_uuid(id: &PointId) -> Option<Uuid> {
	match id.point_id_options.as_ref()? {
		PointIdOptions::Uuid(text) => Uuid::parse_str(text).ok(),
		PointIdOptions::Num(_) => None,
	}
}

fn document_from_payload(
	doc_id: Uuid,
	payload: &HashMap<String, Value>,
) -> Result<KnowledgeDocument> {
	let title = payload_str(payload, "title")
		.ok_or_else(|| malformed(doc_id, "title is missing or not a string"))?;
	let content = payload_str(payload, "content")
		.ok_or_else(|| malformed(doc_id, "content is missing or not a string"))?;
	let source = payload_str(payload, "source")
		.ok_or_else(|| malformed(doc_id, "source is missing or not a string"))?;
	let review_status = payload_str(payload, "review_status")
		.as_deref()
		.and_then(ReviewStatus::parse)
		.ok_or_else(|| malformed(doc_id, "review_status is missing or unknown"))?;
	let last_updated = payload_str(payload, "last_updated")
		.and_then(|raw| OffsetDateTime::parse(&raw, &Rfc3339).ok())
		.ok_or_else(|| malformed(doc_id, "last_updated is missing or not RFC 3339"))?;

	Ok(KnowledgeDocument { doc_id, title, content, source, review_status, last_updated })
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn malformed(doc_id: Uuid, message: &str) -> Error {
	Error::MalformedDocument { doc_id: doc_id.to_string(), message: message.to_string() }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn string_value(text: &str) -> Value {
		Value { kind: Some(Kind::StringValue(text.to_string())) }
	}

	fn payload() -> HashMap<String, Value> {
		let mut payload = HashMap::new();

		payload.insert("title".to_string(), string_value("Screening follow-up"));
		payload.insert("content".to_string(), string_value("Repeat borderline screenings."));
		payload.insert("source".to_string(), string_value("aap"));
		payload.insert("review_status".to_string(), string_value("approved"));
		payload.insert("last_updated".to_string(), string_value("2024-03-01T00:00:00Z"));

		payload
	}

	#[test]
	fn maps_a_complete_payload() {
		let doc_id = Uuid::new_v4();
		let document = document_from_payload(doc_id, &payload()).expect("payload must map");

		assert_eq!(document.doc_id, doc_id);
		assert_eq!(document.review_status, ReviewStatus::Approved);
		assert_eq!(document.title, "Screening follow-up");
	}

	#[test]
	fn rejects_unknown_review_status() {
		let mut fields = payload();

		fields.insert("review_status".to_string(), string_value("draft"));

		let err = document_from_payload(Uuid::new_v4(), &fields).expect_err("must reject");

		assert!(matches!(err, Error::MalformedDocument { .. }));
	}

	#[test]
	fn rejects_missing_timestamp() {
		let mut fields = payload();

		fields.remove("last_updated");

		let err = document_from_payload(Uuid::new_v4(), &fields).expect_err("must reject");

		assert!(err.to_string().contains("last_updated"));
	}
}
