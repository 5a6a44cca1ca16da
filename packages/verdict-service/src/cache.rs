use std::{
	collections::{HashMap, VecDeque},
	sync::Mutex,
};

use verdict_domain::{
	confidence::ConfidenceFactor, retrieval::RetrievalResult, scoring::ScoreResult,
	scoring::ScreeningResponse,
};

use crate::{Error, ServiceResult};

/// A fully composed assessment, reusable under a fresh decision id when the
/// same normalized input arrives again. Degraded assessments are never
/// cached.
#[derive(Clone, Debug)]
pub(crate) struct CachedAssessment {
	pub(crate) score: ScoreResult,
	pub(crate) retrieval: RetrievalResult,
	pub(crate) confidence: f32,
	pub(crate) factors: Vec<ConfidenceFactor>,
	pub(crate) explanation: Vec<String>,
	pub(crate) disclaimers: Vec<String>,
}

/// Shared result cache, last-write-wins. The cache is an optimization only;
/// every lookup failure falls through to a full computation.
pub(crate) struct ResultCache {
	enabled: bool,
	max_entries: usize,
	inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
	entries: HashMap<String, CachedAssessment>,
	order: VecDeque<String>,
}

impl ResultCache {
	pub(crate) fn new(cfg: &verdict_config::Cache) -> Self {
		Self {
			enabled: cfg.enabled,
			max_entries: cfg.max_entries as usize,
			inner: Mutex::new(CacheInner::default()),
		}
	}

	pub(crate) fn get(&self, key: &str) -> Option<CachedAssessment> {
		if !self.enabled {
			return None;
		}

		let inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());

		inner.entries.get(key).cloned()
	}

	pub(crate) fn put(&self, key: String, value: CachedAssessment) {
		if !self.enabled {
			return;
		}

		let mut inner = self.inner.lock().unwrap_or_else(|err| err.into_inner());

		if !inner.entries.contains_key(&key) {
			while inner.order.len() >= self.max_entries {
				let Some(evicted) = inner.order.pop_front() else {
					break;
				};

				inner.entries.remove(&evicted);
			}

			inner.order.push_back(key.clone());
		}

		inner.entries.insert(key, value);
	}
}

pub(crate) fn screening_cache_key(
	patient_ref: &str,
	responses: &[ScreeningResponse],
) -> ServiceResult<String> {
	let mut normalized: Vec<_> = responses
		.iter()
		.map(|response| {
			(
				response.category.as_str(),
				response.question_id.as_str(),
				response.value.filter(|value| value.is_finite()),
				response.max_value,
			)
		})
		.collect();

	normalized.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

	let payload = serde_json::json!({
		"kind": "screening",
		"patient_ref": patient_ref,
		"responses": normalized
			.iter()
			.map(|(category, question_id, value, max_value)| {
				serde_json::json!({
					"category": category,
					"question_id": question_id,
					"value": value,
					"max_value": max_value,
				})
			})
			.collect::<Vec<_>>(),
	});

	hash_payload(&payload)
}

pub(crate) fn note_cache_key(patient_ref: &str, note_text: &str) -> ServiceResult<String> {
	let payload = serde_json::json!({
		"kind": "clinical_note",
		"patient_ref": patient_ref,
		"note_text": note_text.trim(),
	});

	hash_payload(&payload)
}

fn hash_payload(payload: &serde_json::Value) -> ServiceResult<String> {
	let raw = serde_json::to_vec(payload)
		.map_err(|err| Error::Internal { message: format!("cache key encoding failed: {err}") })?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}
