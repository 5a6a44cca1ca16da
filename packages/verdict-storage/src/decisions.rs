use std::{collections::HashMap, sync::RwLock};

use uuid::Uuid;

use verdict_domain::record::{DecisionRecord, DecisionState};

use crate::{Error, Result};

/// In-memory decision-record store keyed by id. Mutation happens under the
/// write lock through `update`, which is the single-winner guard for
/// concurrent review submissions: the closure sees the current state and the
/// loser observes the winner's transition.
#[derive(Default)]
pub struct DecisionStore {
	records: RwLock<HashMap<Uuid, DecisionRecord>>,
}
impl DecisionStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, record: DecisionRecord) -> Result<()> {
		let mut records = self.records.write().unwrap_or_else(|err| err.into_inner());

		if records.contains_key(&record.id) {
			return Err(Error::InvalidArgument(format!("decision {} already exists", record.id)));
		}

		records.insert(record.id, record);

		Ok(())
	}

	pub fn get(&self, id: Uuid) -> Result<DecisionRecord> {
		let records = self.records.read().unwrap_or_else(|err| err.into_inner());

		records.get(&id).cloned().ok_or_else(|| Error::NotFound(format!("decision {id}")))
	}

	pub fn list(&self, state: Option<DecisionState>) -> Vec<DecisionRecord> {
		let records = self.records.read().unwrap_or_else(|err| err.into_inner());
		let mut matching: Vec<DecisionRecord> = records
			.values()
			.filter(|record| state.is_none_or(|state| record.state == state))
			.cloned()
			.collect();

		matching.sort_by_key(|record| (record.created_at, record.id));

		matching
	}

	/// Runs `f` against the stored record under the write lock and returns
	/// its outcome alongside a snapshot of the record. The closure's error
	/// leaves whatever it already mutated in place; callers mutate only
	/// after their guards pass.
	pub fn update<T, E>(
		&self,
		id: Uuid,
		f: impl FnOnce(&mut DecisionRecord) -> Result<T, E>,
	) -> Result<Result<(T, DecisionRecord), E>> {
		let mut records = self.records.write().unwrap_or_else(|err| err.into_inner());
		let record =
			records.get_mut(&id).ok_or_else(|| Error::NotFound(format!("decision {id}")))?;

		Ok(f(record).map(|value| (value, record.clone())))
	}
}
