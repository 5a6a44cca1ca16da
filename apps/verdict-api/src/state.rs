use std::sync::Arc;

use verdict_service::VerdictService;
use verdict_storage::qdrant::QdrantKnowledge;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<VerdictService>,
}
impl AppState {
	pub fn new(config: verdict_config::Config) -> color_eyre::Result<Self> {
		let knowledge = QdrantKnowledge::new(&config.knowledge)?;
		let service = VerdictService::new(config, knowledge);

		Ok(Self { service: Arc::new(service) })
	}

	/// Wires the routes around an already-built service; used by tests that
	/// inject synthetic collaborators.
	pub fn from_service(service: Arc<VerdictService>) -> Self {
		Self { service }
	}
}
