mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Budgets, Cache, Confidence, Config, Disclaimers, EmbeddingProviderConfig,
	ExtractorProviderConfig, FallbackBand, FallbackScoring, Gate, Knowledge, Providers, Retrieval,
	Scoring, ScoringCategory, Security, Service,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.knowledge.vector_dim == 0 {
		return Err(Error::Validation {
			message: "knowledge.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.knowledge.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match knowledge.vector_dim.".to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("extractor", &cfg.providers.extractor.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if !cfg.providers.extractor.temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.extractor.temperature must be a finite number.".to_string(),
		});
	}

	validate_scoring(cfg)?;
	validate_retrieval(cfg)?;
	validate_confidence(cfg)?;
	validate_gate(cfg)?;
	validate_budgets(cfg)?;

	if cfg.cache.enabled && cfg.cache.max_entries == 0 {
		return Err(Error::Validation {
			message: "cache.max_entries must be greater than zero when cache is enabled."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_scoring(cfg: &Config) -> Result<()> {
	if cfg.scoring.categories.is_empty() {
		return Err(Error::Validation {
			message: "scoring.categories must be non-empty.".to_string(),
		});
	}

	let mut seen = HashSet::new();

	for (idx, category) in cfg.scoring.categories.iter().enumerate() {
		if category.name.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("scoring.categories[{idx}].name must be non-empty."),
			});
		}
		if !seen.insert(category.name.as_str()) {
			return Err(Error::Validation {
				message: format!("scoring.categories[{idx}].name is a duplicate."),
			});
		}
		if !category.weight.is_finite() || category.weight <= 0.0 {
			return Err(Error::Validation {
				message: format!(
					"scoring.categories[{idx}].weight must be a positive finite number."
				),
			});
		}
		if category.required_responses == 0 {
			return Err(Error::Validation {
				message: format!(
					"scoring.categories[{idx}].required_responses must be greater than zero."
				),
			});
		}
	}

	if !(0.0..=1.0).contains(&cfg.scoring.completeness_floor) {
		return Err(Error::Validation {
			message: "scoring.completeness_floor must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.scoring.max_note_chars == 0 {
		return Err(Error::Validation {
			message: "scoring.max_note_chars must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=100.0).contains(&cfg.scoring.fallback.default_score) {
		return Err(Error::Validation {
			message: "scoring.fallback.default_score must be in the range 0.0-100.0.".to_string(),
		});
	}

	let mut band_seen = HashSet::new();

	for (idx, band) in cfg.scoring.fallback.bands.iter().enumerate() {
		if !seen.contains(band.category.as_str()) {
			return Err(Error::Validation {
				message: format!(
					"scoring.fallback.bands[{idx}].category must name a scoring category."
				),
			});
		}
		if !band_seen.insert(band.category.as_str()) {
			return Err(Error::Validation {
				message: format!("scoring.fallback.bands[{idx}].category is a duplicate."),
			});
		}
		if !(0.0..=100.0).contains(&band.score) {
			return Err(Error::Validation {
				message: format!(
					"scoring.fallback.bands[{idx}].score must be in the range 0.0-100.0."
				),
			});
		}
	}

	Ok(())
}

fn validate_retrieval(cfg: &Config) -> Result<()> {
	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.min_relevance) {
		return Err(Error::Validation {
			message: "retrieval.min_relevance must be in the range 0.0-1.0.".to_string(),
		});
	}

	for (label, weight) in [
		("retrieval.relevance_weight", cfg.retrieval.relevance_weight),
		("retrieval.recency_weight", cfg.retrieval.recency_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if weight < 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be zero or greater."),
			});
		}
	}

	if cfg.retrieval.relevance_weight + cfg.retrieval.recency_weight <= 0.0 {
		return Err(Error::Validation {
			message: "At least one retrieval ranking weight must be greater than zero."
				.to_string(),
		});
	}
	if !cfg.retrieval.recency_tau_days.is_finite() || cfg.retrieval.recency_tau_days <= 0.0 {
		return Err(Error::Validation {
			message: "retrieval.recency_tau_days must be a positive finite number.".to_string(),
		});
	}
	if cfg.retrieval.budget_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.budget_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_confidence(cfg: &Config) -> Result<()> {
	for (label, weight) in [
		("confidence.completeness_weight", cfg.confidence.completeness_weight),
		("confidence.relevance_weight", cfg.confidence.relevance_weight),
		("confidence.agreement_weight", cfg.confidence.agreement_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if weight < 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be zero or greater."),
			});
		}
	}

	let total = cfg.confidence.completeness_weight
		+ cfg.confidence.relevance_weight
		+ cfg.confidence.agreement_weight;

	if total <= 0.0 {
		return Err(Error::Validation {
			message: "At least one confidence weight must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_gate(cfg: &Config) -> Result<()> {
	if !(0.0..=1.0).contains(&cfg.gate.review_threshold) {
		return Err(Error::Validation {
			message: "gate.review_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !(0.0..=100.0).contains(&cfg.gate.high_risk_threshold) {
		return Err(Error::Validation {
			message: "gate.high_risk_threshold must be in the range 0.0-100.0.".to_string(),
		});
	}

	Ok(())
}

fn validate_budgets(cfg: &Config) -> Result<()> {
	if cfg.budgets.screening_ms == 0 {
		return Err(Error::Validation {
			message: "budgets.screening_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.budgets.clinical_note_ms == 0 {
		return Err(Error::Validation {
			message: "budgets.clinical_note_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.budget_ms >= cfg.budgets.screening_ms {
		return Err(Error::Validation {
			message: "retrieval.budget_ms must be less than budgets.screening_ms.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.disclaimers.statements.retain(|statement| !statement.trim().is_empty());

	for statement in &mut cfg.disclaimers.statements {
		let trimmed = statement.trim();

		if trimmed.len() != statement.len() {
			*statement = trimmed.to_string();
		}
	}
}
