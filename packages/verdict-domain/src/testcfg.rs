use verdict_config::{
	Budgets, Cache, Confidence, Config, Disclaimers, EmbeddingProviderConfig,
	ExtractorProviderConfig, FallbackBand, FallbackScoring, Gate, Knowledge, Providers, Retrieval,
	Scoring, ScoringCategory, Security, Service,
};

pub fn config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:8080".to_string(),
			log_level: "info".to_string(),
		},
		knowledge: Knowledge {
			url: "http://localhost:6334".to_string(),
			collection: "guidelines_v1".to_string(),
			vector_dim: 8,
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "p".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "m".to_string(),
				dimensions: 8,
				timeout_ms: 1_000,
				default_headers: Default::default(),
			},
			extractor: ExtractorProviderConfig {
				provider_id: "p".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "m".to_string(),
				temperature: 0.1,
				timeout_ms: 2_000,
				default_headers: Default::default(),
			},
		},
		scoring: Scoring {
			completeness_floor: 0.5,
			max_note_chars: 20_000,
			categories: vec![
				ScoringCategory {
					name: "communication".to_string(),
					weight: 1.0,
					required_responses: 6,
				},
				ScoringCategory {
					name: "gross_motor".to_string(),
					weight: 1.0,
					required_responses: 6,
				},
				ScoringCategory {
					name: "personal_social".to_string(),
					weight: 1.5,
					required_responses: 6,
				},
			],
			fallback: FallbackScoring {
				default_score: 60.0,
				bands: vec![FallbackBand { category: "personal_social".to_string(), score: 75.0 }],
			},
		},
		retrieval: Retrieval {
			top_k: 10,
			min_relevance: 0.6,
			relevance_weight: 0.8,
			recency_weight: 0.2,
			recency_tau_days: 180.0,
			budget_ms: 1_000,
		},
		confidence: Confidence {
			completeness_weight: 1.0,
			relevance_weight: 1.0,
			agreement_weight: 1.0,
		},
		gate: Gate { review_threshold: 0.7, high_risk_threshold: 70.0 },
		budgets: Budgets { screening_ms: 30_000, clinical_note_ms: 120_000 },
		cache: Cache { enabled: true, max_entries: 1_024 },
		disclaimers: Disclaimers { statements: Vec::new() },
		security: Security { bind_localhost_only: true },
	}
}
