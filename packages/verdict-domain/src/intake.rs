use verdict_config::Config;

use crate::scoring::ScreeningResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCode {
	RejectEmpty,
	RejectTooLong,
	RejectNoResponses,
	RejectUnknownCategory,
}

/// Validates a screening payload before scoring. Out-of-range answer values
/// are not rejected here; the scorer clamps them.
pub fn screening_intake(responses: &[ScreeningResponse], cfg: &Config) -> Result<(), RejectCode> {
	if responses.is_empty() {
		return Err(RejectCode::RejectNoResponses);
	}

	for response in responses {
		if response.question_id.trim().is_empty() {
			return Err(RejectCode::RejectEmpty);
		}
		if !cfg.scoring.categories.iter().any(|category| category.name == response.category) {
			return Err(RejectCode::RejectUnknownCategory);
		}
	}

	Ok(())
}

pub fn note_intake(text: &str, cfg: &Config) -> Result<(), RejectCode> {
	if text.trim().is_empty() {
		return Err(RejectCode::RejectEmpty);
	}
	if text.chars().count() as u32 > cfg.scoring.max_note_chars {
		return Err(RejectCode::RejectTooLong);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testcfg;

	fn response(category: &str) -> ScreeningResponse {
		ScreeningResponse {
			question_id: "q1".to_string(),
			category: category.to_string(),
			value: Some(5.0),
			max_value: 10.0,
		}
	}

	#[test]
	fn empty_screening_is_rejected() {
		let cfg = testcfg::config();

		assert_eq!(screening_intake(&[], &cfg), Err(RejectCode::RejectNoResponses));
	}

	#[test]
	fn unknown_category_is_rejected() {
		let cfg = testcfg::config();

		assert_eq!(
			screening_intake(&[response("unheard_of")], &cfg),
			Err(RejectCode::RejectUnknownCategory)
		);
	}

	#[test]
	fn known_categories_pass() {
		let cfg = testcfg::config();

		assert_eq!(screening_intake(&[response("communication")], &cfg), Ok(()));
	}

	#[test]
	fn blank_note_is_rejected() {
		let cfg = testcfg::config();

		assert_eq!(note_intake("   ", &cfg), Err(RejectCode::RejectEmpty));
	}

	#[test]
	fn overlong_note_is_rejected() {
		let mut cfg = testcfg::config();

		cfg.scoring.max_note_chars = 10;

		assert_eq!(note_intake("12345678901", &cfg), Err(RejectCode::RejectTooLong));
	}
}
