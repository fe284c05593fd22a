use super::config::ScoringConfig;
use super::tiebreak::TiebreakMethod;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let traditional = &config.traditional;
    if !traditional.step.is_finite() || traditional.step < 0.0 {
        errors.push(format!(
            "scoring.traditional.step: must be a non-negative number, got {}",
            traditional.step
        ));
    }
    if !traditional.first_place_points.is_finite() || traditional.first_place_points <= 0.0 {
        errors.push(format!(
            "scoring.traditional.first_place_points: must be positive, got {}",
            traditional.first_place_points
        ));
    }

    for (place, points) in &config.custom_table.overrides {
        if *place == 0 {
            errors.push("scoring.custom_table.overrides: places start at 1, got 0".to_string());
        }
        if !points.is_finite() || *points < 0.0 {
            errors.push(format!(
                "scoring.custom_table.overrides.{}: must be a non-negative number, got {}",
                place, points
            ));
        }
    }

    let tiebreaker = &config.tiebreaker;
    if let Err(e) = tiebreaker.validate() {
        errors.push(format!("scoring.tiebreaker.head_to_head_event_id: {}", e));
    }
    if let Some(secondary) = tiebreaker.secondary {
        if secondary != TiebreakMethod::None && secondary == tiebreaker.primary {
            errors.push(format!(
                "scoring.tiebreaker.secondary: repeats the primary method '{:?}'",
                secondary
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{ScoringAlgorithm, TiebreakerConfig, TraditionalConfig};

    #[test]
    fn test_valid_config() {
        let config = ScoringConfig {
            tiebreaker: TiebreakerConfig {
                primary: TiebreakMethod::Countback,
                secondary: Some(TiebreakMethod::HeadToHead),
                head_to_head_event_id: Some("final".to_string()),
            },
            ..ScoringConfig::default()
        };
        assert!(validate_scoring(&config).is_ok());
    }

    #[test]
    fn test_default_config() {
        assert!(validate_scoring(&ScoringConfig::default()).is_ok());
    }

    #[test]
    fn test_negative_step() {
        let config = ScoringConfig {
            traditional: TraditionalConfig {
                step: -5.0,
                first_place_points: 100.0,
            },
            ..ScoringConfig::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.traditional.step"));
    }

    #[test]
    fn test_zero_step_is_allowed() {
        let config = ScoringConfig {
            traditional: TraditionalConfig {
                step: 0.0,
                first_place_points: 100.0,
            },
            ..ScoringConfig::default()
        };
        assert!(validate_scoring(&config).is_ok());
    }

    #[test]
    fn test_missing_head_to_head_event() {
        let config = ScoringConfig {
            tiebreaker: TiebreakerConfig::new(TiebreakMethod::HeadToHead),
            ..ScoringConfig::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("scoring.tiebreaker.head_to_head_event_id"));
        assert!(errors[0].contains("required for head_to_head tiebreaker"));
    }

    #[test]
    fn test_repeated_secondary() {
        let config = ScoringConfig {
            tiebreaker: TiebreakerConfig {
                secondary: Some(TiebreakMethod::Countback),
                ..TiebreakerConfig::default()
            },
            ..ScoringConfig::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("scoring.tiebreaker.secondary"));
    }

    #[test]
    fn test_custom_overrides() {
        let mut config = ScoringConfig {
            algorithm: ScoringAlgorithm::Custom,
            ..ScoringConfig::default()
        };
        config.custom_table.overrides.insert(1, 150.0);
        assert!(validate_scoring(&config).is_ok());

        config.custom_table.overrides.insert(0, 10.0);
        config.custom_table.overrides.insert(3, -5.0);
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("places start at 1"));
        assert!(errors[1].contains("scoring.custom_table.overrides.3"));
    }

    #[test]
    fn test_collects_all_errors() {
        let config = ScoringConfig {
            traditional: TraditionalConfig {
                step: -1.0,              // Error 1
                first_place_points: 0.0, // Error 2
            },
            tiebreaker: TiebreakerConfig::new(TiebreakMethod::HeadToHead), // Error 3
            ..ScoringConfig::default()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
