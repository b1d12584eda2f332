//! Builds constraint engines from the persisted configuration document.

use log::debug;

use super::{
    ByeConstraint, Constraint, ConstraintEngine, DoubleUp, HomeAwayBalance, PrimeTimeSpread,
    RestPeriod, TeamAvailability, TravelMinimization, VenueAvailability,
};
use crate::error::SchedulerError;
use crate::models::{ConstraintSetConfig, RuleConfig};

/// Instantiates one rule from its config entry.
pub fn build_rule(cfg: &RuleConfig) -> Box<dyn Constraint> {
    match cfg {
        RuleConfig::VenueAvailability {
            venue_id,
            unavailable_dates,
        } => Box::new(VenueAvailability::new(*venue_id, unavailable_dates.clone())),
        RuleConfig::TeamAvailability {
            team_id,
            unavailable_dates,
        } => Box::new(TeamAvailability::new(*team_id, unavailable_dates.clone())),
        RuleConfig::ByeConstraint => Box::new(ByeConstraint::new()),
        RuleConfig::DoubleUp {
            min_rounds_separation,
        } => Box::new(DoubleUp::new(*min_rounds_separation)),
        RuleConfig::TravelMinimization {
            max_consecutive_away,
        } => Box::new(TravelMinimization::new(*max_consecutive_away)),
        RuleConfig::RestPeriod { min_rest_days } => Box::new(RestPeriod::new(*min_rest_days)),
        RuleConfig::PrimeTimeSpread {
            target_ratio,
            max_deviation,
        } => Box::new(PrimeTimeSpread::new(*target_ratio, *max_deviation)),
        RuleConfig::HomeAwayBalance { max_deviation } => {
            Box::new(HomeAwayBalance::new(*max_deviation))
        }
    }
}

/// Builds an engine from a parsed configuration.
///
/// Rejects rules filed under the wrong section and soft weights outside
/// [0, 1]; unknown types and malformed params never get this far because
/// deserialization already failed on them.
pub fn engine_from_config(cfg: &ConstraintSetConfig) -> Result<ConstraintEngine, SchedulerError> {
    let mut engine = ConstraintEngine::new();

    for rule_cfg in &cfg.hard {
        if !rule_cfg.is_hard_kind() {
            return Err(SchedulerError::InvalidInput(format!(
                "{rule_cfg:?} is a soft rule and cannot appear in the hard section"
            )));
        }
        engine.add_hard(build_rule(rule_cfg));
    }

    for soft in &cfg.soft {
        if soft.rule.is_hard_kind() {
            return Err(SchedulerError::InvalidInput(format!(
                "{:?} is a hard rule and cannot appear in the soft section",
                soft.rule
            )));
        }
        engine.add_soft(build_rule(&soft.rule), soft.weight)?;
    }

    debug!(
        "built constraint engine: {} hard rule(s), {} soft rule(s)",
        cfg.hard.len(),
        cfg.soft.len()
    );
    Ok(engine)
}

/// Parses a raw configuration document and builds an engine from it.
pub fn engine_from_value(doc: &serde_json::Value) -> Result<ConstraintEngine, SchedulerError> {
    let cfg: ConstraintSetConfig = serde_json::from_value(doc.clone())
        .map_err(|e| SchedulerError::InvalidInput(format!("bad constraint document: {e}")))?;
    engine_from_config(&cfg)
}

/// The engine used for draws without an embedded configuration: structural
/// hard rules plus the four fairness preferences at moderate weights.
pub fn default_engine() -> ConstraintEngine {
    let mut engine = ConstraintEngine::new();
    engine.add_hard(Box::new(ByeConstraint::new()));
    engine.add_hard(Box::new(DoubleUp::new(1)));

    // The weights are all in range, so none of these can fail.
    let softs: [(Box<dyn Constraint>, f64); 4] = [
        (Box::new(TravelMinimization::new(2)), 0.8),
        (Box::new(RestPeriod::new(5)), 0.6),
        (Box::new(PrimeTimeSpread::new(0.25, 0.25)), 0.4),
        (Box::new(HomeAwayBalance::new(0.2)), 0.8),
    ];
    for (rule, weight) in softs {
        let _ = engine.add_soft(rule, weight);
    }
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_engine_from_full_document() {
        let doc = json!({
            "hard": [
                { "type": "bye_constraint" },
                { "type": "double_up", "params": { "min_rounds_separation": 3 } },
                { "type": "team_availability",
                  "params": { "team_id": 1, "unavailable_dates": ["2025-04-25"] } }
            ],
            "soft": [
                { "type": "travel_minimization", "weight": 0.9,
                  "params": { "max_consecutive_away": 2 } },
                { "type": "rest_period", "weight": 0.5,
                  "params": { "min_rest_days": 5 } }
            ]
        });
        let engine = engine_from_value(&doc).unwrap();
        assert_eq!(engine.hard_rules().count(), 3);
        assert_eq!(engine.soft_rules().count(), 2);
    }

    #[test]
    fn rejects_unknown_type() {
        let doc = json!({ "hard": [{ "type": "curfew", "params": {} }] });
        assert!(engine_from_value(&doc).is_err());
    }

    #[test]
    fn rejects_missing_params() {
        let doc = json!({ "hard": [{ "type": "double_up", "params": {} }] });
        assert!(engine_from_value(&doc).is_err());
    }

    #[test]
    fn rejects_bad_weight() {
        let doc = json!({
            "soft": [
                { "type": "home_away_balance", "weight": 1.5,
                  "params": { "max_deviation": 0.2 } }
            ]
        });
        assert!(engine_from_value(&doc).is_err());
    }

    #[test]
    fn rejects_misfiled_sections() {
        let hard_in_soft = json!({
            "soft": [
                { "type": "double_up", "weight": 0.5,
                  "params": { "min_rounds_separation": 2 } }
            ]
        });
        assert!(engine_from_value(&hard_in_soft).is_err());

        let soft_in_hard = json!({
            "hard": [
                { "type": "home_away_balance", "params": { "max_deviation": 0.2 } }
            ]
        });
        assert!(engine_from_value(&soft_in_hard).is_err());
    }

    #[test]
    fn rejects_unparseable_dates() {
        let doc = json!({
            "hard": [
                { "type": "venue_availability",
                  "params": { "venue_id": 2, "unavailable_dates": ["April 25"] } }
            ]
        });
        assert!(engine_from_value(&doc).is_err());
    }

    #[test]
    fn default_engine_has_structural_rules() {
        let engine = default_engine();
        assert_eq!(engine.hard_rules().count(), 2);
        assert_eq!(engine.soft_rules().count(), 4);
    }
}
