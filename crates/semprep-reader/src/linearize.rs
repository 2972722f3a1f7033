//! Logical-form linearization against one instance's action space.
//!
//! Each candidate's fate is modeled as data ([`CandidateOutcome`]) so the
//! accept/reject policy stays auditable; only world *internal* failures
//! travel as errors and abort the read.

use semprep_grammar::{ActionSequence, ActionSpace, World, WorldError};

/// Outcome for one candidate logical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    Accepted(ActionSequence),
    /// The world's grammar could not parse the candidate.
    RejectedParse,
    /// The derivation referenced a rule absent from the action space; the
    /// whole candidate is rejected, never a truncated prefix.
    RejectedMissingRule { rule: String },
}

/// Linearize one candidate.
///
/// `Err` is reserved for [`WorldError::Internal`]; a plain parse failure is
/// an [`CandidateOutcome::RejectedParse`] outcome, not an error.
pub fn linearize_candidate<W: World>(
    world: &W,
    space: &ActionSpace,
    logical_form: &str,
) -> Result<CandidateOutcome, WorldError> {
    let expression = match world.parse_logical_form(logical_form) {
        Ok(expression) => expression,
        Err(WorldError::Parse { message }) => {
            tracing::debug!(%message, logical_form, "parsing error, skipping logical form");
            return Ok(CandidateOutcome::RejectedParse);
        }
        Err(e) => {
            tracing::error!(logical_form, "unexpected failure while parsing logical form");
            return Err(e);
        }
    };

    let rule_strings = world.get_action_sequence(&expression);
    let mut sequence = Vec::with_capacity(rule_strings.len());
    for rule in rule_strings {
        match space.index_of(&rule) {
            Some(index) => sequence.push(index),
            None => {
                tracing::debug!(%rule, logical_form, "missing production rule, skipping logical form");
                return Ok(CandidateOutcome::RejectedMissingRule { rule });
            }
        }
    }
    Ok(CandidateOutcome::Accepted(sequence))
}

/// Linearize candidates in input order, keeping the first `cap` accepted
/// sequences (first-valid-N, not best-K). Candidates after the cap is
/// reached are not considered at all.
///
/// An empty result from a non-empty input means no usable supervision; the
/// caller is expected to drop the instance (including during evaluation —
/// a known source of metric bias, preserved deliberately).
pub fn linearize_candidates<W: World>(
    world: &W,
    space: &ActionSpace,
    candidates: &[String],
    cap: usize,
    question: &str,
) -> Result<Vec<ActionSequence>, WorldError> {
    let mut accepted = Vec::new();
    for logical_form in candidates {
        if accepted.len() >= cap {
            break;
        }
        match linearize_candidate(world, space, logical_form)? {
            CandidateOutcome::Accepted(sequence) => accepted.push(sequence),
            CandidateOutcome::RejectedParse | CandidateOutcome::RejectedMissingRule { .. } => {
                tracing::debug!(question, "rejected candidate logical form");
            }
        }
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semprep_grammar::ActionSpace;
    use std::collections::HashMap;

    /// World over a fixed rule list whose "parser" is a map from logical
    /// form to its derivation.
    struct MapWorld {
        actions: Vec<String>,
        derivations: HashMap<String, Vec<String>>,
        internal_failure_on: Option<String>,
    }

    impl World for MapWorld {
        type Expression = Vec<String>;

        fn all_possible_actions(&self) -> Vec<String> {
            self.actions.clone()
        }

        fn is_instance_specific_entity(&self, rhs: &str) -> bool {
            rhs.starts_with("entity:")
        }

        fn parse_logical_form(&self, text: &str) -> Result<Vec<String>, WorldError> {
            if self.internal_failure_on.as_deref() == Some(text) {
                return Err(WorldError::Internal {
                    message: "simulated".to_string(),
                });
            }
            self.derivations
                .get(text)
                .cloned()
                .ok_or_else(|| WorldError::Parse {
                    message: format!("no parse for {text}"),
                })
        }

        fn get_action_sequence(&self, expr: &Vec<String>) -> Vec<String> {
            expr.clone()
        }

        fn get_agenda(&self) -> Vec<String> {
            vec![]
        }
    }

    fn world() -> MapWorld {
        let actions = vec![
            "@start@ -> n".to_string(),
            "n -> count".to_string(),
            "n -> entity:touchdown".to_string(),
        ];
        let mut derivations = HashMap::new();
        derivations.insert(
            "(count entity:touchdown)".to_string(),
            vec![
                "@start@ -> n".to_string(),
                "n -> count".to_string(),
                "n -> entity:touchdown".to_string(),
            ],
        );
        derivations.insert(
            "(count entity:fieldgoal)".to_string(),
            vec![
                "@start@ -> n".to_string(),
                "n -> count".to_string(),
                "n -> entity:fieldgoal".to_string(),
            ],
        );
        MapWorld {
            actions,
            derivations,
            internal_failure_on: None,
        }
    }

    #[test]
    fn accepts_valid_candidate_as_indices() {
        let world = world();
        let space = ActionSpace::build(&world);
        let outcome = linearize_candidate(&world, &space, "(count entity:touchdown)").unwrap();
        assert_eq!(outcome, CandidateOutcome::Accepted(vec![0, 1, 2]));
    }

    #[test]
    fn rejects_unparsable_candidate() {
        let world = world();
        let space = ActionSpace::build(&world);
        let outcome = linearize_candidate(&world, &space, "(garbage").unwrap();
        assert_eq!(outcome, CandidateOutcome::RejectedParse);
    }

    #[test]
    fn rejects_whole_candidate_on_missing_rule() {
        let world = world();
        let space = ActionSpace::build(&world);
        // Parses, but its derivation uses a rule outside the space.
        let outcome = linearize_candidate(&world, &space, "(count entity:fieldgoal)").unwrap();
        assert_eq!(
            outcome,
            CandidateOutcome::RejectedMissingRule {
                rule: "n -> entity:fieldgoal".to_string()
            }
        );
    }

    #[test]
    fn internal_failure_propagates() {
        let mut world = world();
        world.internal_failure_on = Some("(boom)".to_string());
        let space = ActionSpace::build(&world);
        let err = linearize_candidate(&world, &space, "(boom)").unwrap_err();
        assert!(matches!(err, WorldError::Internal { .. }));
    }

    #[test]
    fn cap_is_prefix_selection() {
        let world = world();
        let space = ActionSpace::build(&world);
        let candidates = vec![
            "(count entity:touchdown)".to_string(),
            "(count entity:touchdown)".to_string(),
            "(count entity:touchdown)".to_string(),
        ];
        let accepted =
            linearize_candidates(&world, &space, &candidates, 2, "how many?").unwrap();
        assert_eq!(accepted.len(), 2);
    }

    #[test]
    fn invalid_candidates_do_not_count_toward_cap() {
        let world = world();
        let space = ActionSpace::build(&world);
        let candidates = vec![
            "(garbage".to_string(),
            "(count entity:fieldgoal)".to_string(),
            "(count entity:touchdown)".to_string(),
        ];
        let accepted =
            linearize_candidates(&world, &space, &candidates, 1, "how many?").unwrap();
        assert_eq!(accepted, vec![vec![0, 1, 2]]);
    }
}
