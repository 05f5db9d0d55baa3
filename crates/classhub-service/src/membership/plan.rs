//! Pure classification state for the bulk-add reconciliation engine.
//!
//! The engine threads every distinct candidate through a small state
//! machine: preflight classification, invitation results, then the
//! mutation passes. Keeping the transitions here, free of I/O, is what
//! makes the tie-break rules directly testable.

use std::collections::HashSet;

use crate::outcome::{InviteOutcome, MemberCandidate, MemberErrorCode, MemberOutcome};

/// Where one candidate currently stands in the reconciliation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// No account exists; goes through the invitation ledger.
    Invite,
    /// Ready for the bulk membership insert under the given reference.
    DirectAdd { user_ref: String },
    /// A removed membership row exists; will be reactivated.
    Reactivate { user_ref: String },
    /// Successfully added (terminal).
    Added { unremove: bool },
    /// Terminal failure.
    Rejected(MemberErrorCode),
}

/// One distinct candidate and its running classification.
#[derive(Debug, Clone)]
pub struct CandidateState {
    pub email: String,
    pub is_admin: bool,
    pub step: Step,
    /// Set when the candidate went through the invitation ledger.
    pub invited: bool,
}

impl CandidateState {
    /// Creates the initial state for a candidate.
    pub fn new(candidate: MemberCandidate, step: Step) -> Self {
        Self {
            email: candidate.email,
            is_admin: candidate.admin,
            step,
            invited: false,
        }
    }
}

/// Drop duplicate emails, keeping the first occurrence and its admin flag.
///
/// Later duplicates disappear entirely: they are neither processed nor
/// reported, so the outcome list has exactly one entry per distinct email.
pub fn dedupe_candidates(candidates: Vec<MemberCandidate>) -> Vec<MemberCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.email.clone()))
        .collect()
}

/// Fold the invitation ledger's batch results back into the states.
///
/// A persisted invitation — or one that already existed — still gets the
/// candidate into the workspace, so both become a placeholder direct add
/// keyed by the email itself. Any other ledger code is terminal.
pub fn apply_invite_outcomes(states: &mut [CandidateState], results: &[InviteOutcome]) {
    for state in states.iter_mut() {
        if state.step != Step::Invite {
            continue;
        }
        let Some(result) = results.iter().find(|r| r.email == state.email) else {
            continue;
        };
        if result.inserted || result.error_code == Some(MemberErrorCode::InvitationAlreadyExists) {
            state.invited = true;
            state.step = Step::DirectAdd {
                user_ref: state.email.clone(),
            };
        } else if let Some(code) = result.error_code {
            state.step = Step::Rejected(code);
        }
    }
}

/// Render the final outcome list, in input order.
pub fn into_outcomes(states: Vec<CandidateState>) -> Vec<MemberOutcome> {
    states
        .into_iter()
        .map(|state| {
            let (added, unremove, error_code) = match state.step {
                Step::Added { unremove } => (true, unremove, None),
                Step::Rejected(code) => (false, false, Some(code)),
                // Not reachable after the mutation passes; reported as
                // not-added rather than panicking.
                _ => (false, false, None),
            };
            MemberOutcome {
                email: state.email,
                is_admin: state.is_admin,
                added,
                invited: state.invited,
                unremove,
                error_code,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn candidate(email: &str, admin: bool) -> MemberCandidate {
        MemberCandidate {
            email: email.to_string(),
            admin,
        }
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence_flag() {
        let deduped = dedupe_candidates(vec![
            candidate("a@x.edu", true),
            candidate("b@x.edu", false),
            candidate("a@x.edu", false),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].email, "a@x.edu");
        assert!(deduped[0].admin);
    }

    #[test]
    fn test_inserted_invite_becomes_placeholder_add() {
        let mut states = vec![CandidateState::new(candidate("a@x.edu", false), Step::Invite)];
        apply_invite_outcomes(
            &mut states,
            &[InviteOutcome::inserted("a@x.edu", Uuid::new_v4())],
        );
        assert_eq!(
            states[0].step,
            Step::DirectAdd {
                user_ref: "a@x.edu".to_string()
            }
        );
        assert!(states[0].invited);
    }

    #[test]
    fn test_preexisting_invitation_is_benign() {
        let mut states = vec![CandidateState::new(candidate("a@x.edu", false), Step::Invite)];
        apply_invite_outcomes(
            &mut states,
            &[InviteOutcome::rejected(
                "a@x.edu",
                MemberErrorCode::InvitationAlreadyExists,
            )],
        );
        assert_eq!(
            states[0].step,
            Step::DirectAdd {
                user_ref: "a@x.edu".to_string()
            }
        );
    }

    #[test]
    fn test_other_ledger_codes_are_terminal() {
        let mut states = vec![
            CandidateState::new(candidate("a@y.com", false), Step::Invite),
            CandidateState::new(candidate("b@x.edu", false), Step::Invite),
        ];
        apply_invite_outcomes(
            &mut states,
            &[
                InviteOutcome::rejected("a@y.com", MemberErrorCode::DomainPolicyViolation),
                InviteOutcome::rejected("b@x.edu", MemberErrorCode::AccountAlreadyExists),
            ],
        );
        assert_eq!(
            states[0].step,
            Step::Rejected(MemberErrorCode::DomainPolicyViolation)
        );
        assert_eq!(
            states[1].step,
            Step::Rejected(MemberErrorCode::AccountAlreadyExists)
        );
    }

    #[test]
    fn test_non_invite_states_are_untouched() {
        let mut states = vec![CandidateState::new(
            candidate("a@x.edu", false),
            Step::Reactivate {
                user_ref: "some-id".to_string(),
            },
        )];
        apply_invite_outcomes(
            &mut states,
            &[InviteOutcome::rejected(
                "a@x.edu",
                MemberErrorCode::DomainPolicyViolation,
            )],
        );
        assert!(matches!(states[0].step, Step::Reactivate { .. }));
    }

    #[test]
    fn test_outcomes_preserve_order_and_flags() {
        let states = vec![
            CandidateState {
                email: "a@x.edu".to_string(),
                is_admin: true,
                step: Step::Added { unremove: false },
                invited: true,
            },
            CandidateState {
                email: "b@x.edu".to_string(),
                is_admin: false,
                step: Step::Rejected(MemberErrorCode::MemberAlreadyExists),
                invited: false,
            },
            CandidateState {
                email: "c@x.edu".to_string(),
                is_admin: false,
                step: Step::Added { unremove: true },
                invited: false,
            },
        ];
        let outcomes = into_outcomes(states);
        assert_eq!(outcomes[0].email, "a@x.edu");
        assert!(outcomes[0].added && outcomes[0].invited && outcomes[0].is_admin);
        assert!(!outcomes[1].added);
        assert_eq!(
            outcomes[1].error_code,
            Some(MemberErrorCode::MemberAlreadyExists)
        );
        assert!(outcomes[2].added && outcomes[2].unremove);
    }
}
