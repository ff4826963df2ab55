//! Shared fixtures for the end-to-end scenario tests (S1-S6). Builds manifests and ballots
//! the way an external host would, using only `eg`'s public API.

use eg::ballot::{CiphertextBallot, PlaintextBallot, PlaintextContest, PlaintextSelection};
use eg::manifest::{BallotStyle, Contest, Manifest, Selection, VoteVariation};

pub const CONTEST_ID: &str = "contest";
pub const STYLE_ID: &str = "style";

/// A single one-of-m contest over `candidates`, with one ballot style covering it.
pub fn manifest_with_candidates(candidates: &[&str]) -> Manifest {
    Manifest {
        label: "Test Election".into(),
        election_scope_id: "scope".into(),
        spec_version: "1.0".into(),
        contests: vec![Contest {
            contest_id: CONTEST_ID.into(),
            sequence_order: 0,
            selections: candidates
                .iter()
                .enumerate()
                .map(|(i, c)| Selection {
                    selection_id: (*c).to_string(),
                    sequence_order: i as u32,
                })
                .collect(),
            vote_variation: VoteVariation::OneOfM,
            votes_allowed: 1,
            number_elected: 1,
        }],
        ballot_styles: vec![BallotStyle {
            style_id: STYLE_ID.into(),
            contest_ids: vec![CONTEST_ID.into()],
        }],
    }
}

pub fn ballot_for(ballot_id: &str, candidates: &[&str], chosen: &str) -> PlaintextBallot {
    PlaintextBallot {
        ballot_id: ballot_id.into(),
        style_id: STYLE_ID.into(),
        contests: vec![PlaintextContest {
            contest_id: CONTEST_ID.into(),
            selections: candidates
                .iter()
                .map(|c| PlaintextSelection {
                    selection_id: (*c).to_string(),
                    vote: *c == chosen,
                })
                .collect(),
        }],
    }
}

/// Flips the first selection's disjunctive-proof response to an arbitrary, still
/// field-valid, different value by editing the wire (serde) encoding directly -- the way a
/// tamper between ballot box and host would, not by reaching into proof internals.
#[allow(clippy::unwrap_used)]
pub fn tamper_first_selection_proof(ballot: &mut CiphertextBallot) {
    let selection = &mut ballot.contests[0].selections[0];
    let mut encoded = serde_json::to_value(&selection.proof).unwrap();
    let response = encoded
        .get_mut("branches")
        .unwrap()
        .get_mut(0)
        .unwrap()
        .get_mut("response")
        .unwrap();
    let current = response.as_str().unwrap().to_string();
    let replacement = if current.ends_with("01") { "02" } else { "01" };
    let mut tampered = current[..current.len() - 2].to_string();
    tampered.push_str(replacement);
    *response = serde_json::Value::String(tampered);
    selection.proof = serde_json::from_value(encoded).unwrap();
}
