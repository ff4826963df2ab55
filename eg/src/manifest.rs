// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Election manifest (C7): contests, selections, and ballot styles. Validation enforces that
//! every contest and selection identifier in a manifest is unique, since contest/selection
//! ids double as components of proof-challenge transcripts (§4.3).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{EgError, EgResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteVariation {
    OneOfM,
    NOfM,
    Approval,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub selection_id: String,
    pub sequence_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    pub contest_id: String,
    pub sequence_order: u32,
    pub selections: Vec<Selection>,
    pub vote_variation: VoteVariation,
    pub votes_allowed: u32,
    pub number_elected: u32,
}

impl Contest {
    pub fn find_selection(&self, selection_id: &str) -> EgResult<&Selection> {
        self.selections
            .iter()
            .find(|s| s.selection_id == selection_id)
            .ok_or_else(|| EgError::BallotUnknownSelection {
                contest_id: self.contest_id.clone(),
                selection_id: selection_id.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotStyle {
    pub style_id: String,
    pub contest_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub label: String,
    pub election_scope_id: String,
    pub spec_version: String,
    pub contests: Vec<Contest>,
    pub ballot_styles: Vec<BallotStyle>,
}

impl Manifest {
    /// Checks contest/selection identifier uniqueness (I1's precondition: `votes_allowed`
    /// must be well-defined per contest) and that every ballot style references only
    /// contests present in the manifest.
    pub fn validate(&self) -> EgResult<()> {
        let mut contest_ids = HashSet::new();
        for contest in &self.contests {
            if !contest_ids.insert(contest.contest_id.as_str()) {
                return Err(EgError::ConfigInvalidManifest(format!(
                    "duplicate contest id {}",
                    contest.contest_id
                )));
            }
            let mut selection_ids = HashSet::new();
            for selection in &contest.selections {
                if !selection_ids.insert(selection.selection_id.as_str()) {
                    return Err(EgError::ConfigInvalidManifest(format!(
                        "duplicate selection id {} in contest {}",
                        selection.selection_id, contest.contest_id
                    )));
                }
            }
            if contest.votes_allowed == 0 {
                return Err(EgError::ConfigInvalidManifest(format!(
                    "contest {} has votes_allowed == 0",
                    contest.contest_id
                )));
            }
        }

        let mut style_ids = HashSet::new();
        for style in &self.ballot_styles {
            if !style_ids.insert(style.style_id.as_str()) {
                return Err(EgError::ConfigInvalidManifest(format!(
                    "duplicate ballot style id {}",
                    style.style_id
                )));
            }
            for contest_id in &style.contest_ids {
                if !contest_ids.contains(contest_id.as_str()) {
                    return Err(EgError::ConfigInvalidManifest(format!(
                        "ballot style {} references unknown contest {}",
                        style.style_id, contest_id
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn get_ballot_style(&self, style_id: &str) -> EgResult<&BallotStyle> {
        self.ballot_styles
            .iter()
            .find(|s| s.style_id == style_id)
            .ok_or_else(|| EgError::BallotStyleNotFound {
                style_id: style_id.to_string(),
            })
    }

    pub fn get_contest(&self, contest_id: &str) -> EgResult<&Contest> {
        self.contests
            .iter()
            .find(|c| c.contest_id == contest_id)
            .ok_or_else(|| EgError::BallotUnknownContest {
                contest_id: contest_id.to_string(),
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_manifest() -> Manifest {
        Manifest {
            label: "Sample Election".into(),
            election_scope_id: "sample-2026".into(),
            spec_version: "1.0".into(),
            contests: vec![Contest {
                contest_id: "mayor".into(),
                sequence_order: 0,
                selections: vec![
                    Selection {
                        selection_id: "alice".into(),
                        sequence_order: 0,
                    },
                    Selection {
                        selection_id: "bob".into(),
                        sequence_order: 1,
                    },
                ],
                vote_variation: VoteVariation::OneOfM,
                votes_allowed: 1,
                number_elected: 1,
            }],
            ballot_styles: vec![BallotStyle {
                style_id: "precinct-1".into(),
                contest_ids: vec!["mayor".into()],
            }],
        }
    }

    #[test]
    fn valid_manifest_passes() {
        assert!(sample_manifest().validate().is_ok());
    }

    #[test]
    fn duplicate_contest_id_rejected() {
        let mut manifest = sample_manifest();
        let dup = manifest.contests[0].clone();
        manifest.contests.push(dup);
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn ballot_style_referencing_unknown_contest_rejected() {
        let mut manifest = sample_manifest();
        manifest.ballot_styles[0].contest_ids.push("nonexistent".into());
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn unknown_ballot_style_lookup_fails() {
        let manifest = sample_manifest();
        assert!(manifest.get_ballot_style("nope").is_err());
    }
}
