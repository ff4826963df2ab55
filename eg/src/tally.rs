// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Ballot box and homomorphic tally (C9): submitted ballots are partitioned into CAST and
//! SPOILED, and cast ciphertexts are folded into a running per-selection sum. Submission is
//! idempotent on byte-identical resubmission and rejects conflicting resubmission under the
//! same ballot id.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ballot::{verify_ballot, CiphertextBallot};
use crate::el_gamal::{ElGamalCiphertext, ElGamalPublicKey};
use crate::errors::{EgError, EgResult};
use crate::fixed_parameters::FixedParameters;
use crate::hash::HValue;
use crate::manifest::Manifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallotState {
    Cast,
    Spoiled,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedBallot {
    pub ciphertext_ballot: CiphertextBallot,
    pub state: BallotState,
    pub submission_timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextTally {
    /// Per-contest, per-selection running sum of cast ciphertexts.
    contests: BTreeMap<String, BTreeMap<String, ElGamalCiphertext>>,
    cast_ballot_ids: BTreeSet<String>,
    spoiled_ballot_ids: BTreeSet<String>,
    submitted: BTreeMap<String, SubmittedBallot>,
    sealed: bool,
}

impl CiphertextTally {
    pub fn new(manifest: &Manifest) -> Self {
        let mut contests = BTreeMap::new();
        for contest in &manifest.contests {
            let mut selections = BTreeMap::new();
            for selection in &contest.selections {
                selections.insert(selection.selection_id.clone(), ElGamalCiphertext::identity());
            }
            contests.insert(contest.contest_id.clone(), selections);
        }
        CiphertextTally {
            contests,
            cast_ballot_ids: BTreeSet::new(),
            spoiled_ballot_ids: BTreeSet::new(),
            submitted: BTreeMap::new(),
            sealed: false,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn cast_ballot_ids(&self) -> &BTreeSet<String> {
        &self.cast_ballot_ids
    }

    pub fn spoiled_ballot_ids(&self) -> &BTreeSet<String> {
        &self.spoiled_ballot_ids
    }

    pub fn selection_totals(&self, contest_id: &str) -> EgResult<&BTreeMap<String, ElGamalCiphertext>> {
        self.contests
            .get(contest_id)
            .ok_or_else(|| EgError::TallyUnknownContest {
                contest_id: contest_id.to_string(),
            })
    }

    pub fn get_submitted(&self, ballot_id: &str) -> Option<&SubmittedBallot> {
        self.submitted.get(ballot_id)
    }

    /// Validates the ciphertext ballot (proofs + manifest references) and tags it CAST or
    /// SPOILED. Does not fold it into the running tally; call [`Self::append_to_tally`] for
    /// that.
    pub fn submit(
        ciphertext_ballot: CiphertextBallot,
        state: BallotState,
        submission_timestamp: u64,
        base_hash: &HValue,
        fixed_parameters: &FixedParameters,
        public_key: &ElGamalPublicKey,
        manifest: &Manifest,
        verify_on_submit: bool,
    ) -> EgResult<SubmittedBallot> {
        if verify_on_submit {
            verify_ballot(base_hash, fixed_parameters, public_key, &ciphertext_ballot, manifest)?;
        }
        Ok(SubmittedBallot {
            ciphertext_ballot,
            state,
            submission_timestamp,
        })
    }

    /// Folds a submitted CAST ballot's selections into the running tally; SPOILED ballots
    /// are only tracked by id for later per-ballot decryption. Resubmission of the same
    /// ballot id with byte-identical content is a no-op; resubmission with different content
    /// is rejected.
    pub fn append_to_tally(&mut self, submitted: SubmittedBallot, fixed_parameters: &FixedParameters) -> EgResult<()> {
        if self.sealed {
            return Err(EgError::TallyAppendAfterSeal);
        }

        let ballot_id = submitted.ciphertext_ballot.ballot_id.clone();
        if let Some(existing) = self.submitted.get(&ballot_id) {
            if *existing == submitted {
                return Ok(());
            }
            return Err(EgError::BallotAlreadySubmitted { ballot_id });
        }

        match submitted.state {
            BallotState::Cast => {
                for contest in &submitted.ciphertext_ballot.contests {
                    let selections = self
                        .contests
                        .get_mut(&contest.contest_id)
                        .ok_or_else(|| EgError::TallyUnknownContest {
                            contest_id: contest.contest_id.clone(),
                        })?;
                    for selection in &contest.selections {
                        let running = selections.get_mut(&selection.selection_id).ok_or_else(|| {
                            EgError::TallyUnknownSelection {
                                selection_id: selection.selection_id.clone(),
                            }
                        })?;
                        *running = running.homomorphic_add(&selection.ciphertext, &fixed_parameters.group);
                    }
                }
                self.cast_ballot_ids.insert(ballot_id.clone());
            }
            BallotState::Spoiled => {
                self.spoiled_ballot_ids.insert(ballot_id.clone());
            }
            BallotState::Unknown => {}
        }

        self.submitted.insert(ballot_id, submitted);
        Ok(())
    }

    /// Forbids further appends. Irreversible: a sealed tally can only be decrypted (C10).
    pub fn seal(&mut self) {
        self.sealed = true;
        info!(
            cast = self.cast_ballot_ids.len(),
            spoiled = self.spoiled_ballot_ids.len(),
            "ballot box sealed"
        );
    }
}
