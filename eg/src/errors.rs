// Copyright (C) Microsoft Corporation. All rights reserved.

#![deny(clippy::expect_used)]
#![deny(clippy::manual_assert)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]

//! Error taxonomy for the election engine. Every public operation returns [`EgResult`]; no
//! error is swallowed internally (the sole transparent "recovery" is discrete-log cache
//! pruning in [`crate::discrete_log`], which is not an error at all).

use thiserror::Error;

pub type TrusteeIndex = u32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EgError {
    // --- ConfigError

    #[error("invalid configuration: n_trustees must be >= 1, got {n_trustees}")]
    ConfigInvalidNTrustees { n_trustees: u32 },

    #[error("invalid configuration: quorum {quorum} must be in [1, n_trustees={n_trustees}]")]
    ConfigInvalidQuorum { quorum: u32, n_trustees: u32 },

    #[error("invalid configuration: {0}")]
    ConfigInvalidManifest(String),

    // --- Arithmetic invariants

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("not a valid element of the subgroup: {0}")]
    InvalidGroupElement(String),

    // --- Proofs

    #[error("failed to generate proof for {statement}")]
    ProofGenerationFailed { statement: String },

    #[error("proof does not verify for {statement}")]
    ProofInvalid { statement: String },

    // --- Key ceremony (C6)

    #[error("trustee {trustee} submitted an invalid key proof")]
    CeremonyKeyProofInvalid { trustee: TrusteeIndex },

    #[error("backup from {dealer} to {recipient} could not be decrypted: {reason}")]
    CeremonyBackupUndecryptable {
        dealer: TrusteeIndex,
        recipient: TrusteeIndex,
        reason: String,
    },

    #[error("backup from {dealer} to {recipient} failed verification (invariant I5)")]
    CeremonyBackupVerificationFailed {
        dealer: TrusteeIndex,
        recipient: TrusteeIndex,
    },

    #[error("key ceremony step replayed with a different payload from trustee {trustee}")]
    CeremonyReplayMismatch { trustee: TrusteeIndex },

    #[error("key ceremony operation invalid in current state {state}: {op}")]
    CeremonyWrongState { state: String, op: String },

    // --- Ballot (C8)

    #[error("ballot style not found: {style_id}")]
    BallotStyleNotFound { style_id: String },

    #[error("vote out of range for selection {selection_id}")]
    BallotVoteOutOfRange { selection_id: String },

    #[error("contest {contest_id} selections sum {actual} != votes_allowed {votes_allowed}")]
    BallotSumConstraintViolated {
        contest_id: String,
        actual: u32,
        votes_allowed: u32,
    },

    #[error("ballot {ballot_id} was already submitted with different content")]
    BallotAlreadySubmitted { ballot_id: String },

    #[error("unknown contest {contest_id} in manifest")]
    BallotUnknownContest { contest_id: String },

    #[error("unknown selection {selection_id} in contest {contest_id}")]
    BallotUnknownSelection {
        contest_id: String,
        selection_id: String,
    },

    // --- Tally (C9)

    #[error("cannot append to a sealed tally")]
    TallyAppendAfterSeal,

    #[error("unknown contest {contest_id} in tally")]
    TallyUnknownContest { contest_id: String },

    #[error("unknown selection {selection_id} in tally")]
    TallyUnknownSelection { selection_id: String },

    // --- Decryption (C10)

    #[error("quorum not met: {present} present trustees, quorum is {quorum}")]
    DecryptionQuorumNotMet { present: u32, quorum: u32 },

    #[error("missing compensation for absent trustee {trustee}")]
    DecryptionMissingCompensation { trustee: TrusteeIndex },

    // --- Resource (C4, cancellation)

    #[error("discrete log exponent too large: ceiling is {ceiling}")]
    ResourceExponentTooLarge { ceiling: u64 },

    #[error("operation cancelled by host")]
    ResourceCancelled,
}

pub type EgResult<T> = std::result::Result<T, EgError>;

/// Host-supplied cooperative-cancellation check, consulted at batch boundaries in
/// [`crate::discrete_log::DiscreteLogTable::find`] and at per-selection boundaries in
/// [`crate::ballot::encrypt_ballot`] and C10's share construction. Returning `true` requests
/// that the operation stop early with [`EgError::ResourceCancelled`].
pub type CancellationCheck<'a> = &'a dyn Fn() -> bool;

pub(crate) fn check_cancelled(cancel: Option<CancellationCheck>) -> EgResult<()> {
    match cancel {
        Some(c) if c() => Err(EgError::ResourceCancelled),
        _ => Ok(()),
    }
}
