//! S2: a 3-trustee, 2-of-3 threshold election tallies 5 ballots over 3 candidates with all
//! trustees present. S3 repeats the same election but with trustee 3 absent; trustees 1 and 2
//! each compensate for it, and the recovered tally must match S2 exactly.

mod support;

use std::collections::BTreeMap;

use eg::ballot::encrypt_ballot;
use eg::ceremony::setup_trustees;
use eg::decryption::{combine, compensated_share, partial_share, verify_compensated_share, verify_partial_share};
use eg::discrete_log::DiscreteLogTable;
use eg::hash::HValue;
use eg::standard_parameters::toy_parameters;
use eg::tally::{BallotState, CiphertextTally};
use util::csprng::Csprng;

const CANDIDATES: [&str; 3] = ["a", "b", "c"];
const BALLOTS: [(&str, &str); 5] = [
    ("ballot-1", "a"),
    ("ballot-2", "a"),
    ("ballot-3", "b"),
    ("ballot-4", "a"),
    ("ballot-5", "c"),
];

#[allow(clippy::unwrap_used)]
fn cast_ballots_and_seal(
    csprng: &mut Csprng,
    extended_base_hash: &HValue,
    fp: &eg::fixed_parameters::FixedParameters,
    joint_key: &eg::el_gamal::ElGamalPublicKey,
    manifest: &eg::manifest::Manifest,
) -> CiphertextTally {
    let device_code = HValue::generate_random(csprng);
    let mut tally = CiphertextTally::new(manifest);

    for (offset, (ballot_id, chosen)) in BALLOTS.iter().enumerate() {
        let xi = HValue::generate_random(csprng);
        let ballot = support::ballot_for(ballot_id, &CANDIDATES, *chosen);
        let encrypted = encrypt_ballot(
            csprng,
            extended_base_hash,
            fp,
            joint_key,
            manifest,
            &ballot,
            &xi,
            &device_code,
            None,
            1_000 + offset as u64,
            None,
        )
        .unwrap();
        let submitted = CiphertextTally::submit(
            encrypted,
            BallotState::Cast,
            1_000 + offset as u64,
            extended_base_hash,
            fp,
            joint_key,
            manifest,
            true,
        )
        .unwrap();
        tally.append_to_tally(submitted, fp).unwrap();
    }
    tally.seal();
    tally
}

#[test]
#[allow(clippy::unwrap_used)]
fn full_quorum_and_compensated_quorum_agree() {
    let fp = toy_parameters();
    let manifest = support::manifest_with_candidates(&CANDIDATES);

    let mut csprng = Csprng::new(b"s2 s3 threshold");
    let base_hash = HValue::generate_random(&mut csprng);
    let (joint_key, extended_base_hash, records) =
        setup_trustees(&mut csprng, base_hash, fp.clone(), 3, 2).unwrap();

    let tally = cast_ballots_and_seal(&mut csprng, &extended_base_hash, &fp, &joint_key, &manifest);
    let totals = tally.selection_totals(support::CONTEST_ID).unwrap().clone();
    let dlog = DiscreteLogTable::new(fp.group.clone(), 100).unwrap();

    let expected = [("a", 3_u64), ("b", 1_u64), ("c", 1_u64)];

    // S2: all three trustees present.
    for (candidate, count) in expected {
        let ciphertext = &totals[candidate];
        let shares: Vec<_> = records
            .iter()
            .map(|r| {
                let public_share_key = fp.group.g_exp(r.secret.constant_term());
                let share = partial_share(
                    &mut csprng,
                    &extended_base_hash,
                    &fp,
                    ciphertext,
                    r.trustee,
                    r.secret.constant_term(),
                    &public_share_key,
                    None,
                )
                .unwrap();
                assert!(verify_partial_share(&extended_base_hash, &fp, ciphertext, &public_share_key, &share).is_ok());
                share
            })
            .collect();
        let recovered = combine(&shares, &BTreeMap::new(), 2, &fp, ciphertext, &dlog, None).unwrap();
        assert_eq!(recovered, count);
    }

    // S3: trustee 3 is absent; trustees 1 and 2 each compensate for it.
    let absent = 3_u32;
    let absent_record = records.iter().find(|r| r.trustee == absent).unwrap();
    let present: Vec<_> = records.iter().filter(|r| r.trustee != absent).collect();

    for (candidate, count) in expected {
        let ciphertext = &totals[candidate];

        let present_shares: Vec<_> = present
            .iter()
            .map(|r| {
                let public_share_key = fp.group.g_exp(r.secret.constant_term());
                partial_share(
                    &mut csprng,
                    &extended_base_hash,
                    &fp,
                    ciphertext,
                    r.trustee,
                    r.secret.constant_term(),
                    &public_share_key,
                    None,
                )
                .unwrap()
            })
            .collect();

        let compensations: Vec<_> = present
            .iter()
            .map(|r| {
                let backup_value = &r.shares_received[&absent];
                let comp = compensated_share(
                    &mut csprng,
                    &extended_base_hash,
                    &fp,
                    ciphertext,
                    absent,
                    r.trustee,
                    backup_value,
                    &absent_record.public_coefficients,
                    None,
                )
                .unwrap();
                assert!(verify_compensated_share(
                    &extended_base_hash,
                    &fp,
                    ciphertext,
                    &absent_record.public_coefficients,
                    &comp
                )
                .is_ok());
                comp
            })
            .collect();

        let mut by_absent = BTreeMap::new();
        by_absent.insert(absent, compensations);

        let recovered = combine(&present_shares, &by_absent, 2, &fp, ciphertext, &dlog, None).unwrap();
        assert_eq!(recovered, count);
    }
}
