//! S4: a 5-trustee, 3-of-5 threshold election. With exactly 3 trustees present (meeting
//! quorum, no compensation needed) decryption succeeds; with only 2 present it fails with
//! `DecryptionQuorumNotMet`.

mod support;

use std::collections::BTreeMap;

use eg::ballot::encrypt_ballot;
use eg::ceremony::setup_trustees;
use eg::decryption::{combine, partial_share, verify_partial_share};
use eg::discrete_log::DiscreteLogTable;
use eg::errors::EgError;
use eg::hash::HValue;
use eg::standard_parameters::toy_parameters;
use eg::tally::{BallotState, CiphertextTally};
use util::csprng::Csprng;

const CANDIDATES: [&str; 4] = ["a", "b", "c", "d"];

#[test]
#[allow(clippy::unwrap_used)]
fn three_of_five_succeeds_two_of_five_fails() {
    let fp = toy_parameters();
    let manifest = support::manifest_with_candidates(&CANDIDATES);

    let mut csprng = Csprng::new(b"s4 quorum");
    let base_hash = HValue::generate_random(&mut csprng);
    let (joint_key, extended_base_hash, records) =
        setup_trustees(&mut csprng, base_hash, fp.clone(), 5, 3).unwrap();

    let device_code = HValue::generate_random(&mut csprng);
    let mut tally = CiphertextTally::new(&manifest);

    let ballots: Vec<(String, &str)> = (0..10)
        .map(|i| (format!("ballot-{i}"), CANDIDATES[i % CANDIDATES.len()]))
        .collect();

    for (offset, (ballot_id, chosen)) in ballots.iter().enumerate() {
        let xi = HValue::generate_random(&mut csprng);
        let ballot = support::ballot_for(ballot_id.as_str(), &CANDIDATES, *chosen);
        let encrypted = encrypt_ballot(
            &mut csprng,
            &extended_base_hash,
            &fp,
            &joint_key,
            &manifest,
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
            &extended_base_hash,
            &fp,
            &joint_key,
            &manifest,
            true,
        )
        .unwrap();
        tally.append_to_tally(submitted, &fp).unwrap();
    }
    tally.seal();

    let totals = tally.selection_totals(support::CONTEST_ID).unwrap().clone();
    let dlog = DiscreteLogTable::new(fp.group.clone(), 100).unwrap();
    let ciphertext = &totals["a"];

    // Exactly quorum (3 of 5) present, no compensation: decryption succeeds.
    let three_present: Vec<_> = records.iter().take(3).collect();
    let shares: Vec<_> = three_present
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
    let recovered = combine(&shares, &BTreeMap::new(), 3, &fp, ciphertext, &dlog, None).unwrap();
    assert_eq!(recovered, 3);

    // Only 2 of 5 present, no compensation offered: below quorum.
    let two_present: Vec<_> = records.iter().take(2).collect();
    let shares: Vec<_> = two_present
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
    let result = combine(&shares, &BTreeMap::new(), 3, &fp, ciphertext, &dlog, None);
    assert!(matches!(
        result,
        Err(EgError::DecryptionQuorumNotMet { present: 2, quorum: 3 })
    ));
}
