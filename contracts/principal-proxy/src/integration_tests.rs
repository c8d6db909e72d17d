//! Wallet scenarios against a live ledger

use proxyvote_common::{
    constants::{pct::ONE_PERCENT, time::ONE_DAY},
    testing::{CheckpointToken, RecordingRunner},
    types::{Address, CallContext, VoteId, VoterState, VotingSettings},
    VotingError,
};
use proxyvote_voting::VoteLedger;

use crate::PrincipalProxyWallet;

const WALLET: Address = [0xC0; 32];
const INSTANCE: Address = [0xA0; 32];
const OTHER_INSTANCE: Address = [0xB0; 32];
const TOKEN: Address = [0xAA; 32];
const VOTE_TIME: u64 = 5 * ONE_DAY;
const WINDOW: u64 = ONE_DAY;

fn principal() -> Address {
    [1u8; 32]
}

fn representative() -> Address {
    [2u8; 32]
}

fn other_representative() -> Address {
    [3u8; 32]
}

fn holder() -> Address {
    [4u8; 32]
}

fn at(sender: Address, timestamp: u64) -> CallContext {
    CallContext::new(sender, timestamp, 2)
}

struct World {
    wallet: PrincipalProxyWallet,
    ledger: VoteLedger,
    token: CheckpointToken,
    runner: RecordingRunner,
    vote_id: VoteId,
}

/// Principal deposits 51 into the wallet; a holder keeps 49 and opens a vote
fn world() -> World {
    let settings = VotingSettings::new(50 * ONE_PERCENT, 20 * ONE_PERCENT, VOTE_TIME).unwrap();
    let mut ledger = VoteLedger::new(INSTANCE, [9u8; 32], settings).unwrap();

    let mut token = CheckpointToken::new(TOKEN);
    token.set_block(1);
    token.mint(principal(), 51);
    token.mint(holder(), 49);
    token.set_block(2);
    assert!(proxyvote_common::TokenCustody::transfer(&mut token, &TOKEN, &principal(), &WALLET, 51));
    token.set_block(3);

    let mut runner = RecordingRunner::new();
    let vote_id = ledger
        .new_vote_ext(
            &CallContext::new(holder(), 0, 3),
            &token,
            &mut runner,
            vec![1],
            String::new(),
            false,
            false,
        )
        .unwrap();

    let mut wallet = PrincipalProxyWallet::new(WALLET, principal(), WINDOW);
    wallet
        .set_full_representative(&at(principal(), 0), representative(), true)
        .unwrap();

    World {
        wallet,
        ledger,
        token,
        runner,
        vote_id,
    }
}

#[test]
fn test_proxy_vote_records_wallet_ballot() {
    let mut w = world();
    let weight = w
        .wallet
        .proxy_vote(&at(representative(), ONE_DAY), &mut w.ledger, &w.token, w.vote_id, false)
        .unwrap();

    assert_eq!(weight, 51);
    assert_eq!(
        w.ledger.get_voter_state(w.vote_id, &WALLET).unwrap(),
        VoterState::Nay
    );
    assert!(!w.wallet.has_not_voted_yet(&w.ledger, w.vote_id).unwrap());
}

#[test]
fn test_proxy_vote_requires_allowance() {
    let mut w = world();
    assert_eq!(
        w.wallet
            .proxy_vote(&at(other_representative(), 0), &mut w.ledger, &w.token, w.vote_id, true),
        Err(VotingError::RepresentativeNotAllowed {
            principal: WALLET,
            representative: other_representative(),
        })
    );

    // Allowed for another instance or another vote only
    let p = at(principal(), 0);
    w.wallet
        .set_instance_representative(&p, other_representative(), OTHER_INSTANCE, true)
        .unwrap();
    w.wallet
        .set_vote_representative(&p, other_representative(), INSTANCE, w.vote_id + 1, true)
        .unwrap();
    assert!(matches!(
        w.wallet
            .proxy_vote(&at(other_representative(), 0), &mut w.ledger, &w.token, w.vote_id, true),
        Err(VotingError::RepresentativeNotAllowed { .. })
    ));

    // Allowed for this vote
    w.wallet
        .set_vote_representative(&p, other_representative(), INSTANCE, w.vote_id, true)
        .unwrap();
    assert!(w
        .wallet
        .proxy_vote(&at(other_representative(), 0), &mut w.ledger, &w.token, w.vote_id, true)
        .is_ok());
}

#[test]
fn test_proxy_vote_missing_vote() {
    let mut w = world();
    assert_eq!(
        w.wallet
            .proxy_vote(&at(representative(), 0), &mut w.ledger, &w.token, 99, true),
        Err(VotingError::NoSuchVote { vote_id: 99 })
    );
}

#[test]
fn test_overrule_window_boundaries() {
    let w = world();
    let window_start = VOTE_TIME - WINDOW;

    assert!(!w.wallet.within_overrule_window(&w.ledger, window_start - 1, w.vote_id).unwrap());
    assert!(w.wallet.within_overrule_window(&w.ledger, window_start, w.vote_id).unwrap());
    assert!(w.wallet.within_overrule_window(&w.ledger, VOTE_TIME - 1, w.vote_id).unwrap());
    assert!(!w.wallet.within_overrule_window(&w.ledger, VOTE_TIME, w.vote_id).unwrap());

    let mut early = world();
    assert!(early
        .wallet
        .proxy_vote(&at(representative(), window_start - 1), &mut early.ledger, &early.token, early.vote_id, true)
        .is_ok());

    let mut late = world();
    assert_eq!(
        late.wallet
            .proxy_vote(&at(representative(), window_start), &mut late.ledger, &late.token, late.vote_id, true),
        Err(VotingError::WithinOverruleWindow { vote_id: late.vote_id })
    );

    let mut closed = world();
    assert_eq!(
        closed
            .wallet
            .proxy_vote(&at(representative(), VOTE_TIME + 1), &mut closed.ledger, &closed.token, closed.vote_id, true),
        Err(VotingError::CanNotVote { vote_id: closed.vote_id, voter: WALLET })
    );
}

#[test]
fn test_one_active_cast_then_principal_overrides() {
    let mut w = world();
    w.wallet
        .set_full_representative(&at(principal(), 0), other_representative(), true)
        .unwrap();

    w.wallet
        .proxy_vote(&at(representative(), ONE_DAY), &mut w.ledger, &w.token, w.vote_id, false)
        .unwrap();
    let vote = w.ledger.get_vote(w.vote_id).unwrap();
    assert_eq!((vote.yea, vote.nay), (0, 51));

    assert_eq!(
        w.wallet
            .proxy_vote(&at(other_representative(), ONE_DAY), &mut w.ledger, &w.token, w.vote_id, true),
        Err(VotingError::VoteAlreadyCast { vote_id: w.vote_id, voter: WALLET })
    );
    assert!(matches!(
        w.wallet
            .proxy_vote(&at(representative(), ONE_DAY), &mut w.ledger, &w.token, w.vote_id, true),
        Err(VotingError::VoteAlreadyCast { .. })
    ));

    // Principal flips the ballot inside the window and triggers execution
    w.wallet
        .vote(
            &at(principal(), VOTE_TIME - 1),
            &mut w.ledger,
            &w.token,
            &mut w.runner,
            w.vote_id,
            true,
            true,
        )
        .unwrap();
    let vote = w.ledger.get_vote(w.vote_id).unwrap();
    assert_eq!((vote.yea, vote.nay), (51, 0));
    assert!(vote.executed);
    assert_eq!(w.runner.runs(), 1);
}

#[test]
fn test_principal_only_votes() {
    let mut w = world();
    assert_eq!(
        w.wallet.vote(
            &at(representative(), 0),
            &mut w.ledger,
            &w.token,
            &mut w.runner,
            w.vote_id,
            true,
            false,
        ),
        Err(VotingError::SenderNotPrincipal {
            expected: principal(),
            actual: representative(),
        })
    );
}
