//! End-to-end authorization behavior over the in-memory store.
//!
//! Covers grant, revoke and overwrite semantics, comparator behavior through
//! the gate, multi-account expansion, change-set ordering and atomicity, and
//! administration.

use authorizer::core::Word;
use authorizer::{
    pack1, pack3, Account, ArityPolicy, AuthError, Authorizer, AuthorizerConfig, ChangeSet,
    Condition, Decision, MemoryStore, Operation, AUTHORIZE,
};
use proptest::prelude::*;
use std::cell::RefCell;

const WITHDRAW: &str = "withdraw(address,uint256,address)";
const SET_FEE: &str = "setFee(uint256)";

struct World {
    authorizer: Authorizer<MemoryStore>,
    owner: Account,
    vault: Account,
}

fn account(label: &str) -> Account {
    Account::derive(label)
}

fn world_with(config: AuthorizerConfig) -> World {
    let owner = account("owner");
    let authorizer = Authorizer::new(account("authorizer"), MemoryStore::new(), config).unwrap();
    authorizer.initialize(&[owner]).unwrap();
    World {
        authorizer,
        owner,
        vault: account("vault"),
    }
}

fn world() -> World {
    world_with(AuthorizerConfig::default())
}

fn set_fee() -> Operation {
    Operation::resolve(SET_FEE)
}

#[test]
fn test_concrete_withdraw_scenario() {
    let w = world();
    let relayer = Account::from_hex("0x0000000000000000000000000000000000000aaa").unwrap();
    let (token_x, token_y) = (account("token-x"), account("token-y"));
    let recipient = account("recipient");

    w.authorizer
        .authorize(w.owner, relayer, w.vault, WITHDRAW, vec![Condition::eq(token_x)])
        .unwrap();

    let withdraw = Operation::resolve(WITHDRAW);
    assert!(w
        .authorizer
        .is_authorized(relayer, w.vault, withdraw, &pack3(token_x, 10u64, recipient))
        .unwrap());
    assert!(!w
        .authorizer
        .is_authorized(relayer, w.vault, withdraw, &pack3(token_y, 10u64, recipient))
        .unwrap());
}

#[test]
fn test_grant_then_revoke_denies() {
    let w = world();
    let operator = account("operator");

    w.authorizer.authorize(w.owner, operator, w.vault, SET_FEE, vec![]).unwrap();
    assert!(w.authorizer.is_authorized(operator, w.vault, set_fee(), &pack1(1u64)).unwrap());

    w.authorizer.unauthorize(w.owner, operator, w.vault, SET_FEE).unwrap();
    assert!(!w.authorizer.is_authorized(operator, w.vault, set_fee(), &pack1(1u64)).unwrap());
}

#[test]
fn test_regrant_replaces_conditions() {
    let w = world();
    let operator = account("operator");

    w.authorizer
        .authorize(w.owner, operator, w.vault, SET_FEE, vec![Condition::lte(100u64)])
        .unwrap();
    w.authorizer
        .authorize(w.owner, operator, w.vault, SET_FEE, vec![Condition::gte(200u64)])
        .unwrap();

    assert_eq!(
        w.authorizer.get_conditions(operator, w.vault, set_fee()).unwrap(),
        vec![Condition::gte(200u64)]
    );
    assert!(!w.authorizer.is_authorized(operator, w.vault, set_fee(), &pack1(50u64)).unwrap());
    assert!(w.authorizer.is_authorized(operator, w.vault, set_fee(), &pack1(250u64)).unwrap());
}

#[test]
fn test_gt_boundary() {
    let w = world();
    let operator = account("operator");
    w.authorizer
        .authorize(w.owner, operator, w.vault, SET_FEE, vec![Condition::gt(100u64)])
        .unwrap();

    let check = |fee: u64| {
        w.authorizer
            .is_authorized(operator, w.vault, set_fee(), &pack1(fee))
            .unwrap()
    };
    assert!(check(101));
    assert!(!check(100));
    assert!(!check(99));
}

#[test]
fn test_eq_and_neq_through_gate() {
    let w = world();
    let (a, b) = (account("a"), account("b"));
    w.authorizer
        .apply(
            w.owner,
            &ChangeSet::on(w.vault)
                .grant(a, SET_FEE, vec![Condition::eq(7u64)])
                .grant(b, SET_FEE, vec![Condition::neq(7u64)]),
        )
        .unwrap();

    assert!(w.authorizer.is_authorized(a, w.vault, set_fee(), &pack1(7u64)).unwrap());
    assert!(!w.authorizer.is_authorized(a, w.vault, set_fee(), &pack1(8u64)).unwrap());
    assert!(!w.authorizer.is_authorized(b, w.vault, set_fee(), &pack1(7u64)).unwrap());
    assert!(w.authorizer.is_authorized(b, w.vault, set_fee(), &pack1(8u64)).unwrap());
}

#[test]
fn test_partial_revoke_of_expanded_grant() {
    let w = world();
    let (a, b, c) = (account("a"), account("b"), account("c"));

    w.authorizer
        .apply(w.owner, &ChangeSet::on(w.vault).grant([a, b, c], SET_FEE, vec![]))
        .unwrap();
    w.authorizer
        .apply(w.owner, &ChangeSet::on(w.vault).revoke(b, SET_FEE))
        .unwrap();

    let args = pack1(1u64);
    assert!(w.authorizer.is_authorized(a, w.vault, set_fee(), &args).unwrap());
    assert!(!w.authorizer.is_authorized(b, w.vault, set_fee(), &args).unwrap());
    assert!(w.authorizer.is_authorized(c, w.vault, set_fee(), &args).unwrap());
}

#[test]
fn test_same_set_grant_and_revoke_ends_revoked() {
    // Regression: grants apply before revokes, whatever order the set lists them.
    let w = world();
    let operator = account("operator");

    let set = ChangeSet::on(w.vault)
        .revoke(operator, SET_FEE)
        .grant(operator, SET_FEE, vec![]);
    let report = w.authorizer.apply(w.owner, &set).unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.revoked, 1);
    assert!(!w.authorizer.is_granted(operator, w.vault, set_fee()).unwrap());
}

#[test]
fn test_revoking_absent_permission_is_noop() {
    let w = world();
    let report = w
        .authorizer
        .unauthorize(w.owner, account("nobody"), w.vault, SET_FEE)
        .unwrap();
    assert_eq!(report.absent, 1);
    assert_eq!(report.revoked, 0);
}

#[test]
fn test_unauthorized_set_changes_nothing() {
    let w = world();
    let operator = account("operator");

    // The owner may administer; the operator may not. The operator's set
    // mixes a revoke of an existing permission with a new grant.
    w.authorizer.authorize(w.owner, operator, w.vault, SET_FEE, vec![]).unwrap();
    let before = w.authorizer.permissions_on(&w.vault).unwrap();

    let set = ChangeSet::on(w.vault)
        .grant(operator, "pause()", vec![])
        .revoke(operator, SET_FEE);
    let err = w.authorizer.apply(operator, &set).unwrap_err();

    assert!(matches!(err, AuthError::UnauthorizedChangeSet { .. }));
    assert_eq!(w.authorizer.permissions_on(&w.vault).unwrap(), before);
}

#[test]
fn test_scoped_admin() {
    let w = world();
    let delegate = account("delegate");
    let other = account("other-module");

    // The delegate may grant anything on the vault only.
    w.authorizer
        .authorize(
            w.owner,
            delegate,
            w.authorizer.account(),
            AUTHORIZE,
            vec![Condition::neq(Account::ZERO), Condition::eq(w.vault)],
        )
        .unwrap();

    assert!(w
        .authorizer
        .authorize(delegate, account("operator"), w.vault, SET_FEE, vec![])
        .is_ok());
    assert!(matches!(
        w.authorizer.authorize(delegate, account("operator"), other, SET_FEE, vec![]),
        Err(AuthError::UnauthorizedChangeSet { .. })
    ));
    // Granting does not imply revoking.
    assert!(w
        .authorizer
        .unauthorize(delegate, account("operator"), w.vault, SET_FEE)
        .is_err());
}

#[test]
fn test_admin_checks_use_state_before_the_set() {
    let w = world();
    let delegate = account("delegate");
    let this = w.authorizer.account();
    let scoped = vec![Condition::neq(Account::ZERO), Condition::eq(this)];

    // The delegate may only grant admin permissions on the authorizer itself.
    w.authorizer
        .authorize(w.owner, delegate, this, AUTHORIZE, scoped.clone())
        .unwrap();

    // Widening its own grant and using the wider grant in the same batch
    // must fail: the second entry is checked against the scoped grant.
    let widen = ChangeSet::on(this).grant(delegate, AUTHORIZE, vec![]);
    let escalation = ChangeSet::on(w.vault).grant(account("operator"), SET_FEE, vec![]);
    assert!(matches!(
        w.authorizer.apply_all(delegate, &[widen.clone(), escalation.clone()]),
        Err(AuthError::UnauthorizedChangeSet { .. })
    ));
    assert_eq!(
        w.authorizer.get_conditions(delegate, this, Operation::resolve(AUTHORIZE)).unwrap(),
        scoped
    );

    // Applied separately, the widened grant takes effect for later sets.
    w.authorizer.apply(delegate, &widen).unwrap();
    assert!(w.authorizer.apply(delegate, &escalation).is_ok());
}

#[test]
fn test_self_is_an_ordinary_identity() {
    let w = world();
    // who == where: the vault calling into itself still needs a permission.
    assert!(!w.authorizer.is_authorized(w.vault, w.vault, set_fee(), &pack1(1u64)).unwrap());

    w.authorizer.authorize(w.owner, w.vault, w.vault, SET_FEE, vec![]).unwrap();
    assert!(w.authorizer.is_authorized(w.vault, w.vault, set_fee(), &pack1(1u64)).unwrap());
}

#[test]
fn test_arity_mismatch_denies() {
    let w = world();
    let relayer = account("relayer");
    let token = account("token-x");
    w.authorizer
        .authorize(
            w.owner,
            relayer,
            w.vault,
            WITHDRAW,
            vec![Condition::eq(token), Condition::lte(10u64)],
        )
        .unwrap();

    let withdraw = Operation::resolve(WITHDRAW);
    assert_eq!(
        w.authorizer.decide(relayer, w.vault, withdraw, &pack1(token)).unwrap(),
        Decision::ArityMismatch {
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn test_exact_arity_policy() {
    let config = AuthorizerConfig {
        arity_policy: ArityPolicy::Exact,
        ..AuthorizerConfig::default()
    };
    let w = world_with(config);
    let relayer = account("relayer");
    let token = account("token-x");

    w.authorizer
        .authorize(w.owner, relayer, w.vault, WITHDRAW, vec![Condition::eq(token)])
        .unwrap();

    let withdraw = Operation::resolve(WITHDRAW);
    let args = pack3(token, 10u64, account("recipient"));
    assert!(!w.authorizer.is_authorized(relayer, w.vault, withdraw, &args).unwrap());
    assert!(w.authorizer.is_authorized(relayer, w.vault, withdraw, &pack1(token)).unwrap());
}

#[test]
fn test_execution_sees_in_flight_changes() {
    let w = world();
    let operator = account("operator");

    w.authorizer
        .execute(|exec| -> Result<(), AuthError> {
            assert!(!exec.is_authorized(operator, w.vault, set_fee(), &pack1(1u64))?);
            exec.authorize(w.owner, operator, w.vault, SET_FEE, vec![])?;
            exec.authenticate(operator, w.vault, set_fee(), &pack1(1u64))?;

            // Not yet visible outside the execution.
            assert!(!w.authorizer.is_granted(operator, w.vault, set_fee())?);
            assert_eq!(exec.pending().len(), 1);
            Ok(())
        })
        .unwrap();

    assert!(w.authorizer.is_granted(operator, w.vault, set_fee()).unwrap());
}

#[test]
fn test_failed_execution_discards_changes() {
    let w = world();
    let operator = account("operator");

    let result = w.authorizer.execute(|exec| -> Result<(), AuthError> {
        exec.authorize(w.owner, operator, w.vault, SET_FEE, vec![Condition::lte(10u64)])?;
        // The guarded call that follows is denied, aborting the operation.
        exec.authenticate(operator, w.vault, set_fee(), &pack1(50u64))?;
        Ok(())
    });

    assert!(matches!(
        result,
        Err(AuthError::PermissionDenied {
            decision: Decision::ConditionFailed { position: 0 },
            ..
        })
    ));
    assert!(!w.authorizer.is_granted(operator, w.vault, set_fee()).unwrap());
}

#[test]
fn test_execution_admin_checks_see_earlier_sets() {
    let w = world();
    let delegate = account("delegate");

    w.authorizer
        .execute(|exec| -> Result<(), AuthError> {
            exec.authorize(w.owner, delegate, w.authorizer.account(), AUTHORIZE, vec![])?;
            // A later set in the same execution may rely on the earlier one.
            exec.authorize(delegate, account("operator"), w.vault, SET_FEE, vec![])?;
            Ok(())
        })
        .unwrap();

    assert!(w
        .authorizer
        .is_granted(account("operator"), w.vault, set_fee())
        .unwrap());
}

#[test]
fn test_execution_effects_follow_the_outcome() {
    let w = world();
    let operator = account("operator");
    let log = RefCell::new(Vec::new());

    w.authorizer
        .execute(|exec| -> Result<(), AuthError> {
            exec.authorize(w.owner, operator, w.vault, SET_FEE, vec![])?;
            exec.on_commit(|| log.borrow_mut().push("first"));
            exec.on_commit(|| log.borrow_mut().push("second"));
            exec.on_discard(|| log.borrow_mut().push("undo"));
            assert!(log.borrow().is_empty());
            Ok(())
        })
        .unwrap();
    assert_eq!(*log.borrow(), vec!["first", "second"]);

    log.borrow_mut().clear();
    let result = w.authorizer.execute(|exec| -> Result<(), AuthError> {
        exec.on_commit(|| log.borrow_mut().push("applied"));
        exec.on_discard(|| log.borrow_mut().push("undo first"));
        exec.on_discard(|| log.borrow_mut().push("undo second"));
        exec.authenticate(account("stranger"), w.vault, set_fee(), &pack1(1u64))?;
        Ok(())
    });
    assert!(result.is_err());
    assert_eq!(*log.borrow(), vec!["undo second", "undo first"]);
}

proptest! {
    #[test]
    fn test_never_granted_is_never_authorized(
        who in any::<[u8; 20]>(),
        args in proptest::collection::vec(any::<[u8; 32]>(), 0..=5),
    ) {
        let w = world();
        let args: Vec<Word> = args.into_iter().map(Word::from_bytes).collect();
        let who = Account::from_bytes(who);
        prop_assume!(who != w.owner);

        prop_assert!(!w.authorizer.is_authorized(who, w.vault, set_fee(), &args).unwrap());
        prop_assert!(!w
            .authorizer
            .is_authorized(who, w.authorizer.account(), Operation::resolve(AUTHORIZE), &args)
            .unwrap());
    }
}
