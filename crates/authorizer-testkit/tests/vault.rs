//! The vault scenario end to end: guarded withdrawals and fee changes
//! driven through the shared gate.

use authorizer::{AuthError, ChangeSet, Condition, Decision, Operation, Word};
use authorizer_testkit::fixtures::{SET_FEE, WITHDRAW};
use authorizer_testkit::{TestFixture, VaultError};

#[test]
fn test_withdraw_is_restricted_to_granted_token() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let relayer = fixture.account("relayer");
    let (token_x, token_y) = (fixture.account("token-x"), fixture.account("token-y"));
    let recipient = fixture.account("recipient");

    vault.deposit(token_x, 1_000);
    vault.deposit(token_y, 1_000);
    fixture
        .grant(relayer, vault.account(), WITHDRAW, vec![Condition::eq(token_x)])
        .unwrap();

    vault.withdraw(relayer, token_x, 10, recipient).unwrap();
    let denied = vault.withdraw(relayer, token_y, 10, recipient).unwrap_err();

    assert!(matches!(
        denied,
        VaultError::Auth(AuthError::PermissionDenied {
            decision: Decision::ConditionFailed { position: 0 },
            ..
        })
    ));
    assert_eq!(vault.balance(token_x), 990);
    assert_eq!(vault.balance(token_y), 1_000);
    assert_eq!(vault.withdrawals().len(), 1);
}

#[test]
fn test_withdraw_caps_amount_and_recipient() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let relayer = fixture.account("relayer");
    let token = fixture.account("token-x");
    let treasury = fixture.account("treasury");

    vault.deposit(token, 1_000);
    fixture
        .grant(
            relayer,
            vault.account(),
            WITHDRAW,
            vec![Condition::eq(token), Condition::lte(100u64), Condition::eq(treasury)],
        )
        .unwrap();

    assert!(vault.withdraw(relayer, token, 100, treasury).is_ok());
    assert!(vault.withdraw(relayer, token, 101, treasury).is_err());
    assert!(vault.withdraw(relayer, token, 50, relayer).is_err());
    assert_eq!(vault.balance(token), 900);
}

#[test]
fn test_unconditional_grant_allows_any_arguments() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let operator = fixture.account("operator");

    fixture.grant(operator, vault.account(), SET_FEE, vec![]).unwrap();
    vault.set_fee(operator, 0).unwrap();
    vault.set_fee(operator, u64::MAX).unwrap();
    assert_eq!(vault.fee_pct(), u64::MAX);
}

#[test]
fn test_fee_bounds() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let operator = fixture.account("operator");

    fixture
        .grant(operator, vault.account(), SET_FEE, vec![Condition::lt(6u64)])
        .unwrap();

    vault.set_fee(operator, 0).unwrap();
    vault.set_fee(operator, 5).unwrap();
    assert!(vault.set_fee(operator, 6).is_err());
    assert_eq!(vault.fee_pct(), 5);

    // A new grant replaces the old bound entirely.
    fixture
        .grant(operator, vault.account(), SET_FEE, vec![Condition::gte(1u64)])
        .unwrap();
    assert!(vault.set_fee(operator, 0).is_err());
    vault.set_fee(operator, 50).unwrap();
}

#[test]
fn test_revoked_relayer_is_locked_out() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let relayers = authorizer_testkit::accounts("relayer", 3);
    let token = fixture.account("token-x");
    vault.deposit(token, 1_000);

    fixture
        .apply(&ChangeSet::on(vault.account()).grant(
            relayers.clone(),
            WITHDRAW,
            vec![Condition::eq(token)],
        ))
        .unwrap();
    fixture.revoke(relayers[1], vault.account(), WITHDRAW).unwrap();

    assert!(vault.withdraw(relayers[0], token, 1, relayers[0]).is_ok());
    assert!(vault.withdraw(relayers[1], token, 1, relayers[1]).is_err());
    assert!(vault.withdraw(relayers[2], token, 1, relayers[2]).is_ok());
}

#[test]
fn test_permissions_do_not_leak_between_vaults() {
    let fixture = TestFixture::new();
    let (vault_a, vault_b) = (fixture.vault("vault-a"), fixture.vault("vault-b"));
    let operator = fixture.account("operator");

    fixture.grant(operator, vault_a.account(), SET_FEE, vec![]).unwrap();
    assert!(vault_a.set_fee(operator, 3).is_ok());
    assert!(vault_b.set_fee(operator, 3).is_err());
}

#[test]
fn test_withdraw_inside_execution_sees_new_grant() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let relayer = fixture.account("relayer");
    let token = fixture.account("token-x");
    vault.deposit(token, 100);

    fixture
        .authorizer
        .execute(|exec| -> Result<(), VaultError> {
            let conditions = vec![Condition::eq(token)];
            exec.authorize(fixture.owner, relayer, vault.account(), WITHDRAW, conditions)?;
            vault.withdraw_in(exec, relayer, token, 10, relayer)?;
            Ok(())
        })
        .unwrap();

    assert_eq!(vault.balance(token), 90);
    assert!(vault.withdraw(relayer, token, 10, relayer).is_ok());
}

#[test]
fn test_failed_execution_rolls_back_grant() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let relayer = fixture.account("relayer");
    let token = fixture.account("token-x");

    // The vault is empty, so the withdrawal fails after authentication and
    // the grant made earlier in the execution is discarded.
    let result = fixture.authorizer.execute(|exec| -> Result<(), VaultError> {
        exec.authorize(fixture.owner, relayer, vault.account(), WITHDRAW, vec![])?;
        vault.withdraw_in(exec, relayer, token, 10, relayer)?;
        Ok(())
    });

    assert!(matches!(result, Err(VaultError::InsufficientBalance { .. })));
    assert!(fixture
        .authorizer
        .get_conditions(relayer, vault.account(), Operation::resolve(WITHDRAW))
        .unwrap()
        .is_empty());
    assert!(!fixture
        .authorizer
        .is_granted(relayer, vault.account(), Operation::resolve(WITHDRAW))
        .unwrap());
}

#[test]
fn test_failed_step_after_withdrawal_keeps_funds() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let relayer = fixture.account("relayer");
    let stranger = fixture.account("stranger");
    let token = fixture.account("token-x");
    vault.deposit(token, 100);

    let result = fixture.authorizer.execute(|exec| -> Result<(), VaultError> {
        exec.authorize(fixture.owner, relayer, vault.account(), WITHDRAW, vec![])?;
        vault.withdraw_in(exec, relayer, token, 10, relayer)?;
        exec.authenticate(stranger, vault.account(), Operation::resolve(SET_FEE), &[])?;
        Ok(())
    });

    assert!(matches!(
        result,
        Err(VaultError::Auth(AuthError::PermissionDenied { .. }))
    ));
    assert_eq!(vault.balance(token), 100);
    assert!(vault.withdrawals().is_empty());
    assert!(!fixture
        .authorizer
        .is_granted(relayer, vault.account(), Operation::resolve(WITHDRAW))
        .unwrap());

    // The reservation was released with the execution.
    fixture.grant(relayer, vault.account(), WITHDRAW, vec![]).unwrap();
    vault.withdraw(relayer, token, 100, relayer).unwrap();
    assert_eq!(vault.balance(token), 0);
}

#[test]
fn test_withdrawals_in_one_execution_share_the_balance() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let relayer = fixture.account("relayer");
    let token = fixture.account("token-x");
    vault.deposit(token, 100);
    fixture.grant(relayer, vault.account(), WITHDRAW, vec![]).unwrap();

    let result = fixture.authorizer.execute(|exec| -> Result<(), VaultError> {
        vault.withdraw_in(exec, relayer, token, 60, relayer)?;
        // Still fully funded until the execution commits.
        assert_eq!(vault.balance(token), 100);
        vault.withdraw_in(exec, relayer, token, 60, relayer)?;
        Ok(())
    });

    assert!(matches!(
        result,
        Err(VaultError::InsufficientBalance { available: 40, .. })
    ));
    assert_eq!(vault.balance(token), 100);

    fixture
        .authorizer
        .execute(|exec| -> Result<(), VaultError> {
            vault.withdraw_in(exec, relayer, token, 60, relayer)?;
            vault.withdraw_in(exec, relayer, token, 40, relayer)?;
            Ok(())
        })
        .unwrap();
    assert_eq!(vault.balance(token), 0);
    assert_eq!(vault.withdrawals().len(), 2);
}

#[test]
fn test_packed_amount_compares_as_unsigned() {
    let fixture = TestFixture::new();
    let vault = fixture.vault("vault");
    let relayer = fixture.account("relayer");
    let token = fixture.account("token-x");
    vault.deposit(token, u128::MAX);

    let cap = Word::from(u128::MAX / 2);
    fixture
        .grant(relayer, vault.account(), WITHDRAW, vec![Condition::eq(token), Condition::lte(cap)])
        .unwrap();

    assert!(vault.withdraw(relayer, token, u128::MAX / 2, relayer).is_ok());
    assert!(vault.withdraw(relayer, token, u128::MAX / 2 + 1, relayer).is_err());
}
