//! Claim Record Service tests.

use chrono::NaiveDate;
use ncgc_core::{
    application_workflow::{Application, ApprovalDecision, NewApplication, NewOwner},
    claim_workflow::{ClaimReview, ClaimStatus, NewClaim, PaymentStatus, ReviewAction},
    desk::test_epoch,
    notification::NotificationKind,
    Actor, DeskError, DeskResult, GuaranteeDesk, Role,
};

fn maker() -> Actor {
    Actor {
        email: "maker@accessbank.com".into(),
        role: Role::BankMaker,
        bank: Some("Access Bank".into()),
    }
}

fn analyst() -> Actor {
    Actor {
        email: "analyst@ncgc.gov.ng".into(),
        role: Role::NcgcAnalyst,
        bank: None,
    }
}

fn submit(desk: &GuaranteeDesk) -> DeskResult<Application> {
    desk.submit_application(
        &maker(),
        NewApplication {
            business_name: "Ibadan Textiles".into(),
            rc_number: "RC765432".into(),
            loan_amount: 1_000_000.0,
            tenure_months: 12,
            purpose: "Equipment".into(),
            owners: vec![NewOwner {
                name: "Tunde Ade".into(),
                ..Default::default()
            }],
            ..Default::default()
        },
    )
}

/// Loan of 1,000,000 approved at 60% → max claim 600,000.
fn approved_application(desk: &mut GuaranteeDesk) -> DeskResult<Application> {
    let app = submit(desk)?;
    desk.approve_application(
        &analyst(),
        &app.id,
        ApprovalDecision {
            guarantee_percentage: Some(60.0),
            comment: None,
        },
    )
}

fn claim_for(amount: f64) -> NewClaim {
    NewClaim {
        claim_amount: Some(amount),
        outstanding_principal: Some(550_000.0),
        outstanding_interest: Some(50_000.0),
        default_date: NaiveDate::from_ymd_opt(2025, 5, 1),
        default_reason: Some("Business closed after flooding".into()),
    }
}

#[test]
fn claim_on_pending_application_is_invalid() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let app = submit(&desk)?;
    let result = desk.submit_claim(&maker(), &app.id, claim_for(100_000.0));
    assert!(matches!(result, Err(DeskError::InvalidRequest(_))));
    assert!(desk.store.get_application(&app.id)?.expect("stored").claim.is_none());
    Ok(())
}

#[test]
fn claim_at_guarantee_cap_succeeds_one_over_fails() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let app = approved_application(&mut desk)?;

    let over = desk.submit_claim(&maker(), &app.id, claim_for(600_001.0));
    assert!(matches!(over, Err(DeskError::InvalidRequest(_))));

    let claim = desk.submit_claim(&maker(), &app.id, claim_for(600_000.0))?;
    assert_eq!(claim.status, ClaimStatus::PendingReview);
    assert_eq!(claim.bank_name, "Access Bank");
    assert!(claim.payment.is_none());

    let mirrored = desk.store.get_application(&app.id)?.expect("stored");
    let claim_ref = mirrored.claim.expect("back-reference");
    assert_eq!(claim_ref.id, claim.id);
    assert_eq!(claim_ref.status, ClaimStatus::PendingReview);
    Ok(())
}

#[test]
fn claim_requires_date_and_reason() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let app = approved_application(&mut desk)?;

    let mut no_date = claim_for(1000.0);
    no_date.default_date = None;
    assert!(desk.submit_claim(&maker(), &app.id, no_date).is_err());

    let mut no_reason = claim_for(1000.0);
    no_reason.default_reason = Some("  ".into());
    assert!(desk.submit_claim(&maker(), &app.id, no_reason).is_err());

    let mut future = claim_for(1000.0);
    future.default_date = Some(test_epoch().date_naive().succ_opt().expect("valid date"));
    assert!(desk.submit_claim(&maker(), &app.id, future).is_err());

    let mut negative = claim_for(1000.0);
    negative.outstanding_interest = Some(-1.0);
    assert!(desk.submit_claim(&maker(), &app.id, negative).is_err());
    Ok(())
}

#[test]
fn pending_claim_blocks_another() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let app = approved_application(&mut desk)?;
    desk.submit_claim(&maker(), &app.id, claim_for(100_000.0))?;
    assert!(matches!(
        desk.submit_claim(&maker(), &app.id, claim_for(100_000.0)),
        Err(DeskError::InvalidRequest(_))
    ));
    Ok(())
}

#[test]
fn approval_pays_the_claim_amount() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let app = approved_application(&mut desk)?;
    let claim = desk.submit_claim(&maker(), &app.id, claim_for(450_000.0))?;

    let reviewed = desk.review_claim(
        &analyst(),
        &claim.id,
        ClaimReview {
            action: ReviewAction::Approve,
            comments: None,
        },
    )?;
    assert_eq!(reviewed.status, ClaimStatus::Approved);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some("analyst@ncgc.gov.ng"));
    let payment = reviewed.payment.expect("payment on approval");
    assert_eq!(payment.amount, 450_000.0);
    assert_eq!(payment.status, PaymentStatus::Paid);

    let expected = format!(
        "PAY-{}-{}",
        test_epoch().timestamp_millis(),
        &claim.id[..8]
    );
    assert_eq!(payment.payment_reference, expected);

    let mirrored = desk.store.get_application(&app.id)?.expect("stored");
    let claim_ref = mirrored.claim.expect("back-reference");
    assert_eq!(claim_ref.status, ClaimStatus::Approved);
    assert_eq!(claim_ref.reviewed_at, Some(test_epoch()));

    let kinds: Vec<_> = desk
        .list_notifications(&maker())?
        .into_iter()
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&NotificationKind::ClaimApproved));
    Ok(())
}

#[test]
fn rejection_needs_comments_and_pays_nothing() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let app = approved_application(&mut desk)?;
    let claim = desk.submit_claim(&maker(), &app.id, claim_for(300_000.0))?;

    let bare = desk.review_claim(
        &analyst(),
        &claim.id,
        ClaimReview {
            action: ReviewAction::Reject,
            comments: Some("   ".into()),
        },
    );
    assert!(matches!(bare, Err(DeskError::InvalidRequest(_))));
    assert_eq!(desk.get_claim(&analyst(), &claim.id)?.status, ClaimStatus::PendingReview);

    let rejected = desk.review_claim(
        &analyst(),
        &claim.id,
        ClaimReview {
            action: ReviewAction::Reject,
            comments: Some("Default predates guarantee".into()),
        },
    )?;
    assert_eq!(rejected.status, ClaimStatus::Rejected);
    assert_eq!(rejected.review_comments.as_deref(), Some("Default predates guarantee"));
    assert!(rejected.payment.is_none());

    // A rejected claim does not block a fresh one.
    let refiled = desk.submit_claim(&maker(), &app.id, claim_for(250_000.0))?;
    assert_eq!(refiled.status, ClaimStatus::PendingReview);
    Ok(())
}

#[test]
fn reviewed_claims_stay_reviewed() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let app = approved_application(&mut desk)?;
    let claim = desk.submit_claim(&maker(), &app.id, claim_for(300_000.0))?;
    let approve = || ClaimReview {
        action: ReviewAction::Approve,
        comments: None,
    };
    desk.review_claim(&analyst(), &claim.id, approve())?;
    assert!(matches!(
        desk.review_claim(&analyst(), &claim.id, approve()),
        Err(DeskError::InvalidRequest(_))
    ));
    assert!(matches!(
        desk.review_claim(&maker(), &claim.id, approve()),
        Err(DeskError::Forbidden { .. })
    ));
    Ok(())
}

#[test]
fn decision_is_frozen_once_a_claim_exists() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let app = approved_application(&mut desk)?;
    desk.submit_claim(&maker(), &app.id, claim_for(100_000.0))?;
    assert!(matches!(
        desk.reject_application(&analyst(), &app.id, "Changed our mind"),
        Err(DeskError::InvalidRequest(_))
    ));
    Ok(())
}

#[test]
fn makers_only_see_their_banks_claims() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let app = approved_application(&mut desk)?;
    let claim = desk.submit_claim(&maker(), &app.id, claim_for(100_000.0))?;

    let zenith = Actor {
        email: "maker@zenithbank.com".into(),
        role: Role::BankMaker,
        bank: Some("Zenith Bank".into()),
    };
    assert!(desk.list_claims(&zenith)?.is_empty());
    assert!(matches!(
        desk.get_claim(&zenith, &claim.id),
        Err(DeskError::NotFound { .. })
    ));
    assert_eq!(desk.list_claims(&maker())?.len(), 1);
    Ok(())
}
