//! Recovery Record Service tests.

use chrono::NaiveDate;
use ncgc_core::{
    application_workflow::{Application, ApprovalDecision, NewApplication, NewOwner},
    claim_workflow::{Claim, ClaimReview, NewClaim, ReviewAction},
    recovery_workflow::{NewRecovery, RecoveryStatus, RecoveryUpdate},
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

/// An approved application carrying a claim; paid when `approve_claim`.
fn claimed_application(
    desk: &mut GuaranteeDesk,
    approve_claim: bool,
) -> DeskResult<(Application, Claim)> {
    let app = desk.submit_application(
        &maker(),
        NewApplication {
            business_name: "Enugu Foods".into(),
            rc_number: "RC555123".into(),
            loan_amount: 2_000_000.0,
            tenure_months: 24,
            purpose: "Cold storage".into(),
            owners: vec![NewOwner {
                name: "Chidi Okafor".into(),
                ..Default::default()
            }],
            ..Default::default()
        },
    )?;
    desk.approve_application(
        &analyst(),
        &app.id,
        ApprovalDecision {
            guarantee_percentage: Some(50.0),
            comment: None,
        },
    )?;
    let claim = desk.submit_claim(
        &maker(),
        &app.id,
        NewClaim {
            claim_amount: Some(800_000.0),
            default_date: NaiveDate::from_ymd_opt(2025, 4, 30),
            default_reason: Some("Three missed instalments".into()),
            ..Default::default()
        },
    )?;
    let claim = if approve_claim {
        desk.review_claim(
            &analyst(),
            &claim.id,
            ClaimReview {
                action: ReviewAction::Approve,
                comments: None,
            },
        )?
    } else {
        claim
    };
    let app = desk.store.get_application(&app.id)?.expect("stored");
    Ok((app, claim))
}

fn open_recovery(app_id: &str) -> NewRecovery {
    NewRecovery {
        application_id: app_id.to_string(),
        notes: Some("Demand letter sent".into()),
        recovery_amount: None,
    }
}

#[test]
fn recovery_needs_a_paid_claim() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let (app, _) = claimed_application(&mut desk, false)?;
    assert!(matches!(
        desk.initiate_recovery(&maker(), open_recovery(&app.id)),
        Err(DeskError::InvalidRequest(_))
    ));
    assert!(desk.eligible_for_recovery(&analyst())?.is_empty());
    Ok(())
}

#[test]
fn second_recovery_is_refused() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let (app, claim) = claimed_application(&mut desk, true)?;

    let eligible = desk.eligible_for_recovery(&maker())?;
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].id, app.id);

    let recovery = desk.initiate_recovery(&maker(), open_recovery(&app.id))?;
    assert_eq!(recovery.status, RecoveryStatus::Initiated);
    assert_eq!(recovery.claim_amount, claim.claim_amount);
    assert_eq!(recovery.claim_id, claim.id);
    assert_eq!(recovery.milestones.len(), 1);
    assert_eq!(recovery.milestones[0].title, "Recovery initiated");

    assert!(matches!(
        desk.initiate_recovery(&analyst(), open_recovery(&app.id)),
        Err(DeskError::InvalidRequest(_))
    ));
    assert!(desk.eligible_for_recovery(&maker())?.is_empty());
    assert_eq!(desk.list_recoveries(&maker())?.len(), 1);

    let mirrored = desk.store.get_application(&app.id)?.expect("stored");
    assert_eq!(mirrored.recovery.map(|r| r.id), Some(recovery.id));
    Ok(())
}

#[test]
fn status_walks_forward_and_stops_at_terminal() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let (app, _) = claimed_application(&mut desk, true)?;
    let recovery = desk.initiate_recovery(&maker(), open_recovery(&app.id))?;

    let skip = desk.update_recovery_status(
        &analyst(),
        &recovery.id,
        RecoveryUpdate {
            status: RecoveryStatus::Completed,
            notes: None,
            recovery_amount: None,
        },
    );
    assert!(matches!(skip, Err(DeskError::InvalidRequest(_))));

    let moving = desk.update_recovery_status(
        &analyst(),
        &recovery.id,
        RecoveryUpdate {
            status: RecoveryStatus::InProgress,
            notes: Some("Collateral auction scheduled".into()),
            recovery_amount: Some(200_000.0),
        },
    )?;
    assert_eq!(moving.status, RecoveryStatus::InProgress);
    assert_eq!(moving.recovery_amount, 200_000.0);
    assert_eq!(moving.milestones.len(), 2);
    assert_eq!(moving.milestones[1].title, "Status: in_progress");

    let too_much = desk.update_recovery_status(
        &analyst(),
        &recovery.id,
        RecoveryUpdate {
            status: RecoveryStatus::InProgress,
            notes: None,
            recovery_amount: Some(800_001.0),
        },
    );
    assert!(matches!(too_much, Err(DeskError::InvalidRequest(_))));

    let done = desk.update_recovery_status(
        &analyst(),
        &recovery.id,
        RecoveryUpdate {
            status: RecoveryStatus::Completed,
            notes: Some("Recovered in full".into()),
            recovery_amount: Some(800_000.0),
        },
    )?;
    assert_eq!(done.status, RecoveryStatus::Completed);

    let after = desk.update_recovery_status(
        &analyst(),
        &recovery.id,
        RecoveryUpdate {
            status: RecoveryStatus::Closed,
            notes: Some("Closing".into()),
            recovery_amount: None,
        },
    );
    assert!(matches!(after, Err(DeskError::InvalidRequest(_))));

    let mirrored = desk.store.get_application(&app.id)?.expect("stored");
    assert_eq!(
        mirrored.recovery.map(|r| r.status),
        Some(RecoveryStatus::Completed)
    );
    Ok(())
}

#[test]
fn initiated_accepts_note_only_updates() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let (app, _) = claimed_application(&mut desk, true)?;
    let recovery = desk.initiate_recovery(&maker(), open_recovery(&app.id))?;

    let noted = desk.update_recovery_status(
        &maker(),
        &recovery.id,
        RecoveryUpdate {
            status: RecoveryStatus::Initiated,
            notes: Some("Borrower contacted".into()),
            recovery_amount: None,
        },
    )?;
    assert_eq!(noted.status, RecoveryStatus::Initiated);
    assert_eq!(noted.milestones.len(), 2);

    let empty = desk.update_recovery_status(
        &maker(),
        &recovery.id,
        RecoveryUpdate {
            status: RecoveryStatus::Initiated,
            notes: None,
            recovery_amount: Some(10.0),
        },
    );
    assert!(matches!(empty, Err(DeskError::InvalidRequest(_))));

    let with_amount = desk.update_recovery_status(
        &maker(),
        &recovery.id,
        RecoveryUpdate {
            status: RecoveryStatus::Initiated,
            notes: Some("Borrower promised part payment".into()),
            recovery_amount: Some(10.0),
        },
    );
    assert!(matches!(with_amount, Err(DeskError::InvalidRequest(_))));
    let unchanged = desk.get_recovery(&maker(), &recovery.id)?;
    assert_eq!(unchanged.recovery_amount, recovery.recovery_amount);
    assert_eq!(unchanged.milestones.len(), 2);
    Ok(())
}
