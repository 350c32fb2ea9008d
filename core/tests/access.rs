//! Sessions, PFI onboarding, notifications and demo reset.

use chrono::Duration;
use ncgc_core::{
    application_workflow::{ApprovalDecision, NewApplication, NewOwner},
    bank_onboarding::{BankStatus, NewBank},
    compliance::{CheckKind, CheckResult, CheckStatus, ComplianceCheck},
    demo::hash_seed_passwords,
    notification::{Notification, NotificationSink},
    session::{check_password, HashedPassword},
    store::DeskStore,
    Actor, DeskError, DeskResult, GuaranteeDesk, Role,
};

fn admin(desk: &GuaranteeDesk) -> DeskResult<Actor> {
    let grant = desk.login("admin@ncgc.gov.ng", "admin123")?;
    desk.authenticate(&grant.token)
}

fn new_bank(name: &str, email: &str) -> NewBank {
    NewBank {
        name: name.into(),
        cbn_license: "CBN/2024/001".into(),
        rc_number: "RC998877".into(),
        ndic_number: "NDIC-4455".into(),
        tin: None,
        address: Some("Marina, Lagos".into()),
        contact_email: email.into(),
        password: "opensesame".into(),
    }
}

#[test]
fn login_yields_session_bound_actor() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let grant = desk.login("MAKER@accessbank.com", "maker123")?;
    assert_eq!(grant.token.len(), 64);
    assert_eq!(grant.user.role, Role::BankMaker);

    let actor = desk.authenticate(&grant.token)?;
    assert_eq!(actor.email, "maker@accessbank.com");
    assert_eq!(actor.bank.as_deref(), Some("Access Bank"));

    desk.logout(&grant.token)?;
    assert!(matches!(desk.authenticate(&grant.token), Err(DeskError::Unauthorized)));
    Ok(())
}

#[test]
fn bad_credentials_are_unauthorized() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    assert!(matches!(
        desk.login("maker@accessbank.com", "wrong"),
        Err(DeskError::Unauthorized)
    ));
    assert!(matches!(
        desk.login("nobody@example.com", "maker123"),
        Err(DeskError::Unauthorized)
    ));
    assert!(matches!(desk.authenticate("deadbeef"), Err(DeskError::Unauthorized)));
    Ok(())
}

#[test]
fn sessions_expire() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    let grant = desk.login("analyst@ncgc.gov.ng", "analyst123")?;
    let ttl = desk.config().session_ttl_hours;
    desk.clock.advance(Duration::hours(ttl));
    assert!(matches!(desk.authenticate(&grant.token), Err(DeskError::Unauthorized)));
    Ok(())
}

#[test]
fn login_purges_expired_sessions() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    desk.login("analyst@ncgc.gov.ng", "analyst123")?;
    desk.login("maker@accessbank.com", "maker123")?;
    assert_eq!(desk.store.session_count()?, 2);

    let ttl = desk.config().session_ttl_hours;
    desk.clock.advance(Duration::hours(ttl) + Duration::minutes(1));
    let fresh = desk.login("analyst@ncgc.gov.ng", "analyst123")?;
    assert_eq!(desk.store.session_count()?, 1);
    desk.authenticate(&fresh.token)?;
    Ok(())
}

#[test]
fn login_steps_compose_and_fail_closed_on_reset() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let admin = admin(&desk)?;

    let user = desk.login_candidate("maker@zenithbank.com", "maker123")?;
    check_password(&user, "maker123")?;
    assert!(matches!(
        check_password(&user, "maker999"),
        Err(DeskError::Unauthorized)
    ));

    // A reset between verify and open re-hashes every seed user.
    desk.reset_demo(&admin)?;
    assert!(matches!(desk.open_session(&user), Err(DeskError::Unauthorized)));

    let user = desk.login_candidate("maker@zenithbank.com", "maker123")?;
    check_password(&user, "maker123")?;
    let grant = desk.open_session(&user)?;
    assert_eq!(desk.authenticate(&grant.token)?.email, "maker@zenithbank.com");
    Ok(())
}

#[test]
fn prehashed_onboarding_and_reset() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let admin = admin(&desk)?;

    let password = HashedPassword::new(&desk.config().password_hashing, "opensesame")?;
    desk.onboard_bank_hashed(&admin, new_bank("Union Bank", "maker@unionbank.com"), password)?;
    desk.login("maker@unionbank.com", "opensesame")?;

    assert!(matches!(
        desk.reset_demo_hashed(&admin, Vec::new()),
        Err(DeskError::InvalidRequest(_))
    ));
    let passwords = hash_seed_passwords(desk.config())?;
    desk.reset_demo_hashed(&admin, passwords)?;
    assert!(desk.store.user_by_email("maker@unionbank.com")?.is_none());
    desk.login("maker@accessbank.com", "maker123")?;
    Ok(())
}

struct RegistryOffline;

impl ComplianceCheck for RegistryOffline {
    fn kind(&self) -> CheckKind {
        CheckKind::Ndic
    }

    fn check(&self, _input: &str) -> DeskResult<CheckResult> {
        Ok(CheckResult {
            kind: CheckKind::Ndic,
            status: CheckStatus::NeedsReview,
            message: "NDIC registry offline".into(),
            detail: None,
        })
    }
}

#[test]
fn swapped_registry_check_drives_onboarding() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    desk.compliance_mut().register(Box::new(RegistryOffline));
    let admin = admin(&desk)?;
    let bank = desk.onboard_bank(&admin, new_bank("Keystone Bank", "maker@keystone.com"))?;
    assert_eq!(bank.status, BankStatus::PendingReview);
    Ok(())
}

#[test]
fn onboarding_creates_bank_and_maker_login() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let admin = admin(&desk)?;

    let bank = desk.onboard_bank(&admin, new_bank("Fidelity Bank", "maker@fidelity.com"))?;
    assert_eq!(bank.status, BankStatus::Verified);
    assert_eq!(bank.checks.len(), 3);

    let grant = desk.login("maker@fidelity.com", "opensesame")?;
    assert_eq!(grant.user.role, Role::BankMaker);
    assert_eq!(grant.user.bank.as_deref(), Some("Fidelity Bank"));

    assert!(matches!(
        desk.onboard_bank(&admin, new_bank("fidelity bank", "other@fidelity.com")),
        Err(DeskError::InvalidRequest(_))
    ));
    assert!(matches!(
        desk.onboard_bank(&admin, new_bank("Wema Bank", "maker@fidelity.com")),
        Err(DeskError::InvalidRequest(_))
    ));
    assert_eq!(desk.list_banks()?.len(), 1);
    Ok(())
}

#[test]
fn unverifiable_bank_is_pending_review() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let admin = admin(&desk)?;
    let mut new = new_bank("Polaris Bank", "maker@polaris.com");
    new.ndic_number = "4455".into();
    let bank = desk.onboard_bank(&admin, new)?;
    assert_eq!(bank.status, BankStatus::PendingReview);

    let maker = desk.authenticate(&desk.login("maker@polaris.com", "opensesame")?.token)?;
    assert!(matches!(
        desk.onboard_bank(&maker, new_bank("Other", "x@other.com")),
        Err(DeskError::Forbidden { .. })
    ));
    Ok(())
}

struct FailingSink;

impl NotificationSink for FailingSink {
    fn deliver(&self, _store: &DeskStore, _n: &Notification) -> DeskResult<()> {
        Err(DeskError::invalid("mail relay unavailable"))
    }
}

#[test]
fn failed_notification_does_not_fail_approval() -> DeskResult<()> {
    let mut desk = GuaranteeDesk::build_test(42)?;
    desk.set_notification_sink(Box::new(FailingSink));
    let maker = desk.authenticate(&desk.login("maker@accessbank.com", "maker123")?.token)?;
    let analyst = desk.authenticate(&desk.login("analyst@ncgc.gov.ng", "analyst123")?.token)?;

    let app = desk.submit_application(
        &maker,
        NewApplication {
            business_name: "Jos Dairy".into(),
            rc_number: "RC10101".into(),
            loan_amount: 400_000.0,
            tenure_months: 6,
            purpose: "Feed stock".into(),
            owners: vec![NewOwner {
                name: "Grace Dung".into(),
                ..Default::default()
            }],
            ..Default::default()
        },
    )?;
    let approved = desk.approve_application(&analyst, &app.id, ApprovalDecision::default())?;
    assert!(approved.ncgc.approved);
    assert!(desk.list_notifications(&maker)?.is_empty());
    Ok(())
}

#[test]
fn reading_a_notification_from_another_bank_is_not_found() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let access = desk.authenticate(&desk.login("maker@accessbank.com", "maker123")?.token)?;
    let zenith = desk.authenticate(&desk.login("maker@zenithbank.com", "maker123")?.token)?;
    let analyst = desk.authenticate(&desk.login("analyst@ncgc.gov.ng", "analyst123")?.token)?;

    let app = desk.submit_application(
        &access,
        NewApplication {
            business_name: "Lagos Print".into(),
            rc_number: "RC20202".into(),
            loan_amount: 250_000.0,
            tenure_months: 6,
            purpose: "Press".into(),
            owners: vec![NewOwner {
                name: "Bisi Lawal".into(),
                ..Default::default()
            }],
            ..Default::default()
        },
    )?;
    desk.reject_application(&analyst, &app.id, "Incomplete documents")?;
    let note = desk.list_notifications(&access)?.remove(0);
    assert!(!note.read);

    assert!(matches!(
        desk.mark_notification_read(&zenith, &note.id),
        Err(DeskError::NotFound { .. })
    ));
    desk.mark_notification_read(&access, &note.id)?;
    assert!(desk.list_notifications(&access)?[0].read);
    Ok(())
}

#[test]
fn seeding_is_idempotent_and_hides_passwords() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let first = desk.seed_users()?;
    let second = desk.seed_users()?;
    assert_eq!(first, second);
    assert_eq!(desk.store.list_users()?.len(), first.len());
    let json = serde_json::to_string(&first)?;
    assert!(!json.contains("password"));
    assert!(!json.contains("admin123"));
    Ok(())
}

#[test]
fn reset_clears_everything_and_reseeds() -> DeskResult<()> {
    let desk = GuaranteeDesk::build_test(42)?;
    let admin_grant = desk.login("admin@ncgc.gov.ng", "admin123")?;
    let admin = desk.authenticate(&admin_grant.token)?;
    let maker = desk.authenticate(&desk.login("maker@accessbank.com", "maker123")?.token)?;
    desk.onboard_bank(&admin, new_bank("Fidelity Bank", "maker@fidelity.com"))?;
    desk.submit_application(
        &maker,
        NewApplication {
            business_name: "Abuja Tiles".into(),
            rc_number: "RC30303".into(),
            loan_amount: 900_000.0,
            tenure_months: 12,
            purpose: "Kiln".into(),
            owners: vec![NewOwner {
                name: "Musa Idris".into(),
                ..Default::default()
            }],
            ..Default::default()
        },
    )?;

    assert!(matches!(desk.reset_demo(&maker), Err(DeskError::Forbidden { .. })));
    let users = desk.reset_demo(&admin)?;
    assert_eq!(users.len(), desk.config().seed_users.len());
    assert_eq!(desk.store.application_count()?, 0);
    assert!(desk.list_banks()?.is_empty());
    assert!(desk.store.user_by_email("maker@fidelity.com")?.is_none());
    // Sessions went with the reset.
    assert!(matches!(
        desk.authenticate(&admin_grant.token),
        Err(DeskError::Unauthorized)
    ));
    assert!(desk.login("admin@ncgc.gov.ng", "admin123").is_ok());
    Ok(())
}
