use prospects_core::db::open_shared_in_memory;
use prospects_core::{
    AuthorizationStatus, ContactFilter, CoreConfig, EmailPolicy, IdentityCodec, IdentityImage,
    InProcessNotificationCenter, PromptAnswer, ProspectsService, RemindError, RepoError,
    ReminderError, ScanOutcome, SelectionController, SortSpec, SqliteContactRepository,
    SqliteSettingsRepository,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

type Service = ProspectsService<SqliteContactRepository, SqliteSettingsRepository>;

fn open_service(config: &CoreConfig, status: AuthorizationStatus) -> Service {
    let (center, _fired) = InProcessNotificationCenter::new(status, PromptAnswer::Deny);
    ProspectsService::open(open_shared_in_memory().unwrap(), config, Arc::new(center)).unwrap()
}

fn scan_image(image: &IdentityImage) -> String {
    let bitmap = image.bitmap();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        bitmap.width() as usize,
        bitmap.height() as usize,
        |x, y| bitmap.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1);
    grids[0].decode().unwrap().1
}

fn all_contacts(service: &Service) -> usize {
    service
        .list(ContactFilter::All, &SortSpec::by_name())
        .unwrap()
        .len()
}

#[test]
fn successful_scan_inserts_an_uncontacted_contact() {
    let service = open_service(&CoreConfig::default(), AuthorizationStatus::Authorized);

    let contact = service
        .handle_scan(ScanOutcome::Success(
            "Constantin Lisnic\nconstantin@lisnic.dev".to_string(),
        ))
        .unwrap();

    assert_eq!(contact.name, "Constantin Lisnic");
    assert_eq!(contact.email, "constantin@lisnic.dev");
    assert!(!contact.is_contacted);
    assert_eq!(
        service
            .list(ContactFilter::UncontactedOnly, &SortSpec::by_date())
            .unwrap()
            .ids(),
        vec![contact.id]
    );
}

#[test]
fn malformed_or_failed_scans_never_touch_the_store() {
    let service = open_service(&CoreConfig::default(), AuthorizationStatus::Authorized);

    for payload in ["only a name", "a\nb\nc", "\nb@x.com", ""] {
        assert!(service
            .handle_scan(ScanOutcome::Success(payload.to_string()))
            .is_none());
    }
    assert!(service
        .handle_scan(ScanOutcome::Failure("camera unavailable".to_string()))
        .is_none());

    assert_eq!(all_contacts(&service), 0);
    assert_eq!(service.store().revision(), 0);
}

#[test]
fn strict_email_policy_rejects_scanned_non_addresses() {
    let config = CoreConfig {
        email_policy: EmailPolicy::BasicSyntax,
        ..CoreConfig::default()
    };
    let service = open_service(&config, AuthorizationStatus::Authorized);

    assert!(service
        .handle_scan(ScanOutcome::Success("Constantine\nLisnic".to_string()))
        .is_none());
    assert!(service
        .handle_scan(ScanOutcome::Success("Alice\na@x.com".to_string()))
        .is_some());
    assert_eq!(all_contacts(&service), 1);
}

#[test]
fn my_code_uses_defaults_and_refreshes_on_profile_change() {
    let config = CoreConfig {
        qr_scale: 4,
        ..CoreConfig::default()
    };
    let service = open_service(&config, AuthorizationStatus::Authorized);

    let profile = service.my_profile().unwrap();
    assert_eq!(profile.name, "Anonymous");
    assert_eq!(profile.email, "you@yoursite.com");
    assert_eq!(
        scan_image(&service.my_code().unwrap()),
        "Anonymous\nyou@yoursite.com"
    );

    let refreshed = service.set_my_name("Constantin Lisnic").unwrap();
    assert_eq!(scan_image(&refreshed), "Constantin Lisnic\nyou@yoursite.com");
    let refreshed = service.set_my_email("constantin@lisnic.dev").unwrap();
    assert_eq!(
        scan_image(&refreshed),
        "Constantin Lisnic\nconstantin@lisnic.dev"
    );

    // Profile values never become contacts.
    assert_eq!(all_contacts(&service), 0);
}

#[test]
fn my_code_scanned_by_another_user_creates_their_contact() {
    let config = CoreConfig {
        qr_scale: 4,
        ..CoreConfig::default()
    };
    let sharer = open_service(&config, AuthorizationStatus::Authorized);
    let scanner = open_service(&config, AuthorizationStatus::Authorized);

    let code = sharer.set_my_email("dora@x.com").unwrap();
    let payload = scan_image(&code);
    let contact = scanner.handle_scan(ScanOutcome::Success(payload)).unwrap();

    assert_eq!(contact.name, "Anonymous");
    assert_eq!(contact.email, "dora@x.com");
    assert_eq!(
        scanner.codec().decode(&IdentityCodec::payload("Anonymous", "dora@x.com")),
        Ok(prospects_core::IdentityPayload {
            name: contact.name.clone(),
            email: contact.email.clone(),
        })
    );
}

#[test]
fn selection_and_edit_route_through_the_facade() {
    let service = open_service(&CoreConfig::default(), AuthorizationStatus::Authorized);
    let alice = service
        .handle_scan(ScanOutcome::Success("Alice\na@x.com".to_string()))
        .unwrap();
    let bob = service
        .handle_scan(ScanOutcome::Success("Bob\nb@x.com".to_string()))
        .unwrap();

    let mut selection = SelectionController::new();
    selection.select(bob.id);
    let mut session = service.begin_edit(&mut selection, alice.id).unwrap();
    assert!(selection.is_empty());
    session.set_email("alice@x.com");
    let saved = service.commit_edit(session).unwrap();
    assert_eq!(saved.email, "alice@x.com");

    selection.select(alice.id);
    assert_eq!(service.delete_selected(&mut selection).unwrap(), 1);
    assert!(service.toggle_contacted(bob.id).unwrap().is_contacted);
    assert!(service.delete(bob.id).unwrap());
    assert_eq!(all_contacts(&service), 0);
}

#[tokio::test(start_paused = true)]
async fn remind_reports_missing_contacts_and_denials_without_touching_store() {
    let service = open_service(&CoreConfig::default(), AuthorizationStatus::Denied);
    let alice = service
        .handle_scan(ScanOutcome::Success("Alice\na@x.com".to_string()))
        .unwrap();

    let missing = Uuid::new_v4();
    let err = service.remind(missing, None).await.unwrap_err();
    assert!(matches!(err, RemindError::Store(RepoError::NotFound(id)) if id == missing));

    let revision = service.store().revision();
    let err = service
        .remind(alice.id, Some(Duration::from_secs(1)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RemindError::Reminder(ReminderError::AuthorizationDenied)
    ));
    assert_eq!(service.store().revision(), revision);
    assert!(service.store().get(alice.id).unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn remind_uses_configured_default_delay() {
    let config = CoreConfig {
        reminder_delay_secs: 30,
        ..CoreConfig::default()
    };
    let (center, mut fired) =
        InProcessNotificationCenter::new(AuthorizationStatus::Authorized, PromptAnswer::Deny);
    let service =
        ProspectsService::open(open_shared_in_memory().unwrap(), &config, Arc::new(center))
            .unwrap();
    let alice = service
        .handle_scan(ScanOutcome::Success("Alice\na@x.com".to_string()))
        .unwrap();

    let scheduled = service.remind(alice.id, None).await.unwrap();
    assert_eq!(scheduled.request.fire_after, Duration::from_secs(30));

    let handle = service
        .remind_in_background(alice.id, Some(Duration::from_secs(1)))
        .unwrap();
    let background = handle.await.unwrap().unwrap();

    assert_eq!(fired.recv().await.unwrap(), background.request);
    assert_eq!(fired.recv().await.unwrap(), scheduled.request);
}
