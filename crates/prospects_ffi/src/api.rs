//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate core errors into simple response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Contact ids cross the boundary as hyphenated UUID strings.
//! - Reminder requests never block the calling thread.
//! - One service (and so one store revision) serves the whole process.
//! - Entering the editor clears the process-wide selection.

use log::warn;
use prospects_core::db::open_shared;
use prospects_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AuthorizationStatus, Contact, ContactFilter, ContactId, CoreConfig, IdentityImage,
    InProcessNotificationCenter, PromptAnswer, ProspectsService, ReminderRequest, ScanOutcome,
    SelectionController, SortSpec, SqliteContactRepository, SqliteSettingsRepository,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

const ENTRY_DB_FILE_NAME: &str = "prospects_entry.sqlite3";
static ENTRY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static ENTRY_CONFIG: OnceLock<CoreConfig> = OnceLock::new();
static ENTRY_RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();
static ENTRY_REMINDERS: OnceLock<EntryReminders> = OnceLock::new();
static ENTRY_SERVICE: Mutex<Option<Arc<EntryService>>> = Mutex::new(None);
static ENTRY_SELECTION: OnceLock<Mutex<SelectionController>> = OnceLock::new();

type EntryService = ProspectsService<SqliteContactRepository, SqliteSettingsRepository>;

struct EntryReminders {
    center: Arc<InProcessNotificationCenter>,
    fired: Mutex<UnboundedReceiver<ReminderRequest>>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Contact row as rendered by list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryContactItem {
    pub contact_id: String,
    pub name: String,
    pub email: String,
    pub is_contacted: bool,
    pub created_at_epoch_ms: i64,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryListResponse {
    pub items: Vec<EntryContactItem>,
    /// Screen title for the applied filter.
    pub title: String,
    /// Store revision the items were read at.
    pub revision: u64,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    pub ok: bool,
    /// Affected contact, when one exists after the action.
    pub contact: Option<EntryContactItem>,
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, contact: Option<EntryContactItem>) -> Self {
        Self {
            ok: true,
            contact,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            contact: None,
            message: message.into(),
        }
    }
}

/// Identity code response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCodeResponse {
    pub ok: bool,
    /// PNG bytes; empty on failure.
    pub png: Vec<u8>,
    /// `true` when the code could not be rendered and the error image is shown.
    pub placeholder: bool,
    pub message: String,
}

impl EntryCodeResponse {
    fn from_image(image: IdentityImage) -> Self {
        match image.to_png() {
            Ok(png) => Self {
                ok: true,
                png,
                placeholder: image.is_placeholder(),
                message: String::new(),
            },
            Err(err) => Self::failure(err.to_string()),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            png: Vec::new(),
            placeholder: false,
            message: message.into(),
        }
    }
}

/// Reminder that has fired and is waiting to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReminderItem {
    pub reminder_id: String,
    pub contact_id: String,
    pub title: String,
    pub subtitle: String,
}

/// Listing selection envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySelectionResponse {
    pub ok: bool,
    /// Whether the call changed the selection.
    pub changed: bool,
    /// Selected ids in stable order.
    pub selected_ids: Vec<String>,
    pub message: String,
}

impl EntrySelectionResponse {
    fn current(changed: bool) -> Self {
        let selected_ids = with_selection(|selection| {
            selection
                .ids()
                .into_iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
        });
        Self {
            ok: true,
            changed,
            message: format!("{} selected.", selected_ids.len()),
            selected_ids,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            selected_ids: Vec::new(),
            message: message.into(),
        }
    }
}

/// Inserts a contact from a scanned payload.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Malformed payloads return `ok=false` and leave the store unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_scan(payload: String) -> EntryActionResponse {
    let service = match entry_service() {
        Ok(service) => service,
        Err(err) => return EntryActionResponse::failure(format!("entry_scan failed: {err}")),
    };
    match service.handle_scan(ScanOutcome::Success(payload)) {
        Some(contact) => EntryActionResponse::success("Contact added.", Some(to_item(contact))),
        None => EntryActionResponse::failure("Scan discarded."),
    }
}

/// Lists contacts for one filter and sort preset.
///
/// Input semantics:
/// - `filter`: `all|contacted|uncontacted`.
/// - `sort`: `name|date`.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list(filter: String, sort: String) -> EntryListResponse {
    let listed = parse_filter(&filter).and_then(|filter| {
        let sort = parse_sort(&sort)?;
        let service = entry_service()?;
        let snapshot = service
            .list(filter, &sort)
            .map_err(|err| err.to_string())?;
        Ok((filter, snapshot))
    });

    match listed {
        Ok((filter, snapshot)) => {
            let revision = snapshot.revision();
            let items = snapshot
                .into_contacts()
                .into_iter()
                .map(to_item)
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No contacts.".to_string()
            } else {
                format!("Found {} contact(s).", items.len())
            };
            EntryListResponse {
                items,
                title: filter.title().to_string(),
                revision,
                message,
            }
        }
        Err(err) => EntryListResponse {
            items: Vec::new(),
            title: String::new(),
            revision: 0,
            message: format!("entry_list failed: {err}"),
        },
    }
}

/// Flips the contacted flag.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_toggle(contact_id: String) -> EntryActionResponse {
    let outcome = parse_contact_id(&contact_id).and_then(|id| {
        entry_service()?
            .toggle_contacted(id)
            .map_err(|err| err.to_string())
    });
    match outcome {
        Ok(contact) => EntryActionResponse::success("Contact updated.", Some(to_item(contact))),
        Err(err) => EntryActionResponse::failure(format!("entry_toggle failed: {err}")),
    }
}

/// Enters the editor for one contact and returns its current values.
///
/// # FFI contract
/// - Clears the selection once the contact is found.
/// - Unknown ids return `ok=false` and leave the selection untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_begin_edit(contact_id: String) -> EntryActionResponse {
    let outcome = parse_contact_id(&contact_id).and_then(|id| {
        let service = entry_service()?;
        with_selection(|selection| service.begin_edit(selection, id))
            .map(|session| session.original().clone())
            .map_err(|err| err.to_string())
    });
    match outcome {
        Ok(contact) => EntryActionResponse::success("Editing contact.", Some(to_item(contact))),
        Err(err) => EntryActionResponse::failure(format!("entry_begin_edit failed: {err}")),
    }
}

/// Replaces a contact's name and email through an edit session.
///
/// Like `entry_begin_edit`, this clears the selection.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_edit(contact_id: String, name: String, email: String) -> EntryActionResponse {
    let outcome = parse_contact_id(&contact_id).and_then(|id| {
        let service = entry_service()?;
        let mut session = with_selection(|selection| service.begin_edit(selection, id))
            .map_err(|err| err.to_string())?;
        session.set_name(name);
        session.set_email(email);
        service.commit_edit(session).map_err(|err| err.to_string())
    });
    match outcome {
        Ok(contact) => EntryActionResponse::success("Contact saved.", Some(to_item(contact))),
        Err(err) => EntryActionResponse::failure(format!("entry_edit failed: {err}")),
    }
}

/// Deletes a contact. Unknown ids succeed as a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete(contact_id: String) -> EntryActionResponse {
    let outcome = parse_contact_id(&contact_id).and_then(|id| {
        entry_service()?
            .delete(id)
            .map_err(|err| err.to_string())
    });
    match outcome {
        Ok(true) => EntryActionResponse::success("Contact deleted.", None),
        Ok(false) => EntryActionResponse::success("Contact already gone.", None),
        Err(err) => EntryActionResponse::failure(format!("entry_delete failed: {err}")),
    }
}

/// Adds a contact to the listing selection.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_select(contact_id: String) -> EntrySelectionResponse {
    match parse_contact_id(&contact_id) {
        Ok(id) => EntrySelectionResponse::current(with_selection(|selection| selection.select(id))),
        Err(err) => EntrySelectionResponse::failure(format!("entry_select failed: {err}")),
    }
}

/// Removes a contact from the listing selection.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_deselect(contact_id: String) -> EntrySelectionResponse {
    match parse_contact_id(&contact_id) {
        Ok(id) => {
            EntrySelectionResponse::current(with_selection(|selection| selection.deselect(id)))
        }
        Err(err) => EntrySelectionResponse::failure(format!("entry_deselect failed: {err}")),
    }
}

/// Deletes every selected contact, then clears the selection.
///
/// Ids already deleted elsewhere are skipped. On failure the failed ids stay
/// selected for a retry.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_delete_selected() -> EntryActionResponse {
    let outcome = entry_service().and_then(|service| {
        with_selection(|selection| service.delete_selected(selection))
            .map_err(|err| err.to_string())
    });
    match outcome {
        Ok(removed) => EntryActionResponse::success(format!("Deleted {removed} contact(s)."), None),
        Err(err) => EntryActionResponse::failure(format!("entry_delete_selected failed: {err}")),
    }
}

/// Requests a follow-up reminder for a contact.
///
/// # FFI contract
/// - Returns as soon as the request is queued; authorization and scheduling
///   run on the core runtime.
/// - `delay_secs=None` uses the configured default delay.
/// - Authorization failures are logged and never surface as a panic.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_remind(contact_id: String, delay_secs: Option<u64>) -> EntryActionResponse {
    let outcome = parse_contact_id(&contact_id).and_then(|id| {
        let runtime = entry_runtime()?;
        let service = entry_service()?;
        let _guard = runtime.enter();
        service
            .remind_in_background(id, delay_secs.map(Duration::from_secs))
            .map_err(|err| err.to_string())
    });
    match outcome {
        Ok(_handle) => EntryActionResponse::success("Reminder requested.", None),
        Err(err) => EntryActionResponse::failure(format!("entry_remind failed: {err}")),
    }
}

/// Drains reminders that have fired since the last call.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_take_fired_reminders() -> Vec<EntryReminderItem> {
    let reminders = entry_reminders();
    let mut fired = match reminders.fired.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    let mut items = Vec::new();
    while let Ok(request) = fired.try_recv() {
        items.push(EntryReminderItem {
            reminder_id: request.id.to_string(),
            contact_id: request.contact_id.to_string(),
            title: request.content.title,
            subtitle: request.content.subtitle,
        });
    }
    items
}

/// Renders the user's identity code as PNG.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_my_code_png() -> EntryCodeResponse {
    match entry_service().and_then(|service| service.my_code().map_err(|err| err.to_string()))
    {
        Ok(image) => EntryCodeResponse::from_image(image),
        Err(err) => EntryCodeResponse::failure(format!("entry_my_code_png failed: {err}")),
    }
}

/// Updates the user's profile and returns the refreshed code.
///
/// `None` leaves a field unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_set_profile(name: Option<String>, email: Option<String>) -> EntryCodeResponse {
    let refreshed = entry_service().and_then(|service| {
        if let Some(name) = name.as_deref() {
            service.set_my_name(name).map_err(|err| err.to_string())?;
        }
        if let Some(email) = email.as_deref() {
            service.set_my_email(email).map_err(|err| err.to_string())?;
        }
        service.my_code().map_err(|err| err.to_string())
    });
    match refreshed {
        Ok(image) => EntryCodeResponse::from_image(image),
        Err(err) => EntryCodeResponse::failure(format!("entry_set_profile failed: {err}")),
    }
}

fn parse_filter(raw: &str) -> Result<ContactFilter, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "all" => Ok(ContactFilter::All),
        "contacted" => Ok(ContactFilter::ContactedOnly),
        "uncontacted" => Ok(ContactFilter::UncontactedOnly),
        other => Err(format!(
            "unsupported filter `{other}`; expected all|contacted|uncontacted"
        )),
    }
}

fn parse_sort(raw: &str) -> Result<SortSpec, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "name" => Ok(SortSpec::by_name()),
        "date" => Ok(SortSpec::by_date()),
        other => Err(format!("unsupported sort `{other}`; expected name|date")),
    }
}

fn parse_contact_id(raw: &str) -> Result<ContactId, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid contact id `{raw}`: {err}"))
}

fn to_item(contact: Contact) -> EntryContactItem {
    EntryContactItem {
        contact_id: contact.id.to_string(),
        name: contact.name,
        email: contact.email,
        is_contacted: contact.is_contacted,
        created_at_epoch_ms: contact.created_at,
    }
}

fn resolve_entry_db_path() -> PathBuf {
    ENTRY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("PROSPECTS_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ENTRY_DB_FILE_NAME)
        })
        .clone()
}

fn entry_config() -> &'static CoreConfig {
    ENTRY_CONFIG.get_or_init(|| {
        let Ok(raw) = std::env::var("PROSPECTS_CONFIG_PATH") else {
            return CoreConfig::default();
        };
        match CoreConfig::load(raw.trim()) {
            Ok(config) => config,
            Err(err) => {
                warn!("event=entry_config module=ffi status=fallback error={err}");
                CoreConfig::default()
            }
        }
    })
}

fn entry_runtime() -> Result<&'static Runtime, String> {
    ENTRY_RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("prospects-reminders")
                .enable_time()
                .build()
                .map_err(|err| format!("reminder runtime start failed: {err}"))
        })
        .as_ref()
        .map_err(Clone::clone)
}

fn entry_reminders() -> &'static EntryReminders {
    ENTRY_REMINDERS.get_or_init(|| {
        // Host prompt is answered by the embedding app; the in-process center grants.
        let (center, fired) =
            InProcessNotificationCenter::new(AuthorizationStatus::NotDetermined, PromptAnswer::Grant);
        EntryReminders {
            center: Arc::new(center),
            fired: Mutex::new(fired),
        }
    })
}

fn entry_service() -> Result<Arc<EntryService>, String> {
    let mut slot = match ENTRY_SERVICE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(service) = slot.as_ref() {
        return Ok(Arc::clone(service));
    }

    // A failed open is not cached; the next call retries.
    let db_path = resolve_entry_db_path();
    let conn = open_shared(&db_path).map_err(|err| format!("entry DB open failed: {err}"))?;
    let center = Arc::clone(&entry_reminders().center);
    let service = ProspectsService::open(conn, entry_config(), center)
        .map(Arc::new)
        .map_err(|err| format!("entry service init failed: {err}"))?;
    *slot = Some(Arc::clone(&service));
    Ok(service)
}

fn with_selection<T>(f: impl FnOnce(&mut SelectionController) -> T) -> T {
    let selection = ENTRY_SELECTION.get_or_init(|| Mutex::new(SelectionController::new()));
    let mut guard = match selection.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(&mut guard)
}
