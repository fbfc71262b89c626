//! Self profile settings and the user's own identity code.
//!
//! # Responsibility
//! - Read/write the user's name and email as scalar settings.
//! - Render the shareable identity code through an injected codec.
//!
//! # Invariants
//! - Unset settings read as `DEFAULT_PROFILE_NAME` / `DEFAULT_PROFILE_EMAIL`.
//! - Profile values are stored as typed; they are never Contact records.

use crate::codec::identity::{IdentityCodec, IdentityImage};
use crate::repo::contact_repo::RepoResult;
use crate::repo::settings_repo::SettingsRepository;
use log::info;

pub const PROFILE_NAME_KEY: &str = "name";
pub const PROFILE_EMAIL_KEY: &str = "email";
pub const DEFAULT_PROFILE_NAME: &str = "Anonymous";
pub const DEFAULT_PROFILE_EMAIL: &str = "you@yoursite.com";

/// The user's own name/email as shown on the "Me" surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfProfile {
    pub name: String,
    pub email: String,
}

impl Default for SelfProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            email: DEFAULT_PROFILE_EMAIL.to_string(),
        }
    }
}

/// Settings-backed profile service.
pub struct ProfileService<S: SettingsRepository> {
    settings: S,
}

impl<S: SettingsRepository> ProfileService<S> {
    pub fn new(settings: S) -> Self {
        Self { settings }
    }

    /// Current profile with defaults applied to unset keys.
    pub fn profile(&self) -> RepoResult<SelfProfile> {
        let defaults = SelfProfile::default();
        Ok(SelfProfile {
            name: self
                .settings
                .get_setting(PROFILE_NAME_KEY)?
                .unwrap_or(defaults.name),
            email: self
                .settings
                .get_setting(PROFILE_EMAIL_KEY)?
                .unwrap_or(defaults.email),
        })
    }

    /// Persists a new name and returns the updated profile.
    pub fn set_name(&self, name: &str) -> RepoResult<SelfProfile> {
        self.settings.set_setting(PROFILE_NAME_KEY, name)?;
        info!("event=profile_update module=profile status=ok field=name");
        self.profile()
    }

    /// Persists a new email and returns the updated profile.
    pub fn set_email(&self, email: &str) -> RepoResult<SelfProfile> {
        self.settings.set_setting(PROFILE_EMAIL_KEY, email)?;
        info!("event=profile_update module=profile status=ok field=email");
        self.profile()
    }

    /// Drops both settings so defaults apply again.
    pub fn reset(&self) -> RepoResult<SelfProfile> {
        self.settings.remove_setting(PROFILE_NAME_KEY)?;
        self.settings.remove_setting(PROFILE_EMAIL_KEY)?;
        self.profile()
    }

    /// Renders the current profile's identity code.
    ///
    /// Call after every `set_name`/`set_email` to refresh the shared image.
    pub fn identity_code(&self, codec: &IdentityCodec) -> RepoResult<IdentityImage> {
        let profile = self.profile()?;
        Ok(codec.encode(&profile.name, &profile.email))
    }
}
