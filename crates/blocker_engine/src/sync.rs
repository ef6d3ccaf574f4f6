use std::time::Duration;

use blocker_core::{Identity, Mode, RuleSet, Settings};
use blocker_logging::blocker_debug;

use crate::messages::{ChannelError, Request, Response, SettingsChannel};
use crate::store::StoredSettings;

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Keeps the session's settings in step with the collaborator.
///
/// Pulls and pushes both go through [`SettingsSync::observe`], so the pipeline only
/// hears about a snapshot that differs from the last one seen.
#[derive(Debug, Clone)]
pub struct SettingsSync {
    last: Option<Settings>,
    interval: Duration,
}

impl Default for SettingsSync {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_INTERVAL)
    }
}

impl SettingsSync {
    pub fn new(interval: Duration) -> Self {
        Self {
            last: None,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Asks the collaborator for rules, mode and status.
    /// Returns the new settings when anything changed.
    pub fn pull<C: SettingsChannel + ?Sized>(
        &mut self,
        channel: &mut C,
    ) -> Result<Option<Settings>, ChannelError> {
        let block_words = match channel.request(Request::GetBlockWords)? {
            Response::BlockWords { block_words } => block_words,
            response => return Err(unexpected("getBlockWords", response)),
        };
        let auto_mode = match channel.request(Request::GetAutoMode)? {
            Response::AutoMode { auto_mode } => auto_mode,
            response => return Err(unexpected("getAutoMode", response)),
        };
        let (enabled, blocked_users) = match channel.request(Request::GetStatus)? {
            Response::Status {
                enabled,
                blocked_users,
                ..
            } => (enabled, blocked_users),
            response => return Err(unexpected("getStatus", response)),
        };

        let stored = StoredSettings {
            block_words,
            auto_mode,
            enabled,
            blocked_users,
            ..StoredSettings::default()
        };
        Ok(self.observe(settings_from_stored(&stored)))
    }

    /// Applies a `settingsUpdated` push.
    pub fn accept_push(&mut self, stored: &StoredSettings) -> Option<Settings> {
        self.observe(settings_from_stored(stored))
    }

    fn observe(&mut self, settings: Settings) -> Option<Settings> {
        if self.last.as_ref() == Some(&settings) {
            blocker_debug!("Settings unchanged");
            return None;
        }
        self.last = Some(settings.clone());
        Some(settings)
    }
}

fn unexpected(request: &'static str, response: Response) -> ChannelError {
    ChannelError::UnexpectedResponse { request, response }
}

pub fn settings_from_stored(stored: &StoredSettings) -> Settings {
    Settings {
        rules: RuleSet::from_tokens(&stored.block_words),
        mode: Mode::from_auto_flag(stored.auto_mode),
        enabled: stored.enabled,
        blocked_identities: stored
            .blocked_users
            .iter()
            .filter_map(|user| Identity::new(user))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Background;
    use crate::store::MemoryStore;

    #[test]
    fn pull_reports_only_changes() {
        let mut channel = Background::new(MemoryStore::new(StoredSettings {
            block_words: vec!["spam".into(), " ".into()],
            auto_mode: true,
            ..StoredSettings::default()
        }));
        let mut sync = SettingsSync::default();

        let first = sync.pull(&mut channel).unwrap().unwrap();
        assert_eq!(first.rules, RuleSet::from_tokens(["spam"]));
        assert_eq!(first.mode, Mode::Automatic);
        assert!(first.enabled);

        assert_eq!(sync.pull(&mut channel).unwrap(), None);
    }

    #[test]
    fn push_with_same_content_is_ignored() {
        let stored = StoredSettings {
            block_words: vec!["promo".into()],
            blocked_users: ["@Known".to_string()].into_iter().collect(),
            ..StoredSettings::default()
        };
        let mut sync = SettingsSync::default();

        let settings = sync.accept_push(&stored).unwrap();
        assert!(settings
            .blocked_identities
            .contains(&Identity::new("known").unwrap()));
        assert_eq!(sync.accept_push(&stored), None);
    }
}
