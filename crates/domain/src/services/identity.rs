//! Participant display-info resolution.
//!
//! A check-in card must show who is at the door even when profile data is
//! patchy. Resolution is an ordered chain of named strategies; the first one
//! that answers wins, and an empty answer falls through to the next. The
//! composition root decides the order (profile table, external directory,
//! nothing) without the check-in flow knowing which sources exist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when no source can identify the user.
pub const UNKNOWN_PARTICIPANT: &str = "Unknown";

/// Display information about a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl UserInfo {
    pub fn new(full_name: Option<String>, email: Option<String>) -> Self {
        Self { full_name, email }
    }

    /// Name to print on the operator card: full name, then email, then a
    /// fixed marker.
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| UNKNOWN_PARTICIPANT.to_string())
    }
}

/// A single, named strategy for resolving a participant's display info.
///
/// Implementations handle their own failures: a broken backend logs and
/// returns `None` so the chain can keep going.
#[async_trait]
pub trait UserInfoSource: Send + Sync {
    /// Strategy name, used in logs to show where an answer came from.
    fn name(&self) -> &'static str;

    async fn resolve(&self, user_id: Uuid) -> Option<UserInfo>;
}

/// Ordered list of resolution strategies.
#[derive(Default)]
pub struct ResolutionChain {
    sources: Vec<Box<dyn UserInfoSource>>,
}

impl ResolutionChain {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Appends a strategy; earlier strategies take precedence.
    pub fn with_source(mut self, source: impl UserInfoSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Resolves display info, trying each strategy in order.
    ///
    /// Always produces a `UserInfo`; with no answer from any source the
    /// result is empty and `display_name()` falls back to
    /// [`UNKNOWN_PARTICIPANT`].
    pub async fn resolve(&self, user_id: Uuid) -> UserInfo {
        for source in &self.sources {
            if let Some(info) = source.resolve(user_id).await {
                tracing::debug!(
                    user_id = %user_id,
                    source = source.name(),
                    "Resolved participant display info"
                );
                return info;
            }
        }

        tracing::debug!(user_id = %user_id, "No source resolved participant display info");
        UserInfo::default()
    }
}

/// In-memory directory source.
///
/// Used as a stand-in for an external directory in tests and local setups.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectorySource {
    entries: std::collections::HashMap<Uuid, UserInfo>,
}

impl StaticDirectorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, user_id: Uuid, info: UserInfo) -> Self {
        self.entries.insert(user_id, info);
        self
    }
}

#[async_trait]
impl UserInfoSource for StaticDirectorySource {
    fn name(&self) -> &'static str {
        "static_directory"
    }

    async fn resolve(&self, user_id: Uuid) -> Option<UserInfo> {
        self.entries.get(&user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_full_name() {
        let info = UserInfo::new(
            Some("Petra Novak".to_string()),
            Some("petra@example.com".to_string()),
        );
        assert_eq!(info.display_name(), "Petra Novak");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let info = UserInfo::new(None, Some("petra@example.com".to_string()));
        assert_eq!(info.display_name(), "petra@example.com");
    }

    #[test]
    fn test_display_name_unknown_when_empty() {
        assert_eq!(UserInfo::default().display_name(), UNKNOWN_PARTICIPANT);
    }

    #[tokio::test]
    async fn test_chain_resolves_in_order() {
        let user_id = Uuid::new_v4();

        let first = StaticDirectorySource::new().with_entry(
            user_id,
            UserInfo::new(Some("From First".to_string()), None),
        );
        let second = StaticDirectorySource::new().with_entry(
            user_id,
            UserInfo::new(Some("From Second".to_string()), None),
        );

        let chain = ResolutionChain::new()
            .with_source(first)
            .with_source(second);

        let info = chain.resolve(user_id).await;
        assert_eq!(info.full_name.as_deref(), Some("From First"));
    }

    #[tokio::test]
    async fn test_chain_falls_through_misses() {
        let user_id = Uuid::new_v4();

        let empty = StaticDirectorySource::new();
        let hit = StaticDirectorySource::new().with_entry(
            user_id,
            UserInfo::new(None, Some("found@example.com".to_string())),
        );

        let chain = ResolutionChain::new().with_source(empty).with_source(hit);

        let info = chain.resolve(user_id).await;
        assert_eq!(info.email.as_deref(), Some("found@example.com"));
    }

    #[tokio::test]
    async fn test_empty_chain_yields_unknown() {
        let chain = ResolutionChain::new();
        let info = chain.resolve(Uuid::new_v4()).await;
        assert_eq!(info, UserInfo::default());
        assert_eq!(info.display_name(), UNKNOWN_PARTICIPANT);
    }
}
