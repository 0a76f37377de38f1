//! Platform abstraction layer
//!
//! Defines the [`Platform`] trait that all social platforms implement,
//! plus the credential bundle and factory that turn configuration into
//! ready-to-post clients.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::types::{ImageAttachment, PlatformKind, PostRef, ReplyRefs};

pub mod bluesky;
pub mod linkedin;
pub mod mock;
pub mod twitter;

pub use bluesky::{BlueskyClient, BlueskySession};
pub use linkedin::{LinkedInClient, LinkedInCredential};
pub use mock::{MockConfig, MockPlatform};
pub use twitter::{TwitterClient, TwitterCredential};

// ============================================================================
// Platform trait
// ============================================================================

/// A social platform capable of publishing a reply-chained thread.
///
/// Implementations are `Send + Sync` so dispatchers can hold them behind
/// `Box<dyn Platform>` across await points.
#[async_trait]
pub trait Platform: Send + Sync + std::fmt::Debug {
    /// Which platform this client posts to.
    fn kind(&self) -> PlatformKind;

    /// Maximum characters a single post may carry.
    fn character_limit(&self) -> usize;

    /// Pause inserted between consecutive chunks of a thread.
    fn inter_chunk_delay(&self) -> Duration;

    /// Platforms with aggressive rate limiting get longer pauses between
    /// sibling publishes.
    fn rate_limit_sensitive(&self) -> bool {
        false
    }

    /// Check chunk text before any network call is made.
    fn validate_content(&self, text: &str) -> Result<()>;

    /// Publish one chunk. `reply` carries the thread's root and the
    /// immediately preceding post; `None` marks the thread root itself.
    /// Attachments are only ever passed for the first chunk.
    async fn publish_chunk(
        &self,
        text: &str,
        reply: Option<&ReplyRefs>,
        attachments: &[ImageAttachment],
    ) -> Result<PostRef>;

    /// Human-viewable URL for a published post, when one can be derived.
    fn post_url(&self, post: &PostRef) -> Option<String>;
}

// ============================================================================
// Credentials and factory
// ============================================================================

/// Credentials for every platform the caller has access to. A missing
/// entry simply leaves that platform out of the dispatch set.
#[derive(Default)]
pub struct Credentials {
    pub twitter: Option<TwitterCredential>,
    pub linkedin: Option<LinkedInCredential>,
    pub bluesky: Option<BlueskySession>,
}

/// Build platform clients for every platform that is named in the config,
/// enabled, and has credentials. Order follows `defaults.platforms`.
pub fn create_platforms(
    config: &Config,
    credentials: Credentials,
) -> Result<Vec<Box<dyn Platform>>> {
    let Credentials {
        mut twitter,
        mut linkedin,
        mut bluesky,
    } = credentials;

    let mut platforms: Vec<Box<dyn Platform>> = Vec::new();
    for name in &config.defaults.platforms {
        let kind: PlatformKind = name.parse().map_err(|_| {
            ConfigError::Invalid(format!("unknown platform in defaults.platforms: {name}"))
        })?;

        match kind {
            PlatformKind::Twitter => {
                let enabled = config.twitter.as_ref().is_some_and(|c| c.enabled);
                match (enabled, twitter.take()) {
                    (true, Some(credential)) => {
                        let section = config.twitter.as_ref().map(|c| (c.premium, c.api_base.clone()));
                        let (premium, api_base) = section.unwrap_or((false, None));
                        platforms.push(Box::new(TwitterClient::new(credential, premium, api_base)));
                    }
                    (true, None) => debug!("twitter enabled but no credentials, skipping"),
                    (false, _) => debug!("twitter not enabled, skipping"),
                }
            }
            PlatformKind::LinkedIn => {
                let enabled = config.linkedin.as_ref().is_some_and(|c| c.enabled);
                match (enabled, linkedin.take()) {
                    (true, Some(credential)) => {
                        let api_base = config.linkedin.as_ref().and_then(|c| c.api_base.clone());
                        platforms.push(Box::new(LinkedInClient::new(credential, api_base)));
                    }
                    (true, None) => debug!("linkedin enabled but no credentials, skipping"),
                    (false, _) => debug!("linkedin not enabled, skipping"),
                }
            }
            PlatformKind::Bluesky => {
                let enabled = config.bluesky.as_ref().is_some_and(|c| c.enabled);
                match (enabled, bluesky.take()) {
                    (true, Some(session)) => {
                        platforms.push(Box::new(BlueskyClient::new(session)));
                    }
                    (true, None) => debug!("bluesky enabled but no session, skipping"),
                    (false, _) => debug!("bluesky not enabled, skipping"),
                }
            }
        }
    }

    Ok(platforms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn full_credentials() -> Credentials {
        Credentials {
            twitter: Some(TwitterCredential {
                bearer_token: SecretString::from("tw-token"),
            }),
            linkedin: Some(LinkedInCredential {
                access_token: SecretString::from("li-token"),
                author_urn: "urn:li:person:abc".to_string(),
            }),
            bluesky: Some(BlueskySession {
                did: "did:plc:abc".to_string(),
                handle: "me.bsky.social".to_string(),
                access_jwt: SecretString::from("bsky-jwt"),
                service: "https://bsky.social".to_string(),
            }),
        }
    }

    #[test]
    fn test_create_platforms_follows_config_order() {
        let config = Config::default_config();
        let platforms = create_platforms(&config, full_credentials()).unwrap();

        let kinds: Vec<PlatformKind> = platforms.iter().map(|p| p.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                PlatformKind::Bluesky,
                PlatformKind::Twitter,
                PlatformKind::LinkedIn
            ]
        );
    }

    #[test]
    fn test_missing_credentials_skips_platform() {
        let config = Config::default_config();
        let credentials = Credentials {
            bluesky: full_credentials().bluesky,
            ..Default::default()
        };
        let platforms = create_platforms(&config, credentials).unwrap();

        assert_eq!(platforms.len(), 1);
        assert_eq!(platforms[0].kind(), PlatformKind::Bluesky);
    }

    #[test]
    fn test_disabled_platform_skipped() {
        let mut config = Config::default_config();
        if let Some(twitter) = config.twitter.as_mut() {
            twitter.enabled = false;
        }
        let platforms = create_platforms(&config, full_credentials()).unwrap();

        let kinds: Vec<PlatformKind> = platforms.iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec![PlatformKind::Bluesky, PlatformKind::LinkedIn]);
    }

    #[test]
    fn test_unknown_platform_name_rejected() {
        let mut config = Config::default_config();
        config.defaults.platforms = vec!["myspace".to_string()];

        let err = create_platforms(&config, full_credentials()).unwrap_err();
        assert!(err.to_string().contains("myspace"));
    }

    #[test]
    fn test_empty_platform_list_yields_no_clients() {
        let mut config = Config::default_config();
        config.defaults.platforms.clear();

        let platforms = create_platforms(&config, full_credentials()).unwrap();
        assert!(platforms.is_empty());
    }
}
