//! Token table loaded from configuration.

use crate::domain::{Principal, TokenConfig};
use crate::middleware::auth::constant_time_compare;
use crate::ports::Authenticator;

/// Authenticator backed by a fixed list of tokens.
///
/// Every entry is compared on every lookup so the time taken does not
/// depend on which entry matched.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    entries: Vec<TokenConfig>,
}

impl StaticTokenAuthenticator {
    pub fn new(entries: Vec<TokenConfig>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<Principal> {
        let mut found = None;
        for entry in &self.entries {
            if constant_time_compare(token, &entry.token) && found.is_none() {
                found = Some(Principal {
                    username: entry.username.clone(),
                    role: entry.role,
                });
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn authenticator() -> StaticTokenAuthenticator {
        StaticTokenAuthenticator::new(vec![
            TokenConfig {
                token: "reader-token".into(),
                username: "cjib".into(),
                role: Role::Reader,
            },
            TokenConfig {
                token: "writer-token".into(),
                username: "gemeente".into(),
                role: Role::Writer,
            },
        ])
    }

    #[test]
    fn test_known_tokens_resolve() {
        let auth = authenticator();
        assert_eq!(auth.len(), 2);
        assert_eq!(
            auth.authenticate("writer-token"),
            Some(Principal {
                username: "gemeente".into(),
                role: Role::Writer
            })
        );
        assert_eq!(auth.authenticate("reader-token").unwrap().role, Role::Reader);
    }

    #[test]
    fn test_unknown_token() {
        let auth = authenticator();
        assert!(auth.authenticate("reader-toke").is_none());
        assert!(auth.authenticate("").is_none());
        assert!(StaticTokenAuthenticator::default().authenticate("x").is_none());
    }
}
