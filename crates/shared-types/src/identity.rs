//! # Identity
//!
//! Roles, country scoping and the authenticated `Principal`.

use crate::errors::{IdentityError, ParseError};
use crate::ids::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform role. Fixed for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Contributor,
    Verifier,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Contributor, Role::Verifier, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Contributor => "contributor",
            Role::Verifier => "verifier",
            Role::Admin => "admin",
        }
    }

    /// Verifiers and admins are scoped to a country channel.
    pub fn is_country_scoped(&self) -> bool {
        matches!(self, Role::Verifier | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contributor" => Ok(Role::Contributor),
            "verifier" => Ok(Role::Verifier),
            "admin" => Ok(Role::Admin),
            other => Err(ParseError::unknown("role", other)),
        }
    }
}

/// ISO 3166-1 alpha-2 country code, always upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(ParseError::InvalidCountry(s.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        // Both bytes are ASCII letters by construction.
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CountryCode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.as_str().to_string()
    }
}

/// An authenticated, active user acting on the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    pub country: CountryCode,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role, country: CountryCode) -> Self {
        Self {
            user_id,
            role,
            country,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins everywhere, verifiers only inside their own country.
    pub fn can_verify_in(&self, country: &CountryCode) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Verifier => &self.country == country,
            Role::Contributor => false,
        }
    }
}

/// What the identity provider knows about a credential holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub user_id: UserId,
    pub role: Role,
    pub country: CountryCode,
    pub is_active: bool,
}

impl ResolvedIdentity {
    /// Convert into a `Principal`, refusing inactive accounts.
    pub fn into_principal(self) -> Result<Principal, IdentityError> {
        if !self.is_active {
            return Err(IdentityError::Inactive(self.user_id.to_string()));
        }
        Ok(Principal::new(self.user_id, self.role, self.country))
    }
}

/// Port to the external identity provider.
///
/// Token issuance and verification mechanics live behind this trait.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a bearer credential.
    async fn resolve(&self, credential: &str) -> Result<ResolvedIdentity, IdentityError>;

    /// Resolve and require an active account.
    async fn authenticate(&self, credential: &str) -> Result<Principal, IdentityError> {
        if credential.is_empty() {
            return Err(IdentityError::MissingCredential);
        }
        self.resolve(credential).await?.into_principal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_normalizes_case() {
        let gh = CountryCode::parse("gh").unwrap();
        assert_eq!(gh.as_str(), "GH");
        assert_eq!(gh, CountryCode::parse("GH").unwrap());
    }

    #[test]
    fn test_country_code_rejects_bad_input() {
        assert!(CountryCode::parse("GHA").is_err());
        assert!(CountryCode::parse("G1").is_err());
        assert!(CountryCode::parse("").is_err());
    }

    #[test]
    fn test_country_code_serde() {
        let code: CountryCode = serde_json::from_str("\"fr\"").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"FR\"");
        assert!(serde_json::from_str::<CountryCode>("\"France\"").is_err());
    }

    #[test]
    fn test_role_scoping() {
        assert!(!Role::Contributor.is_country_scoped());
        assert!(Role::Verifier.is_country_scoped());
        assert!(Role::Admin.is_country_scoped());
        assert_eq!("verifier".parse::<Role>().unwrap(), Role::Verifier);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_can_verify_in() {
        let gh = CountryCode::parse("GH").unwrap();
        let fr = CountryCode::parse("FR").unwrap();
        let verifier = Principal::new(UserId::new("v1").unwrap(), Role::Verifier, gh);
        let admin = Principal::new(UserId::new("a1").unwrap(), Role::Admin, fr);
        let contributor = Principal::new(UserId::new("c1").unwrap(), Role::Contributor, gh);

        assert!(verifier.can_verify_in(&gh));
        assert!(!verifier.can_verify_in(&fr));
        assert!(admin.can_verify_in(&gh));
        assert!(!contributor.can_verify_in(&gh));
    }

    struct FixedResolver(ResolvedIdentity);

    #[async_trait]
    impl IdentityResolver for FixedResolver {
        async fn resolve(&self, _credential: &str) -> Result<ResolvedIdentity, IdentityError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_authenticate_rejects_inactive() {
        let resolver = FixedResolver(ResolvedIdentity {
            user_id: UserId::new("u1").unwrap(),
            role: Role::Verifier,
            country: CountryCode::parse("GH").unwrap(),
            is_active: false,
        });
        assert!(matches!(
            resolver.authenticate("token").await,
            Err(IdentityError::Inactive(_))
        ));
        assert_eq!(
            resolver.authenticate("").await,
            Err(IdentityError::MissingCredential)
        );
    }
}
