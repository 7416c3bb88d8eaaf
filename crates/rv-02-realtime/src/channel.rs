//! # Channels and Routing
//!
//! Logical addresses a connection belongs to, and the mapping from a domain
//! event to the channels that should receive it.

use serde::{Serialize, Serializer};
use shared_bus::DomainEvent;
use shared_types::{CountryCode, ParseError, Principal, Role, UserId};
use std::fmt;
use std::str::FromStr;

/// A logical delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    User(UserId),
    Role(Role),
    Country(CountryCode),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::User(id) => write!(f, "user:{}", id),
            Channel::Role(role) => write!(f, "role:{}", role),
            Channel::Country(code) => write!(f, "country:{}", code),
        }
    }
}

impl FromStr for Channel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("user", id)) => Ok(Channel::User(UserId::new(id)?)),
            Some(("role", role)) => Ok(Channel::Role(role.parse()?)),
            Some(("country", code)) => Ok(Channel::Country(code.parse()?)),
            _ => Err(ParseError::UnknownVariant {
                kind: "channel",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Channels a principal is a member of for the lifetime of its connection.
pub fn channels_for(principal: &Principal) -> Vec<Channel> {
    let mut channels = vec![
        Channel::User(principal.user_id.clone()),
        Channel::Role(principal.role),
    ];
    if principal.role.is_country_scoped() {
        channels.push(Channel::Country(principal.country));
    }
    channels
}

/// Where an event goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Union of the members of these channels.
    Channels(Vec<Channel>),
    /// Every live connection.
    Broadcast,
}

pub fn route(event: &DomainEvent) -> Route {
    match event {
        DomainEvent::SubmissionCreated { submission, .. } => Route::Channels(vec![
            Channel::Role(Role::Verifier),
            Channel::Role(Role::Admin),
            Channel::Country(submission.country),
        ]),
        DomainEvent::SubmissionTransitioned { submission, .. } => Route::Channels(vec![
            Channel::User(submission.submitter_id.clone()),
            Channel::Role(Role::Admin),
            Channel::Country(submission.country),
        ]),
        DomainEvent::SubmissionUpdated { submission, .. }
        | DomainEvent::SubmissionDeleted { submission, .. } => Route::Channels(vec![
            Channel::Role(Role::Admin),
            Channel::Country(submission.country),
        ]),
        DomainEvent::SystemNotice(_) => Route::Broadcast,
    }
}
