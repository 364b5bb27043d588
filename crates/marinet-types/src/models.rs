use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two ballots a user can cast on a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVoteKind(pub String);

impl fmt::Display for UnknownVoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid vote type: {}", self.0)
    }
}

impl std::error::Error for UnknownVoteKind {}

impl FromStr for VoteKind {
    type Err = UnknownVoteKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(Self::Upvote),
            "downvote" => Ok(Self::Downvote),
            other => Err(UnknownVoteKind(other.to_string())),
        }
    }
}

/// Denormalized counters stored on every content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
}

/// Notification type tag. Only mentions exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Mention,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mention => "mention",
        }
    }
}

/// A content item is either a feed post or a post scoped to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Post,
    GroupPost,
}

impl ContentKind {
    pub fn from_group(group_id: Option<&str>) -> Self {
        if group_id.is_some() {
            Self::GroupPost
        } else {
            Self::Post
        }
    }

    /// Human label used in notification text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::GroupPost => "group post",
        }
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Accepts RFC 3339 as well; anything else maps to the epoch.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_kind_parses_only_known_values() {
        assert_eq!("upvote".parse::<VoteKind>(), Ok(VoteKind::Upvote));
        assert_eq!("downvote".parse::<VoteKind>(), Ok(VoteKind::Downvote));
        assert!("Upvote".parse::<VoteKind>().is_err());
        assert!("sideways".parse::<VoteKind>().is_err());
    }

    #[test]
    fn sqlite_timestamps_parse_as_utc() {
        let ts = parse_timestamp("2024-03-01 12:30:05");
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:05+00:00");
        assert_eq!(parse_timestamp("garbage"), DateTime::<Utc>::default());
    }
}
