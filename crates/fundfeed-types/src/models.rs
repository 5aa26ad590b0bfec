use std::fmt;

use serde::{Deserialize, Serialize};

/// Account role. Determines which profile variant a user carries and
/// which listings they may create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Developer,
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Investor => "investor",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "developer" => Some(Role::Developer),
            "investor" => Some(Role::Investor),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation status shared by user accounts and investor posts.
/// Mutated by operators out of band; the API only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ModerationStatus> {
        match s {
            "pending" => Some(ModerationStatus::Pending),
            "approved" => Some(ModerationStatus::Approved),
            "rejected" => Some(ModerationStatus::Rejected),
            _ => None,
        }
    }
}

/// How the sender of a contact request prefers to be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPreference {
    Email,
    Phone,
    Dm,
}

impl ContactPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactPreference::Email => "email",
            ContactPreference::Phone => "phone",
            ContactPreference::Dm => "dm",
        }
    }

    pub fn parse(s: &str) -> Option<ContactPreference> {
        match s {
            "email" => Some(ContactPreference::Email),
            "phone" => Some(ContactPreference::Phone),
            "dm" => Some(ContactPreference::Dm),
            _ => None,
        }
    }
}

/// Meeting lifecycle states.
///
/// Transition endpoints only move `Scheduled -> InProgress -> Completed`.
/// `Cancelled` is terminal and reachable only through a direct PATCH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::InProgress => "in_progress",
            MeetingStatus::Completed => "completed",
            MeetingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<MeetingStatus> {
        match s {
            "scheduled" => Some(MeetingStatus::Scheduled),
            "in_progress" => Some(MeetingStatus::InProgress),
            "completed" => Some(MeetingStatus::Completed),
            "cancelled" => Some(MeetingStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the meeting happens. Stored as the kebab-case wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeetingPlatform {
    GoogleMeet,
    Zoom,
    MicrosoftTeams,
    Phone,
    InPerson,
    Other,
}

impl MeetingPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingPlatform::GoogleMeet => "google-meet",
            MeetingPlatform::Zoom => "zoom",
            MeetingPlatform::MicrosoftTeams => "microsoft-teams",
            MeetingPlatform::Phone => "phone",
            MeetingPlatform::InPerson => "in-person",
            MeetingPlatform::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<MeetingPlatform> {
        match s {
            "google-meet" => Some(MeetingPlatform::GoogleMeet),
            "zoom" => Some(MeetingPlatform::Zoom),
            "microsoft-teams" => Some(MeetingPlatform::MicrosoftTeams),
            "phone" => Some(MeetingPlatform::Phone),
            "in-person" => Some(MeetingPlatform::InPerson),
            "other" => Some(MeetingPlatform::Other),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_strings_round_trip() {
        for role in [Role::Developer, Role::Investor] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        for status in [
            MeetingStatus::Scheduled,
            MeetingStatus::InProgress,
            MeetingStatus::Completed,
            MeetingStatus::Cancelled,
        ] {
            assert_eq!(MeetingStatus::parse(status.as_str()), Some(status));
        }
        for platform in [
            MeetingPlatform::GoogleMeet,
            MeetingPlatform::Zoom,
            MeetingPlatform::MicrosoftTeams,
            MeetingPlatform::Phone,
            MeetingPlatform::InPerson,
            MeetingPlatform::Other,
        ] {
            assert_eq!(MeetingPlatform::parse(platform.as_str()), Some(platform));
        }
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(MeetingStatus::parse("done"), None);
    }

    #[test]
    fn serde_uses_wire_casing() {
        let json = serde_json::to_string(&MeetingPlatform::MicrosoftTeams).unwrap();
        assert_eq!(json, "\"microsoft-teams\"");
        let json = serde_json::to_string(&MeetingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
