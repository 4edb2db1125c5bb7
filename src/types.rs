/// Shared domain types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles known to the application. Stored by name in the roles table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Administrator,
}

impl Role {
    pub const ALL: [Role; 1] = [Role::Administrator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named authorization policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    CanPurge,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::CanPurge => "CanPurge",
        }
    }

    /// Roles a user must hold (any of) to satisfy the policy.
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            Policy::CanPurge => &[Role::Administrator],
        }
    }
}

/// Sign-in providers other than local passwords. Persisted as INTEGER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthProvider {
    Google = 0,
}

impl AuthProvider {
    pub fn scheme(&self) -> &'static str {
        match self {
            AuthProvider::Google => "Google",
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(AuthProvider::Google),
            _ => None,
        }
    }
}

/// To-do item priority. Serialized as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PriorityLevel {
    #[default]
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 4] = [
        PriorityLevel::None,
        PriorityLevel::Low,
        PriorityLevel::Medium,
        PriorityLevel::High,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            PriorityLevel::None => "None",
            PriorityLevel::Low => "Low",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::High => "High",
        }
    }

    pub fn lookups() -> Vec<LookupDto> {
        Self::ALL
            .iter()
            .map(|p| LookupDto { id: *p as i64, title: p.title().to_string() })
            .collect()
    }
}

impl TryFrom<i64> for PriorityLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|p| *p as i64 == value)
            .ok_or_else(|| format!("'{}' is not a valid priority level", value))
    }
}

impl From<PriorityLevel> for i64 {
    fn from(value: PriorityLevel) -> Self {
        value as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupDto {
    pub id: i64,
    pub title: String,
}

/// Colour of a to-do list, restricted to a fixed palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colour(&'static str);

impl Colour {
    pub const WHITE: Colour = Colour("#FFFFFF");
    pub const RED: Colour = Colour("#FF5733");
    pub const ORANGE: Colour = Colour("#FFC300");
    pub const YELLOW: Colour = Colour("#FFFF66");
    pub const GREEN: Colour = Colour("#CCFF99");
    pub const BLUE: Colour = Colour("#6666FF");
    pub const PURPLE: Colour = Colour("#9966CC");
    pub const GREY: Colour = Colour("#999999");

    pub const SUPPORTED: [Colour; 8] = [
        Self::WHITE,
        Self::RED,
        Self::ORANGE,
        Self::YELLOW,
        Self::GREEN,
        Self::BLUE,
        Self::PURPLE,
        Self::GREY,
    ];

    pub fn from_code(code: &str) -> Result<Self, String> {
        Self::SUPPORTED
            .into_iter()
            .find(|c| c.0.eq_ignore_ascii_case(code))
            .ok_or_else(|| format!("Colour \"{}\" is unsupported.", code))
    }

    pub fn code(&self) -> &'static str {
        self.0
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
