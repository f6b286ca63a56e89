use serde::{Deserialize, Serialize};
use std::fmt;

/// Directory entry for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerContact {
    pub player_id: String,
    pub display_name: String,
    pub country: Option<String>,
    /// Push token; players without one cannot be notified
    pub contact_token: Option<String>,
}

/// Notification category; daily caps are counted per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    TeamSelection,
    StarOfTheMatch,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::TeamSelection => "team_selection",
            NotificationCategory::StarOfTheMatch => "star_of_the_match",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Message template shared by every recipient of one fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
}

/// One message addressed to one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub token: String,
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn render(template: &NotificationTemplate, contact: &PlayerContact, token: &str) -> Self {
        Self {
            recipient: contact.player_id.clone(),
            token: token.to_string(),
            category: template.category,
            title: template.title.clone(),
            body: template.body.replace("{name}", &contact.display_name),
        }
    }
}
