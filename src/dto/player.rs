use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::validation::validate_not_blank, state::player::Player};

/// Public projection of a player. The e-mail may be masked.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Display name.
    pub name: String,
    /// E-mail, possibly masked.
    pub email: String,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            email: player.email.clone(),
        }
    }
}

/// Player to grant admin rights to.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AdminRequest {
    /// E-mail of the new admin.
    #[validate(email)]
    pub email: String,
    /// Display name; defaults to the e-mail.
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"), length(max = 100))]
    pub name: Option<String>,
}

impl AdminRequest {
    /// Player to register; the e-mail stands in for a missing name.
    pub fn into_player(self) -> Player {
        let name = self.name.unwrap_or_else(|| self.email.clone());
        Player::new(name.trim(), self.email)
    }
}

/// Admin to revoke.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AdminRemoval {
    /// E-mail of the admin to remove.
    #[validate(length(min = 1))]
    pub email: String,
}

/// Global admin check result.
#[derive(Debug, Serialize, ToSchema)]
pub struct IsAdminResponse {
    /// Whether the caller is a global admin.
    pub admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_request_requires_an_email() {
        let request = AdminRequest {
            email: "not an email".into(),
            name: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn admin_name_defaults_to_email() {
        let request = AdminRequest {
            email: "pat@x.com".into(),
            name: None,
        };
        assert!(request.validate().is_ok());
        assert_eq!(request.into_player(), Player::new("pat@x.com", "pat@x.com"));
    }
}
