/// Role-based authorization
///
/// Every authenticated caller carries exactly one [`Role`]. Route groups
/// declare which [`Audience`] they serve and check the caller's role against
/// it before any handler runs.
///
/// | Role   | Rider routes | Driver routes |
/// |--------|--------------|---------------|
/// | rider  | yes          | no            |
/// | admin  | yes          | no            |
/// | driver | no           | yes           |

use serde::{Deserialize, Serialize};

use crate::models::account::AccountRole;

/// Caller role embedded in access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Rider,
    Driver,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Rider => "rider",
            Role::Driver => "driver",
            Role::Admin => "admin",
        }
    }

    pub fn may_act_as(&self, audience: Audience) -> bool {
        match (self, audience) {
            (Role::Rider, Audience::Rider) => true,
            (Role::Admin, Audience::Rider) => true,
            (Role::Driver, Audience::Driver) => true,
            (Role::Rider, Audience::Driver) => false,
            (Role::Admin, Audience::Driver) => false,
            (Role::Driver, Audience::Rider) => false,
        }
    }
}

impl From<AccountRole> for Role {
    fn from(role: AccountRole) -> Self {
        match role {
            AccountRole::Rider => Role::Rider,
            AccountRole::Admin => Role::Admin,
        }
    }
}

/// Which side of the marketplace a route serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Rider,
    Driver,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Rider => "rider",
            Audience::Driver => "driver",
        }
    }
}

/// Authorization errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("role {role} may not access {audience} routes")]
    WrongAudience {
        role: &'static str,
        audience: &'static str,
    },
}

/// Fails unless `role` may call routes for `audience`
pub fn require_audience(role: Role, audience: Audience) -> Result<(), AuthzError> {
    if role.may_act_as(audience) {
        Ok(())
    } else {
        Err(AuthzError::WrongAudience {
            role: role.as_str(),
            audience: audience.as_str(),
        })
    }
}
