use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    /// Parses the stored column value; unknown values are treated as the
    /// least privileged role.
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or(Role::Employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_values_round_through_strum() {
        assert_eq!(Role::Admin.as_ref(), "ADMIN");
        assert_eq!(Role::from_db("EMPLOYEE"), Role::Employee);
        assert_eq!(Role::from_db("ADMIN"), Role::Admin);
        assert_eq!(Role::from_db("superuser"), Role::Employee);
    }

    #[test]
    fn json_uses_upper_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"EMPLOYEE\"").unwrap();
        assert_eq!(role, Role::Employee);
    }
}
