//! Request access checks shared by the APIs.
//!
//! Two independent checks live here:
//! - the gRPC API key (`x-api-key`), compared against the key configured at startup
//! - the caller's role (`x-frontdesk-role`), which only gates which actions are allowed
//!
//! The role is a capability flag, not a credential. Requests without a role header fall back to
//! the configured default role.

use frontdesk_core::{Action, FrontDeskResult, Role};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const ROLE_HEADER: &str = "x-frontdesk-role";

pub const ENV_API_KEY: &str = "FRONTDESK_API_KEY";
pub const ENV_DEFAULT_ROLE: &str = "FRONTDESK_DEFAULT_ROLE";

/// Access settings resolved once at startup.
#[derive(Clone, Debug, Default)]
pub struct AccessPolicy {
    api_key: Option<String>,
    default_role: Role,
}

impl AccessPolicy {
    pub fn new(api_key: Option<String>, default_role: Role) -> Self {
        Self {
            api_key,
            default_role,
        }
    }

    /// Builds the policy from `FRONTDESK_API_KEY` and `FRONTDESK_DEFAULT_ROLE`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the default role is not a known role.
    pub fn from_lookup<F>(lookup: F) -> FrontDeskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY).filter(|k| !k.trim().is_empty());
        let default_role = match lookup(ENV_DEFAULT_ROLE) {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => Role::default(),
        };
        Ok(Self::new(api_key, default_role))
    }

    pub fn default_role(&self) -> Role {
        self.default_role
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Validates the provided API key against the configured one.
    #[allow(clippy::result_large_err)]
    pub fn validate_api_key(&self, provided: Option<&str>) -> Result<(), tonic::Status> {
        let expected = self
            .api_key
            .as_deref()
            .ok_or_else(|| tonic::Status::internal(format!("{ENV_API_KEY} not set")))?;
        let provided = provided
            .ok_or_else(|| tonic::Status::unauthenticated(format!("Missing {API_KEY_HEADER} header")))?;

        if provided == expected {
            Ok(())
        } else {
            Err(tonic::Status::unauthenticated("Invalid API key"))
        }
    }

    /// The role named by the request header, or the default role when absent or blank.
    pub fn resolve_role(&self, header: Option<&str>) -> FrontDeskResult<Role> {
        match header {
            Some(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(self.default_role),
        }
    }

    /// Resolves the caller's role and checks it may perform `action`.
    pub fn authorize(&self, header: Option<&str>, action: Action) -> FrontDeskResult<Role> {
        let role = self.resolve_role(header)?;
        role.require(action)?;
        tracing::debug!(%role, %action, "request authorised");
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::FrontDeskError;
    use std::collections::HashMap;

    fn policy(vars: &[(&str, &str)]) -> FrontDeskResult<AccessPolicy> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AccessPolicy::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_admin_without_key() {
        let policy = policy(&[]).unwrap();
        assert_eq!(policy.default_role(), Role::Admin);
        assert!(!policy.has_api_key());
        assert_eq!(
            policy.validate_api_key(Some("anything")).unwrap_err().code(),
            tonic::Code::Internal
        );
    }

    #[test]
    fn test_api_key_must_match() {
        let policy = policy(&[(ENV_API_KEY, "s3cret")]).unwrap();
        assert!(policy.validate_api_key(Some("s3cret")).is_ok());
        assert_eq!(
            policy.validate_api_key(Some("nope")).unwrap_err().code(),
            tonic::Code::Unauthenticated
        );
        assert_eq!(
            policy.validate_api_key(None).unwrap_err().code(),
            tonic::Code::Unauthenticated
        );
    }

    #[test]
    fn test_header_overrides_default_role() {
        let policy = policy(&[(ENV_DEFAULT_ROLE, "staff")]).unwrap();
        assert_eq!(policy.resolve_role(None).unwrap(), Role::Staff);
        assert_eq!(policy.resolve_role(Some(" ")).unwrap(), Role::Staff);
        assert_eq!(policy.resolve_role(Some("patient")).unwrap(), Role::Patient);
        assert!(policy.resolve_role(Some("surgeon")).is_err());
    }

    #[test]
    fn test_patient_role_cannot_admit() {
        let policy = AccessPolicy::default();
        assert!(policy.authorize(Some("patient"), Action::BookAppointment).is_ok());
        let err = policy
            .authorize(Some("patient"), Action::Admit)
            .unwrap_err();
        assert!(matches!(err, FrontDeskError::PermissionDenied { .. }));
    }

    #[test]
    fn test_unknown_default_role_fails_startup() {
        assert!(policy(&[(ENV_DEFAULT_ROLE, "janitor")]).is_err());
    }
}
