// ABOUTME: Explicit snapshot of the credential-related process environment.
// ABOUTME: Captured once at startup and threaded through validation and deployment.

use std::fmt;

pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const PROFILE: &str = "AWS_PROFILE";
pub const REGION: &str = "AWS_REGION";
pub const DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const TOOL_ACCESS_KEY: &str = "SERVERLESS_ACCESS_KEY";

/// Credentials and region visible to the deployment.
///
/// Components never read `std::env` themselves; they receive this value, and the
/// deployer forwards it to child processes explicitly.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
    pub tool_access_key: Option<String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            access_key_id: get(ACCESS_KEY_ID),
            secret_access_key: get(SECRET_ACCESS_KEY),
            session_token: get(SESSION_TOKEN),
            profile: get(PROFILE),
            region: get(REGION).or_else(|| get(DEFAULT_REGION)),
            tool_access_key: get(TOOL_ACCESS_KEY),
        }
    }

    /// Variables to set on child processes so they see exactly this snapshot.
    pub fn child_env(&self) -> Vec<(&'static str, String)> {
        let mut vars = Vec::new();
        let mut push = |key: &'static str, value: &Option<String>| {
            if let Some(v) = value {
                vars.push((key, v.clone()));
            }
        };
        push(ACCESS_KEY_ID, &self.access_key_id);
        push(SECRET_ACCESS_KEY, &self.secret_access_key);
        push(SESSION_TOKEN, &self.session_token);
        push(PROFILE, &self.profile);
        push(REGION, &self.region);
        push(DEFAULT_REGION, &self.region);
        push(TOOL_ACCESS_KEY, &self.tool_access_key);
        vars
    }
}

impl fmt::Debug for EnvSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("EnvSnapshot")
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .field("profile", &self.profile)
            .field("region", &self.region)
            .field("tool_access_key", &redact(&self.tool_access_key))
            .finish()
    }
}
