use crate::error::AuthError;
use async_trait::async_trait;
use std::env;
use std::fmt;
use std::sync::Arc;
use tokio::process::Command;

/// OAuth scope covering every API this tool calls.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Environment variables checked for a ready-made bearer token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["RUN_ACCESS_TOKEN", "CLOUDSDK_AUTH_ACCESS_TOKEN"];

const GCLOUD_ARGS: &[&str] = &["auth", "application-default", "print-access-token"];

/// A bearer token plus where it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    source: String,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            source: source.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

// Never print the token itself.
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("source", &self.source)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Something that can hand out an access token for the given scopes.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError>;

    fn name(&self) -> &str;
}

/// A fixed token, from `--access-token` or a test.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self, _scopes: &[&str]) -> Result<AccessToken, AuthError> {
        non_empty(&self.token, self.name())
    }

    fn name(&self) -> &str {
        "--access-token"
    }
}

/// Reads the first non-empty variable of [`TOKEN_ENV_VARS`].
#[derive(Debug, Clone, Default)]
pub struct EnvTokenProvider;

impl EnvTokenProvider {
    pub fn lookup() -> Option<(&'static str, String)> {
        TOKEN_ENV_VARS.iter().find_map(|var| {
            env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (*var, v))
        })
    }
}

#[async_trait]
impl CredentialProvider for EnvTokenProvider {
    async fn access_token(&self, _scopes: &[&str]) -> Result<AccessToken, AuthError> {
        match Self::lookup() {
            Some((var, token)) => non_empty(&token, var),
            None => Err(AuthError::CredentialsNotFound {
                reason: format!("none of {} is set", TOKEN_ENV_VARS.join(", ")),
            }),
        }
    }

    fn name(&self) -> &str {
        "environment"
    }
}

/// Asks the gcloud CLI for an application-default token.
#[derive(Debug, Clone)]
pub struct GcloudTokenProvider {
    program: String,
}

impl Default for GcloudTokenProvider {
    fn default() -> Self {
        Self {
            program: "gcloud".to_string(),
        }
    }
}

impl GcloudTokenProvider {
    /// Use another executable in place of `gcloud`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command_line(&self) -> String {
        format!("{} {}", self.program, GCLOUD_ARGS.join(" "))
    }
}

#[async_trait]
impl CredentialProvider for GcloudTokenProvider {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError> {
        log::debug!("Requesting token from {} for {:?}", self.program, scopes);

        let output = Command::new(&self.program)
            .args(GCLOUD_ARGS)
            .output()
            .await
            .map_err(|e| AuthError::CredentialsNotFound {
                reason: format!("could not run '{}': {}", self.command_line(), e),
            })?;

        if !output.status.success() {
            return Err(AuthError::CommandFailed {
                command: self.command_line(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let token = String::from_utf8_lossy(&output.stdout);
        non_empty(token.trim(), &self.program)
    }

    fn name(&self) -> &str {
        "gcloud"
    }
}

/// Tries each provider in order and returns the first token found.
pub struct ChainProvider {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl ChainProvider {
    pub fn new(providers: Vec<Arc<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl CredentialProvider for ChainProvider {
    async fn access_token(&self, scopes: &[&str]) -> Result<AccessToken, AuthError> {
        let mut last_error = AuthError::CredentialsNotFound {
            reason: "no credential source configured".to_string(),
        };
        for provider in &self.providers {
            match provider.access_token(scopes).await {
                Ok(token) => {
                    log::debug!("Using credentials from {}", token.source());
                    return Ok(token);
                }
                Err(e) => {
                    log::debug!("Credential source {} unavailable: {}", provider.name(), e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    fn name(&self) -> &str {
        "default"
    }
}

/// The default lookup: environment variables, then gcloud.
pub fn default_provider() -> Arc<dyn CredentialProvider> {
    Arc::new(ChainProvider::new(vec![
        Arc::new(EnvTokenProvider),
        Arc::new(GcloudTokenProvider::default()),
    ]))
}

/// Provider for an explicit `--access-token`, or the default chain.
pub fn provider_for(access_token: Option<&str>) -> Arc<dyn CredentialProvider> {
    match access_token {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => default_provider(),
    }
}

pub async fn find_default_credentials(scopes: &[&str]) -> Result<AccessToken, AuthError> {
    default_provider().access_token(scopes).await
}

pub fn has_env_token() -> bool {
    EnvTokenProvider::lookup().is_some()
}

fn non_empty(token: &str, source_name: &str) -> Result<AccessToken, AuthError> {
    if token.trim().is_empty() {
        return Err(AuthError::EmptyToken {
            source_name: source_name.to_string(),
        });
    }
    Ok(AccessToken::new(token.trim(), source_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl CredentialProvider for Failing {
        async fn access_token(&self, _scopes: &[&str]) -> Result<AccessToken, AuthError> {
            Err(AuthError::CredentialsNotFound {
                reason: "nothing here".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_static_provider() {
        let token = StaticTokenProvider::new("abc")
            .access_token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .expect("token");
        assert_eq!(token.secret(), "abc");
        assert_eq!(token.source(), "--access-token");
    }

    #[tokio::test]
    async fn test_static_provider_rejects_empty_token() {
        let err = StaticTokenProvider::new("  ")
            .access_token(&[])
            .await
            .expect_err("empty token");
        assert!(matches!(err, AuthError::EmptyToken { .. }));
        assert!(
            err.to_string()
                .starts_with("failed to find default credentials: ")
        );
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_provider() {
        let chain = ChainProvider::new(vec![
            Arc::new(Failing),
            Arc::new(StaticTokenProvider::new("second")),
        ]);
        let token = chain.access_token(&[]).await.expect("token");
        assert_eq!(token.secret(), "second");
    }

    #[tokio::test]
    async fn test_chain_reports_last_error() {
        let chain = ChainProvider::new(vec![Arc::new(Failing)]);
        let err = chain.access_token(&[]).await.expect_err("no token");
        assert_eq!(
            err.to_string(),
            "failed to find default credentials: nothing here"
        );
    }

    #[tokio::test]
    async fn test_missing_gcloud_binary() {
        let provider = GcloudTokenProvider::with_program("definitely-not-a-real-gcloud-binary");
        let err = provider.access_token(&[]).await.expect_err("no binary");
        assert!(matches!(err, AuthError::CredentialsNotFound { .. }));
        assert!(err.to_string().contains("print-access-token"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("super-secret", "env");
        assert!(!format!("{:?}", token).contains("super-secret"));
    }
}
