use crate::api::resource::ResourceKind;
use thiserror::Error;

/// Remediation appended to every authentication failure.
pub const AUTH_TIP: &str =
    "Tip: re-authenticate with 'gcloud auth application-default login' and verify permissions";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Cli(#[from] CliError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Display(#[from] DisplayError),
    #[error("failed to list {resource}: {source}")]
    List {
        resource: ResourceKind,
        #[source]
        source: ClassifiedError,
    },
    #[error("failed to {action} {target}: {source}")]
    Request {
        action: &'static str,
        target: String,
        #[source]
        source: ClassifiedError,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("No project selected")]
    ProjectRequired { hint: String },
}

/// Failure of a single remote call. Values compare by content so a
/// classified error can be checked against its cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request to {endpoint} timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("HTTP {status} from {endpoint}: {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("{status_name} ({status}) from {endpoint}: {server_message}")]
    Unauthorized {
        status: u16,
        status_name: String,
        endpoint: String,
        server_message: String,
    },
    #[error("transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    #[error("operation {operation} failed with code {code}: {message}")]
    Operation {
        operation: String,
        code: i32,
        message: String,
    },
}

/// Credential discovery failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("failed to find default credentials: {reason}")]
    CredentialsNotFound { reason: String },
    #[error("failed to find default credentials: '{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("failed to find default credentials: {source_name} returned an empty token")]
    EmptyToken { source_name: String },
}

/// Malformed user input, rejected before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {field} '{value}': expected a whole number")]
    NotANumber { field: String, value: String },
    #[error("invalid {field} '{value}': must not be negative")]
    Negative { field: String, value: String },
    #[error("min instances ({min}) cannot be greater than max instances ({max})")]
    MinGreaterThanMax { min: u32, max: u32 },
    #[error("either --manual or --min must be provided")]
    MissingScaling,
    #[error("invalid resource name '{name}': {reason}")]
    InvalidResourceName { name: String, reason: String },
    #[error("invalid region '{region}'")]
    InvalidRegion { region: String },
    #[error("invalid output format '{value}': expected table, json or yaml")]
    InvalidFormat { value: String },
    #[error("invalid region error policy '{value}': expected ignore, warn or fail")]
    InvalidRegionPolicy { value: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown configuration key '{key}'")]
    UnknownKey { key: String },
    #[error("Invalid configuration value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Serialization to {format} failed: {message}")]
    Serialize { format: String, message: String },
    #[error("Terminal output error: {0}")]
    TerminalOutput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Other,
}

/// A remote failure sorted into auth-class or anything else.
///
/// `Auth` keeps the original error as its source; `Other` is the original
/// error itself, unwrapped and unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedError {
    #[error("authentication failed: {source}. {tip}", tip = AUTH_TIP)]
    Auth {
        #[source]
        source: ApiError,
    },
    #[error(transparent)]
    Other(ApiError),
}

impl ClassifiedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClassifiedError::Auth { .. } => ErrorKind::Auth,
            ClassifiedError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// User-facing message, printed verbatim.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn cause(&self) -> &ApiError {
        match self {
            ClassifiedError::Auth { source } => source,
            ClassifiedError::Other(err) => err,
        }
    }

    pub fn into_cause(self) -> ApiError {
        match self {
            ClassifiedError::Auth { source } => source,
            ClassifiedError::Other(err) => err,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "critical",
            ErrorSeverity::High => "error",
            ErrorSeverity::Medium => "error",
            ErrorSeverity::Low => "warning",
        }
    }
}

impl AppError {
    /// The classified remote failure behind this error, if there is one.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            AppError::List { source, .. } | AppError::Request { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        match self {
            AppError::Auth(_) => true,
            AppError::Api(ApiError::Unauthorized { .. }) => true,
            _ => self.classified().is_some_and(ClassifiedError::is_auth),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Auth(_) => ErrorSeverity::Critical,
            _ if self.is_auth() => ErrorSeverity::High,
            AppError::Cli(_) | AppError::Validation(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) => match api_error {
                ApiError::Timeout { .. } => ErrorSeverity::Medium,
                ApiError::Http { status, .. } if *status >= 500 => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Display(_) => ErrorSeverity::Low,
            AppError::List { .. } | AppError::Request { .. } => ErrorSeverity::Medium,
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Auth(_) => Some(
                "Run 'gcloud auth application-default login' or set RUN_ACCESS_TOKEN".to_string(),
            ),
            AppError::Cli(CliError::ProjectRequired { hint }) => Some(hint.clone()),
            AppError::Api(ApiError::Timeout { .. }) => {
                Some("Check your network connection or raise --timeout".to_string())
            }
            AppError::Config(_) => {
                Some("'run-cli config show' prints the active configuration".to_string())
            }
            AppError::List {
                source: ClassifiedError::Other(ApiError::Http { status: 404, .. }),
                ..
            } => Some("Check the project and region; 'run-cli region list' shows valid regions".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unauthorized() -> ApiError {
        ApiError::Unauthorized {
            status: 403,
            status_name: "PERMISSION_DENIED".to_string(),
            endpoint: "/v2/projects/p/locations/r/services".to_string(),
            server_message: "caller lacks run.services.list".to_string(),
        }
    }

    #[test]
    fn test_auth_error_display_carries_context() {
        let err = AuthError::CredentialsNotFound {
            reason: "no token source".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to find default credentials: no token source"
        );
    }

    #[test]
    fn test_classified_auth_message_and_cause() {
        let classified = ClassifiedError::Auth {
            source: unauthorized(),
        };
        assert_eq!(classified.kind(), ErrorKind::Auth);
        assert!(classified.message().starts_with("authentication failed: "));
        assert!(classified.message().ends_with(AUTH_TIP));
        assert_eq!(classified.cause(), &unauthorized());

        let source = std::error::Error::source(&classified).expect("auth keeps a source");
        assert_eq!(source.to_string(), unauthorized().to_string());
    }

    #[test]
    fn test_classified_other_is_transparent() {
        let original = ApiError::Http {
            status: 500,
            endpoint: "/v2/x".to_string(),
            message: "boom".to_string(),
        };
        let classified = ClassifiedError::Other(original.clone());
        assert_eq!(classified.kind(), ErrorKind::Other);
        assert_eq!(classified.message(), original.to_string());
        assert_eq!(classified.into_cause(), original);
    }

    #[test]
    fn test_list_error_context() {
        let err = AppError::List {
            resource: ResourceKind::Service,
            source: ClassifiedError::Other(ApiError::Transport {
                endpoint: "/v2/x".to_string(),
                message: "connection reset".to_string(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "failed to list services: transport error calling /v2/x: connection reset"
        );
        assert!(!err.is_auth());
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_auth_errors_are_high_severity() {
        let err = AppError::List {
            resource: ResourceKind::Job,
            source: ClassifiedError::Auth {
                source: unauthorized(),
            },
        };
        assert!(err.is_auth());
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::NotANumber {
            field: "manual instances".to_string(),
            value: "three".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid manual instances 'three': expected a whole number"
        );
        let app_err: AppError = err.into();
        assert_eq!(app_err.severity(), ErrorSeverity::Medium);
        assert!(app_err.troubleshooting_hint().is_none());
    }

    #[test]
    fn test_troubleshooting_hints() {
        let err = AppError::Auth(AuthError::EmptyToken {
            source_name: "gcloud".to_string(),
        });
        assert!(err.troubleshooting_hint().is_some());

        let err = AppError::Api(ApiError::Timeout {
            timeout_secs: 30,
            endpoint: "/v2/x".to_string(),
        });
        assert!(
            err.troubleshooting_hint()
                .expect("timeout has a hint")
                .contains("--timeout")
        );
    }
}
