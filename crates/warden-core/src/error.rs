//! Error types for Warden

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Credential Errors
    #[error("Username is empty")]
    EmptyUsername,

    #[error("Password is empty")]
    EmptyPassword,

    #[error("No user {0} found")]
    UserNotFound(String),

    #[error("More than one user found for {0}")]
    AmbiguousUser(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User {0} is not a member of any allowed group")]
    NotInAllowedGroups(String),

    #[error("Invalid id property name {0}")]
    InvalidIdProperty(String),

    // Configuration Errors
    #[error("Missing required property: {0}")]
    MissingProperty(String),

    #[error("Invalid value '{value}' for property {key}")]
    InvalidProperty { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid groups file: {0}")]
    GroupsFile(String),

    // Directory Errors
    #[error("LDAP error: {0}")]
    Directory(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::EmptyUsername => "EmptyUsername",
            Error::EmptyPassword => "EmptyPassword",
            Error::UserNotFound(_) => "UserNotFound",
            Error::AmbiguousUser(_) => "AmbiguousUser",
            Error::InvalidCredentials => "InvalidCredentials",
            Error::NotInAllowedGroups(_) => "NotInAllowedGroups",
            Error::InvalidIdProperty(_) => "InvalidIdProperty",
            Error::MissingProperty(_) => "MissingProperty",
            Error::InvalidProperty { .. } => "InvalidProperty",
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::GroupsFile(_) => "GroupsFile",
            Error::Directory(_) => "DirectoryError",
            Error::Io(_) => "IoError",
        }
    }

    /// True when the login itself was refused, as opposed to the manager
    /// being misconfigured or the directory being unreachable.
    pub fn is_login_failure(&self) -> bool {
        matches!(
            self,
            Error::EmptyUsername
                | Error::EmptyPassword
                | Error::UserNotFound(_)
                | Error::AmbiguousUser(_)
                | Error::InvalidCredentials
                | Error::NotInAllowedGroups(_)
        )
    }
}
