//! Clockwork CLI library.
//!
//! This crate provides the `cw` command-line interface over the services in
//! `cw-core` and the SQLite storage in `cw-db`.

mod cli;
pub mod commands;
mod config;

use cw_core::{ErrorClass, ServiceError};
use thiserror::Error;

pub use cli::{CategoryAction, Cli, Commands, ProjectAction};
pub use config::Config;

/// Malformed user input caught before any service call.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvalidInput(pub String);

/// Process exit code for a failed command.
///
/// Service errors map by class; rejected input counts as a bad request and
/// everything else is internal.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(service) = cause.downcast_ref::<ServiceError>() {
            return class_code(service.class());
        }
        if cause.is::<InvalidInput>() {
            return class_code(ErrorClass::BadRequest);
        }
    }
    class_code(ErrorClass::Internal)
}

const fn class_code(class: ErrorClass) -> u8 {
    match class {
        ErrorClass::Internal => 1,
        ErrorClass::BadRequest => 2,
        ErrorClass::Conflict => 3,
        ErrorClass::NotFound => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use cw_core::RepoError;

    fn code_for(err: ServiceError) -> u8 {
        let err = Err::<(), _>(err).context("failed").unwrap_err();
        exit_code(&err)
    }

    #[test]
    fn service_errors_map_to_class_codes() {
        assert_eq!(code_for(ServiceError::InvalidProjectName), 2);
        assert_eq!(code_for(ServiceError::NoActiveTimer), 3);
        assert_eq!(code_for(ServiceError::Repo(RepoError::Duplicate)), 1);
        assert_eq!(code_for(ServiceError::Repo(RepoError::NotFound)), 4);
        assert_eq!(code_for(ServiceError::Repo(RepoError::Cancelled)), 1);
    }

    #[test]
    fn invalid_input_is_a_bad_request() {
        let err = anyhow::Error::new(InvalidInput("bad range".to_string()));
        assert_eq!(exit_code(&err), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("disk on fire")), 1);
    }
}
