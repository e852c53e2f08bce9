// DynamicSuite
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error taxonomy for package loading and request dispatch

use thiserror::Error;

/// Errors raised while turning package manifests into descriptors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Empty package id")]
    EmptyPackageId,

    #[error("Invalid package id '{package_id}': must not contain path separators")]
    InvalidPackageId { package_id: String },

    #[error("Empty path for package '{package_id}'")]
    EmptyPath { package_id: String },

    #[error("{package_id}: manifest must be an object")]
    NotAnObject { package_id: String },

    #[error("{package_id}: missing required field '{field}'")]
    MissingField { package_id: String, field: String },

    #[error("{package_id}: field '{field}' must be {expected}")]
    WrongType {
        package_id: String,
        field: String,
        expected: &'static str,
    },

    #[error("{package_id}: field '{field}' entry {key} must be a string")]
    NonStringEntry { package_id: String, field: String, key: String },

    #[error("{package_id}: view path '{view_id}' must start with '/'")]
    InvalidViewPath { package_id: String, view_id: String },

    #[error("Duplicate package id '{package_id}'")]
    DuplicatePackage { package_id: String },

    #[error("Failed to read manifest {path}: {message}")]
    Manifest { path: String, message: String },

    #[error("Router error: {0}")]
    Route(String),
}

impl From<matchit::InsertError> for ConfigError {
    fn from(err: matchit::InsertError) -> Self {
        ConfigError::Route(err.to_string())
    }
}

/// Result type for descriptor construction and registry assembly
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures inside the API dispatcher and view renderer.
///
/// None of these reach the client verbatim; the dispatch boundary logs them
/// and answers with an opaque response.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("API not found: {package_id}:{api_id}")]
    ApiNotFound { package_id: String, api_id: String },

    #[error("Missing required post key '{key}' for {package_id}:{api_id}")]
    MissingPostKey {
        package_id: String,
        api_id: String,
        key: String,
    },

    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    #[error("No handler registered for {0}")]
    EntryNotFound(String),

    #[error("Execution failed in {entry}: {message}")]
    Execution { entry: String, message: String },

    #[error("Bad output from {entry}: {message}")]
    BadOutput { entry: String, message: String },
}

impl DispatchError {
    /// Short identifier used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::ApiNotFound { .. } => "not_found",
            DispatchError::MissingPostKey { .. } => "validation",
            DispatchError::PermissionDenied(_) => "permission",
            DispatchError::EntryNotFound(_) => "not_found",
            DispatchError::Execution { .. } => "execution",
            DispatchError::BadOutput { .. } => "output_contract",
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
