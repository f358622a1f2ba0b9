// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 The tagmod Authors

//! Error types for the module engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while resolving or requiring modules
#[derive(Debug, Error)]
pub enum EngineError {
    /// The host exposes no way to identify the executing script
    #[error("Unsupported host: {0}")]
    UnsupportedHost(String),

    /// An absolute path was passed to require()
    #[error("Absolute paths are not supported by require. Use relative path or module name.")]
    UnsupportedPath(String),

    /// The resolved URL or logical name has no registered module
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// A script element for this URL exists but its module never registered
    #[error("Module '{0}' is declared by the document but has not been registered yet")]
    ModuleNotReady(String),

    /// Host-native URL resolution error, passed through unmodified
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Type error (wrong kind of value)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

impl EngineError {
    /// Create an UnsupportedHost error
    pub fn unsupported_host(msg: impl Into<String>) -> Self {
        Self::UnsupportedHost(msg.into())
    }

    /// Create a TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a module not found error
    pub fn module_not_found(id: impl Into<String>) -> Self {
        Self::ModuleNotFound(id.into())
    }
}
