// Dotlanth
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

//! Error types for the autotune service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutoTuneError {
    #[error("Invalid autotune mode: {0}")]
    InvalidMode(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AutoTuneResult<T> = Result<T, AutoTuneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AutoTuneError::InvalidMode("DEFAULT_SOMETIMES".to_string());
        assert_eq!(err.to_string(), "Invalid autotune mode: DEFAULT_SOMETIMES");

        let err = AutoTuneError::InvalidConfiguration("rate out of range".to_string());
        assert!(err.to_string().contains("rate out of range"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AutoTuneError = parse.unwrap_err().into();
        assert!(matches!(err, AutoTuneError::Serialization(_)));
    }
}
