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

//! Session and permission gate consulted by both dispatch paths

use std::collections::HashSet;

/// Answers whether the caller may use a resource.
///
/// Implementations must not explain a refusal; callers turn a `false` into an
/// opaque response.
#[cfg_attr(test, mockall::automock)]
pub trait SessionGate: Send + Sync {
    /// Whether the caller holds a valid session
    fn is_active(&self) -> bool;

    /// Whether an active session holds every listed permission
    fn check_permissions(&self, permissions: &[String]) -> bool;
}

/// Public resources bypass the gate, everything else must pass it
pub fn permits(gate: &dyn SessionGate, public: bool, permissions: &[String]) -> bool {
    public || gate.check_permissions(permissions)
}

/// The caller's session as established by the transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
    permissions: HashSet<String>,
    administrator_permission: Option<String>,
}

impl Session {
    /// No session; only public resources are reachable
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated<I, S>(user_id: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: Some(user_id.into()),
            permissions: permissions.into_iter().map(Into::into).collect(),
            administrator_permission: None,
        }
    }

    /// Holders of `permission` pass every permission check
    pub fn with_administrator_permission(mut self, permission: impl Into<String>) -> Self {
        self.administrator_permission = Some(permission.into());
        self
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    fn is_administrator(&self) -> bool {
        self.administrator_permission.as_deref().is_some_and(|p| self.permissions.contains(p))
    }
}

impl SessionGate for Session {
    fn is_active(&self) -> bool {
        self.user_id.is_some()
    }

    fn check_permissions(&self, permissions: &[String]) -> bool {
        if !self.is_active() {
            return false;
        }
        self.is_administrator() || permissions.iter().all(|p| self.permissions.contains(p))
    }
}
