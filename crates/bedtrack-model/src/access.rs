// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

/// Caller identity as handed to the core by the boundary layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessScope {
    is_admin: bool,
    permissions: BTreeSet<String>,
}

impl AccessScope {
    #[must_use]
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            permissions: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_permissions<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(false, permissions)
    }

    #[must_use]
    pub fn new<I, S>(is_admin: bool, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_admin,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Deduplicated permissions in lexical order.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }
}
