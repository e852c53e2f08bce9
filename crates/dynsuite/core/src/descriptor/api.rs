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

use super::BuildContext;
use crate::error::ConfigResult;
use crate::manifest::Fields;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A POST-invoked backend operation declared by a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDescriptor {
    api_id: String,
    package_id: String,
    entry: PathBuf,
    post: Vec<String>,
    permissions: Vec<String>,
    public: bool,
    autoload: Vec<PathBuf>,
    init: Vec<PathBuf>,
}

impl ApiDescriptor {
    pub(crate) fn from_manifest(ctx: &BuildContext<'_>, api_id: &str, raw: &Value) -> ConfigResult<Self> {
        let fields = Fields::new(ctx.package_id, raw)?;
        let entry = fields.required_string("entry")?;

        Ok(Self {
            api_id: api_id.to_string(),
            package_id: ctx.package_id.to_string(),
            entry: ctx.resolver.format_server_path(ctx.package_id, &entry)?,
            post: fields.string_list("post")?,
            permissions: fields.string_list("permissions")?,
            public: fields.bool_or("public", false)?,
            autoload: ctx.server_paths(fields.string_list("autoload")?)?,
            init: ctx.server_paths(fields.string_list("init")?)?,
        })
    }

    pub fn api_id(&self) -> &str {
        &self.api_id
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    /// `package_id:api_id`
    pub fn key(&self) -> String {
        format!("{}:{}", self.package_id, self.api_id)
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    /// Request data keys that must be present
    pub fn post(&self) -> &[String] {
        &self.post
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn autoload(&self) -> &[PathBuf] {
        &self.autoload
    }

    pub fn init(&self) -> &[PathBuf] {
        &self.init
    }
}
