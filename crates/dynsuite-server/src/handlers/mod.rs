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

//! Entry handlers linked into the server binary
//!
//! Every package a deployment installs has its API, view and init entries
//! registered here under the paths its manifest names.

pub mod builtin;

use dynsuite_core::{ConfigResult, HandlerCatalog, PathResolver};

/// The catalog for every package this binary ships
pub fn catalog(resolver: PathResolver) -> ConfigResult<HandlerCatalog> {
    let mut catalog = HandlerCatalog::new(resolver);
    builtin::register(&mut catalog)?;
    Ok(catalog)
}
