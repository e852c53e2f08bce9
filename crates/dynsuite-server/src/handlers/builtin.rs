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

//! Handlers for the `dynamicsuite` package shipped with the server

use dynsuite_core::template::escape_html;
use dynsuite_core::{ConfigResult, HandlerCatalog, Response, api_fn, view_fn};
use serde_json::{Value, json};

pub const PACKAGE_ID: &str = "dynamicsuite";

pub fn register(catalog: &mut HandlerCatalog) -> ConfigResult<()> {
    catalog
        .register_api(PACKAGE_ID, "apis/ping", api_fn(|_ctx| Ok(Response::new("OK", "pong", Value::Null).into())))?
        .register_api(
            PACKAGE_ID,
            "apis/session",
            api_fn(|ctx| {
                Ok(Response::new("OK", "Session", json!({"active": ctx.session.is_active()})).into())
            }),
        )?
        .register_view(
            PACKAGE_ID,
            "views/dashboard",
            view_fn(|ctx| {
                let title = ctx.view.title().unwrap_or("Dashboard");
                ctx.write(&format!(r#"<section class="ds-dashboard"><h1>{}</h1></section>"#, escape_html(title)));
                Ok(())
            }),
        )?;
    Ok(())
}
