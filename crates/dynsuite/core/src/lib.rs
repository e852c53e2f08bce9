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

//! DynamicSuite core
//!
//! Packages declare APIs, views, navigation and assets in a manifest. This
//! crate merges installed manifests into a [`PackageRegistry`], classifies
//! request paths against it, and runs the matched API or view entry behind
//! the session gate. It knows nothing about HTTP; the server crate adapts
//! [`Kernel::handle`] to a transport.

pub mod autoload;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod kernel;
pub mod manifest;
pub mod paths;
pub mod registry;
pub mod renderer;
pub mod response;
pub mod router;
pub mod session;
pub mod template;

pub use autoload::Autoloader;
pub use descriptor::{ApiDescriptor, NavGroupDescriptor, OverlayActionDescriptor, PackageDescriptor, ResourceKind, ViewDescriptor, ViewEntry};
pub use dispatcher::ApiDispatcher;
pub use error::{ConfigError, ConfigResult, DispatchError, DispatchResult};
pub use handler::{ApiContext, ApiHandler, HandlerCatalog, InitContext, InitHandler, ViewContext, ViewHandler, api_fn, init_fn, view_fn};
pub use kernel::{Kernel, Outcome};
pub use manifest::{DirectorySource, PackageSource, StaticSource};
pub use paths::PathResolver;
pub use registry::{PackageRegistry, SharedRegistry};
pub use renderer::{ClientData, SiteSettings, ViewOutcome, ViewRenderer};
pub use response::{Request, Response};
pub use router::{RequestRouter, Route};
pub use session::{Session, SessionGate, permits};
pub use template::{Document, Template};
