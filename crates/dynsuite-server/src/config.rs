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

//! Configuration management for the DynamicSuite server

use dynsuite_core::{PathResolver, SiteSettings, Template};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Configuration for the DynamicSuite server
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// Installation root; packages live in `<root>/packages`
    pub root: PathBuf,

    /// URL prefix the application is served under, empty for the site root
    pub mount: String,

    /// Packages to load, in order. `None` discovers every installed package.
    pub packages: Option<Vec<String>>,

    /// Keep the registry between requests instead of rebuilding it per request
    pub cache_registry: bool,

    /// View unauthenticated visitors are redirected to
    pub authentication_view: String,

    /// View the mount root redirects to
    pub default_view: String,

    /// Page template; the built-in template is used when unset or unreadable
    pub template_path: Option<PathBuf>,

    pub site_title: String,

    pub meta_description: String,

    pub footer_text: String,

    pub footer_link: Option<String>,

    /// JWT secret key for sessions
    pub jwt_secret: String,

    /// Permission that passes every permission check
    pub administrator_permission: Option<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from `DYNSUITE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_address: string("DYNSUITE_BIND_ADDRESS", "0.0.0.0:8080"),

            root: optional("DYNSUITE_ROOT").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),

            mount: string("DYNSUITE_MOUNT", ""),

            packages: optional("DYNSUITE_PACKAGES").map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()),

            cache_registry: parse(lookup("DYNSUITE_CACHE_REGISTRY")).unwrap_or(true),

            authentication_view: string("DYNSUITE_AUTHENTICATION_VIEW", "/login"),

            default_view: string("DYNSUITE_DEFAULT_VIEW", "/dashboard"),

            template_path: optional("DYNSUITE_TEMPLATE").map(PathBuf::from),

            site_title: string("DYNSUITE_SITE_TITLE", "DynamicSuite"),

            meta_description: string("DYNSUITE_META_DESCRIPTION", ""),

            footer_text: string("DYNSUITE_FOOTER_TEXT", "DynamicSuite"),

            footer_link: optional("DYNSUITE_FOOTER_LINK"),

            jwt_secret: string("DYNSUITE_JWT_SECRET", "default-secret-change-in-production"),

            administrator_permission: optional("DYNSUITE_ADMINISTRATOR_PERMISSION"),

            request_timeout_secs: parse(lookup("DYNSUITE_REQUEST_TIMEOUT_SECS")).unwrap_or(30),

            max_body_size: parse(lookup("DYNSUITE_MAX_BODY_SIZE")).unwrap_or(10 * 1024 * 1024), // 10MB
        }
    }

    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(self.root.clone(), &self.mount)
    }

    pub fn site_settings(&self) -> SiteSettings {
        SiteSettings {
            title: self.site_title.clone(),
            meta_description: self.meta_description.clone(),
            authentication_view: self.authentication_view.clone(),
            default_view: self.default_view.clone(),
            footer_text: self.footer_text.clone(),
            footer_link: self.footer_link.clone(),
        }
    }

    /// The configured template, falling back to the built-in one
    pub fn template(&self) -> Template {
        let Some(path) = &self.template_path else {
            return Template::default();
        };
        match Template::load(path) {
            Ok(template) => template,
            Err(e) => {
                warn!("Failed to read template {}: {}; using the built-in template", path.display(), e);
                Template::default()
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}
