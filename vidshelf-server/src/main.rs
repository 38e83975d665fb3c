/* This file is part of the vidshelf project
*
*  Copyright (C) 2025 vidshelf contributors
*
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
use std::{fs::{set_permissions, File, Permissions}, io::{self, Read, Write}, os::unix::prelude::PermissionsExt, sync::Arc, time::Duration};
use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use cloneable_errors::{bail, ErrorContext, ResContext};
use env_logger::Env;
use log::{info, warn};
use reqwest::Client;
use vidshelf_core::{ItemStore, JsonFileStore, MemoryStore};
use vidshelf_resolver::MetadataResolver;

mod errors;
mod routes;
mod state;
use state::*;

const CONFIG_PATH: &str = "config.toml";

fn load_config() -> Result<AppConfig, ErrorContext> {
    match File::open(CONFIG_PATH) {
        Ok(mut file) => {
            let mut contents = String::new();
            file.read_to_string(&mut contents).with_context(|| format!("Failed to read {CONFIG_PATH}"))?;
            let cfg: AppConfig = toml::from_str(&contents).with_context(|| format!("Failed to deserialize contents of {CONFIG_PATH}"))?;
            if cfg.listen.tcp.is_none() && cfg.listen.unix.is_none() {
                bail!("Invalid configuration - no tcp port or unix socket path specified");
            }
            Ok(cfg)
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let cfg = AppConfig::default();
            let serialized = toml::to_string(&cfg).context("Failed to serialize default AppConfig as TOML")?;
            let mut file = File::options().write(true).create_new(true).open(CONFIG_PATH).with_context(|| format!("Failed to create {CONFIG_PATH}"))?;
            write!(file, "{serialized}").with_context(|| format!("Failed to write serialized default AppConfig to {CONFIG_PATH}"))?;
            Ok(cfg)
        },
        Err(e) => Err(e).with_context(|| format!("Failed to open {CONFIG_PATH}")),
    }
}

fn build_client(config: &AppConfig) -> Result<Client, ErrorContext> {
    Client::builder()
        .timeout(Duration::from_secs_f64(config.reqwest_timeout_secs))
        .user_agent(config.user_agent.as_str())
        .build()
        .context("Failed to build the HTTP client")
}

#[actix_web::main]
async fn main() -> Result<(), ErrorContext> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config: web::Data<AppConfig> = web::Data::new(load_config()?);

    let store: Arc<dyn ItemStore> = match config.data_path {
        Some(ref path) => {
            let store = JsonFileStore::new(path);
            info!("Storing items in {}", store.path().display());
            Arc::new(store)
        },
        None => {
            warn!("No data_path configured, items will be lost on shutdown");
            Arc::new(MemoryStore::new())
        },
    };
    let library: LibraryLock = web::Data::new(LibraryState::load(store, config.seed_samples_on_first_run)?);
    let resolver = Arc::new(MetadataResolver::new(build_client(&config)?));
    let scheduler: SchedulerData = web::Data::new(PassScheduler::new(resolver.clone(), library.clone()));
    let resolver: ResolverData = web::Data::from(resolver);

    if config.resolve_on_startup {
        scheduler.restart_logged();
    }

    let mut server = {
        let config = config.clone();
        HttpServer::new(move || {
            App::new()
                .wrap(NormalizePath::trim())
                .app_data(config.clone())
                .app_data(library.clone())
                .app_data(resolver.clone())
                .app_data(scheduler.clone())
                .service(web::scope("/api")
                    .configure(routes::configure)
                )
        })
    };
    if let Some((ref ip, port)) = config.listen.tcp {
        let ip_str = ip.as_str();
        server = server.bind((ip_str, port)).with_context(|| format!("Failed to bind to tcp port {ip_str}:{port}"))?;
        info!("Listening on {ip_str}:{port}");
    }
    if let Some(ref path) = config.listen.unix {
        let path_str = path.as_str();
        server = server.bind_uds(path_str).with_context(|| format!("Failed to bind to unix socket {path_str}"))?;
        if let Some(mode) = config.listen.unix_mode {
            let perms = Permissions::from_mode(mode);
            set_permissions(path_str, perms).with_context(|| format!("Failed to change mode of unix socket {path_str} to {mode}"))?;
        }
        info!("Listening on {path_str}");
    }
    server.run()
    .await
    .context("Error while running the server")
}
