/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;

use crate::config::Config;
use clap::Parser;
use item_core::host::{InMemoryQueueBroker, ServiceHost};
use item_core::store::ItemStore;
use item_core::{CoreError, CoreService};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command()]
struct ServerArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    let _ = tracing_subscriber::fmt::try_init();

    info!("Started core-server");

    let args = ServerArgs::parse();
    let config = Config::load(&args.config)?;
    let engine_config = config.engine.to_engine_config();

    let store = Arc::new(ItemStore::new(engine_config.write_queue_size));
    let service = Arc::new(CoreService::new(
        config.server.app_name.clone(),
        store,
        &engine_config,
    )?);
    let host = ServiceHost::new(config.server, service, Arc::new(InMemoryQueueBroker::new()))?;
    host.open().await?;

    match host.resolve_reachable_addresses(None).await {
        Ok(addresses) => info!(addresses = ?addresses, "core-server listening"),
        Err(err) => warn!(err = %err, "core-server listening; reachable addresses unknown"),
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down core-server");
    host.close().await;

    Ok(())
}
