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

use clap::Parser;
use item_core::discovery::{
    CandidateState, ServerResolver, ServiceAddresses, TcpDiscoveryProbe,
};
use item_core::host::DEFAULT_PORT;
use item_core::CoreError;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Picks the fastest reachable core server that supports every required contract.
#[derive(Parser)]
#[command()]
struct DiscoverArgs {
    /// Semicolon-separated `host[:port]` list.
    #[arg(long)]
    candidates: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    default_port: u16,
    /// Contract the server must advertise; repeatable.
    #[arg(long = "require", value_name = "CONTRACT")]
    required: Vec<String>,
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
    #[arg(long, default_value = "core")]
    service: String,
}

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    let _ = tracing_subscriber::fmt::try_init();

    let args = DiscoverArgs::parse();
    let addresses = ServiceAddresses::parse(&args.service, &args.candidates, args.default_port)?;
    let probe = TcpDiscoveryProbe::new(Duration::from_millis(args.timeout_ms));
    let resolver = ServerResolver::new(Arc::new(probe));

    let resolution = resolver.resolve(&addresses, &args.required).await?;
    for (candidate, state) in &resolution.outcomes {
        match state {
            CandidateState::Scored { latency } => {
                info!(candidate = %candidate, latency = ?latency, "scored")
            }
            CandidateState::Rejected { reason } => {
                info!(candidate = %candidate, reason = reason.as_str(), "rejected")
            }
        }
    }
    println!("{}", resolution.address);

    Ok(())
}
