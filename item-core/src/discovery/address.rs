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

use crate::error::CoreError;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceAddress {
    pub host: String,
    pub port: u16,
}

impl ServiceAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Ordered candidates for one logical service name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceAddresses {
    pub name: String,
    pub candidates: Vec<ServiceAddress>,
}

impl ServiceAddresses {
    pub fn new(name: impl Into<String>, candidates: Vec<ServiceAddress>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    /// Parses `host[:port]` entries separated by semicolons.
    pub fn parse(name: &str, candidates: &str, default_port: u16) -> Result<Self, CoreError> {
        let candidates = candidates
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() => port
                    .parse::<u16>()
                    .map(|port| ServiceAddress::new(host, port))
                    .map_err(|_| {
                        CoreError::Configuration(format!("invalid port in candidate '{entry}'"))
                    }),
                Some(_) => Err(CoreError::Configuration(format!(
                    "missing host in candidate '{entry}'"
                ))),
                None => Ok(ServiceAddress::new(entry, default_port)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if candidates.is_empty() {
            return Err(CoreError::Configuration(format!(
                "no candidate addresses for service '{name}'"
            )));
        }
        Ok(Self::new(name, candidates))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ServiceAddress, ServiceAddresses};

    #[test]
    fn entries_keep_order_and_default_port() {
        let addresses = ServiceAddresses::parse("core", "alpha; beta:9500 ;;gamma", 9400).unwrap();

        assert_eq!(
            addresses.candidates,
            vec![
                ServiceAddress::new("alpha", 9400),
                ServiceAddress::new("beta", 9500),
                ServiceAddress::new("gamma", 9400),
            ]
        );
    }

    #[test]
    fn malformed_candidates_are_rejected() {
        assert!(ServiceAddresses::parse("core", "", 9400).is_err());
        assert!(ServiceAddresses::parse("core", "alpha:http", 9400).is_err());
        assert!(ServiceAddresses::parse("core", ":9400", 9400).is_err());
    }
}
