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
use std::str::FromStr;

/// Transport scheme of one endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Tcp,
    Queue,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Tcp => "tcp",
            Scheme::Queue => "queue",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "tcp" => Ok(Scheme::Tcp),
            "queue" => Ok(Scheme::Queue),
            other => Err(CoreError::Configuration(format!(
                "unknown endpoint scheme '{other}'"
            ))),
        }
    }
}

///
/// [`EndpointSpec`] is one parsed entry of a host's endpoint string.
///
/// # Examples
///
/// ```
/// use item_core::host::{parse_endpoints, Scheme};
///
/// let endpoints = parse_endpoints("tcp://0.0.0.0:9400; http:8080 ;queue", 9000).unwrap();
///
/// assert_eq!(endpoints.len(), 3);
/// assert_eq!(endpoints[0].port, 9400);
/// assert_eq!(endpoints[1].scheme, Scheme::Http);
/// assert_eq!(endpoints[1].port, 8080);
/// assert_eq!(endpoints[2].port, 9000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointSpec {
    pub scheme: Scheme,
    /// `None` binds every interface.
    pub host: Option<String>,
    pub port: u16,
    pub path: Option<String>,
}

impl EndpointSpec {
    pub fn bind_host(&self) -> &str {
        self.host.as_deref().unwrap_or("0.0.0.0")
    }

    /// Path an HTTP endpoint serves under: its own, else the interface name.
    pub fn http_mount<'a>(&'a self, interface_name: &'a str) -> &'a str {
        self.path
            .as_deref()
            .map(|path| path.trim_matches('/'))
            .filter(|path| !path.is_empty())
            .unwrap_or(interface_name)
    }
}

impl fmt::Display for EndpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.bind_host(), self.port)?;
        if let Some(path) = &self.path {
            write!(f, "/{path}")?;
        }
        Ok(())
    }
}

/// One opened endpoint as seen from outside the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointData {
    pub spec: EndpointSpec,
    /// Port actually bound; differs from `spec.port` when that was 0.
    pub bound_port: u16,
    pub queue_name: Option<String>,
}

fn parse_port(text: &str, entry: &str) -> Result<u16, CoreError> {
    text.parse::<u16>().map_err(|_| {
        CoreError::Configuration(format!("invalid port '{text}' in endpoint '{entry}'"))
    })
}

fn parse_entry(entry: &str, default_port: u16) -> Result<EndpointSpec, CoreError> {
    if let Some((scheme, rest)) = entry.split_once("://") {
        let scheme = scheme.parse::<Scheme>()?;
        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) if !path.is_empty() => (authority, Some(path.to_string())),
            Some((authority, _)) => (authority, None),
            None => (rest, None),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, parse_port(port, entry)?),
            None => (authority, default_port),
        };
        let host = match host.trim() {
            "" | "*" | "+" => None,
            host => Some(host.to_string()),
        };
        return Ok(EndpointSpec {
            scheme,
            host,
            port,
            path,
        });
    }

    let (scheme, port) = match entry.split_once(':') {
        Some((scheme, port)) => (scheme, parse_port(port.trim(), entry)?),
        None => (entry, default_port),
    };
    Ok(EndpointSpec {
        scheme: scheme.parse()?,
        host: None,
        port,
        path: None,
    })
}

/// Parses a semicolon-separated endpoint list. Blank entries are ignored; an empty
/// list is a configuration error.
pub fn parse_endpoints(config: &str, default_port: u16) -> Result<Vec<EndpointSpec>, CoreError> {
    let endpoints = config
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_entry(entry, default_port))
        .collect::<Result<Vec<_>, _>>()?;

    if endpoints.is_empty() {
        return Err(CoreError::Configuration(
            "no endpoints configured".to_string(),
        ));
    }
    Ok(endpoints)
}

/// Durable queue name for one queue endpoint of a host.
pub fn queue_name(app_name: &str, port: u16, interface_name: &str) -> String {
    format!("{app_name}.{port}.{interface_name}")
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
