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

//! Query definitions, their compiled filter form and select ordering/paging.

use crate::error::CoreError;
use crate::model::item::{Item, ItemKind, Usn};
use crate::model::query_expr::QueryExpr;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

/// Filter over items, shared by one-shot selects and subscriptions.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryDefinition {
    /// `Undefined` means any kind.
    pub kind: ItemKind,
    pub data_type: Option<String>,
    pub app_scopes: Vec<String>,
    pub item_names: Vec<String>,
    pub query_expr: Option<String>,
    pub minimum_usn: Usn,
    pub exclude_deleted: bool,
    /// Reference time for deletion visibility; `None` evaluates at "now".
    pub as_at_time: Option<DateTime<Utc>>,
    pub exclude_existing: bool,
    pub wait_for_existing: bool,
    pub exclude_data_body: bool,
}

impl Default for QueryDefinition {
    fn default() -> Self {
        Self {
            kind: ItemKind::Undefined,
            data_type: None,
            app_scopes: Vec::new(),
            item_names: Vec::new(),
            query_expr: None,
            minimum_usn: 0,
            exclude_deleted: true,
            as_at_time: None,
            exclude_existing: false,
            wait_for_existing: true,
            exclude_data_body: false,
        }
    }
}

impl QueryDefinition {
    /// Parses the free-form expression once so matching never re-parses.
    pub fn compile(&self) -> Result<QueryFilter, CoreError> {
        let expr = match self.query_expr.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Some(text.parse::<QueryExpr>()?),
            _ => None,
        };
        Ok(QueryFilter {
            definition: self.clone(),
            expr,
        })
    }
}

/// Compiled, immutable form of a [`QueryDefinition`].
#[derive(Clone, Debug)]
pub struct QueryFilter {
    definition: QueryDefinition,
    expr: Option<QueryExpr>,
}

impl QueryFilter {
    pub fn definition(&self) -> &QueryDefinition {
        &self.definition
    }

    /// Deletion visibility as of the query's reference time (or `now`).
    pub fn is_visible(&self, item: &Item, now: DateTime<Utc>) -> bool {
        !self.definition.exclude_deleted
            || !item.is_expired(self.definition.as_at_time.unwrap_or(now))
    }

    pub fn matches(&self, item: &Item, now: DateTime<Utc>) -> bool {
        let def = &self.definition;

        if def.kind != ItemKind::Undefined && def.kind != item.kind {
            return false;
        }
        if let Some(data_type) = def.data_type.as_deref() {
            if !data_type.is_empty() && data_type != item.data_type {
                return false;
            }
        }
        if !def.app_scopes.is_empty() && !def.app_scopes.iter().any(|s| *s == item.app_scope) {
            return false;
        }
        if !def.item_names.is_empty() || self.expr.is_some() {
            let named = def.item_names.iter().any(|name| *name == item.name);
            let expressed = self.expr.as_ref().is_some_and(|expr| expr.matches(item));
            if !named && !expressed {
                return false;
            }
        }
        item.store_usn >= def.minimum_usn && self.is_visible(item, now)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderField {
    Usn,
    Name,
    Created,
}

/// Parsed `OrderExpr`: `usn|name|created` with optional `asc|desc`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for OrderBy {
    fn default() -> Self {
        Self {
            field: OrderField::Usn,
            descending: false,
        }
    }
}

impl OrderBy {
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let ordering = match self.field {
            OrderField::Usn => a.store_usn.cmp(&b.store_usn),
            OrderField::Name => a
                .name
                .cmp(&b.name)
                .then(a.store_usn.cmp(&b.store_usn)),
            OrderField::Created => a
                .created
                .cmp(&b.created)
                .then(a.store_usn.cmp(&b.store_usn)),
        };
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

impl FromStr for OrderBy {
    type Err = CoreError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split_whitespace();
        let field = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("usn") | Some("storeusn") => OrderField::Usn,
            Some("name") | Some("itemname") => OrderField::Name,
            Some("created") => OrderField::Created,
            other => {
                return Err(CoreError::InvalidQuery(format!(
                    "unsupported order field {other:?}"
                )))
            }
        };
        let descending = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => false,
            Some("desc") => true,
            Some(other) => {
                return Err(CoreError::InvalidQuery(format!(
                    "unsupported order direction {other}"
                )))
            }
        };
        if parts.next().is_some() {
            return Err(CoreError::InvalidQuery(format!(
                "trailing tokens in order expression '{input}'"
            )));
        }
        Ok(Self { field, descending })
    }
}

/// One-shot selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectRequest {
    pub query: QueryDefinition,
    pub item_ids: Option<Vec<Uuid>>,
    pub order_expr: Option<String>,
    pub start_row: u32,
    /// Zero disables paging.
    pub row_count: u32,
}

impl SelectRequest {
    pub fn order_by(&self) -> Result<OrderBy, CoreError> {
        match self.order_expr.as_deref().map(str::trim) {
            Some(expr) if !expr.is_empty() => expr.parse(),
            _ => Ok(OrderBy::default()),
        }
    }
}
