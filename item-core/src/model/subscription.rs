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

//! Subscription lifecycle state machine.

use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type SubscriptionId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    Created,
    Active,
    Extended,
    Cancelled,
    Expired,
}

impl SubscriptionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionState::Cancelled | SubscriptionState::Expired)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionState::Created => "created",
            SubscriptionState::Active => "active",
            SubscriptionState::Extended => "extended",
            SubscriptionState::Cancelled => "cancelled",
            SubscriptionState::Expired => "expired",
        }
    }
}

impl Display for SubscriptionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected lifecycle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionRejected {
    pub from: SubscriptionState,
}

/// State plus expiry. Terminal states never transition again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionLifecycle {
    state: SubscriptionState,
    expiry: DateTime<Utc>,
}

impl SubscriptionLifecycle {
    pub fn new(expiry: DateTime<Utc>) -> Self {
        Self {
            state: SubscriptionState::Created,
            expiry,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Whether matches may still be delivered at `now`.
    pub fn is_deliverable(&self, now: DateTime<Utc>) -> bool {
        !self.state.is_terminal() && self.expiry > now
    }

    pub fn activate(&mut self) -> Result<(), TransitionRejected> {
        match self.state {
            SubscriptionState::Created => {
                self.state = SubscriptionState::Active;
                Ok(())
            }
            SubscriptionState::Active | SubscriptionState::Extended => Ok(()),
            from => Err(TransitionRejected { from }),
        }
    }

    /// Pushes the expiry forward; an earlier `new_expiry` leaves it unchanged.
    ///
    /// An elapsed expiry moves to `Expired` first and is rejected.
    pub fn extend(
        &mut self,
        new_expiry: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRejected> {
        self.expire(now);
        if self.state.is_terminal() {
            return Err(TransitionRejected { from: self.state });
        }
        self.expiry = self.expiry.max(new_expiry);
        self.state = SubscriptionState::Extended;
        Ok(())
    }

    /// Returns true only on the transition into `Cancelled`.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = SubscriptionState::Cancelled;
        true
    }

    /// Returns true only on the transition into `Expired`.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.state.is_terminal() || self.expiry > now {
            return false;
        }
        self.state = SubscriptionState::Expired;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{SubscriptionLifecycle, SubscriptionState};
    use chrono::{Duration, Utc};

    #[test]
    fn created_activates_then_extends() {
        let now = Utc::now();
        let mut lifecycle = SubscriptionLifecycle::new(now + Duration::minutes(1));
        assert_eq!(lifecycle.state(), SubscriptionState::Created);

        lifecycle.activate().unwrap();
        assert_eq!(lifecycle.state(), SubscriptionState::Active);

        lifecycle.extend(now + Duration::minutes(5), now).unwrap();
        lifecycle.extend(now + Duration::minutes(9), now).unwrap();
        assert_eq!(lifecycle.state(), SubscriptionState::Extended);
        assert_eq!(lifecycle.expiry(), now + Duration::minutes(9));
    }

    #[test]
    fn extend_never_shortens_expiry() {
        let now = Utc::now();
        let mut lifecycle = SubscriptionLifecycle::new(now + Duration::minutes(10));
        lifecycle.activate().unwrap();

        lifecycle.extend(now + Duration::minutes(2), now).unwrap();

        assert_eq!(lifecycle.expiry(), now + Duration::minutes(10));
        assert_eq!(lifecycle.state(), SubscriptionState::Extended);
    }

    #[test]
    fn extend_after_elapsed_expiry_is_rejected() {
        let now = Utc::now();
        let mut lifecycle = SubscriptionLifecycle::new(now - Duration::seconds(1));
        lifecycle.activate().unwrap();

        let rejected = lifecycle.extend(now + Duration::minutes(5), now).unwrap_err();
        assert_eq!(rejected.from, SubscriptionState::Expired);
        assert_eq!(lifecycle.state(), SubscriptionState::Expired);
    }

    #[test]
    fn terminal_states_do_not_transition() {
        let now = Utc::now();
        let mut lifecycle = SubscriptionLifecycle::new(now + Duration::minutes(1));
        assert!(lifecycle.cancel());
        assert!(!lifecycle.cancel());
        assert!(!lifecycle.expire(now + Duration::minutes(2)));
        assert!(lifecycle.activate().is_err());
        assert!(lifecycle.extend(now + Duration::minutes(3), now).is_err());
        assert_eq!(lifecycle.state(), SubscriptionState::Cancelled);
    }

    #[test]
    fn deliverable_only_before_expiry() {
        let now = Utc::now();
        let lifecycle = SubscriptionLifecycle::new(now + Duration::seconds(10));

        assert!(lifecycle.is_deliverable(now));
        assert!(!lifecycle.is_deliverable(now + Duration::seconds(10)));
    }
}
