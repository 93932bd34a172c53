// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sam-bus: call, reply, and subscription plumbing to the RPC bus.
//!
//! Everything above the wire format lives here: the [`BusClient`] trait the
//! engine talks to, call-token bookkeeping, the subscription registry, and
//! the line-delimited JSON socket transport the daemon binary uses.

mod client;
mod socket;
mod subscription;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use client::{BusClient, BusError, InboundRequest};
pub use socket::SocketBus;
pub use subscription::SubscriptionRegistry;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeBus;
