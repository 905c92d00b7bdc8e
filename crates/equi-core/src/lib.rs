//! Core types and engines for Equi event registration.
//!
//! Three engines live here, all pure and synchronous over roster snapshots:
//! gender-clustered seat allocation ([`seating`]), face duplicate matching
//! ([`matcher`]) and skill-based role assignment with gender rebalancing
//! ([`balancer`]). The [`registration`] flow ties seating and matching to an
//! [`store::EventStore`] backend, and [`roster`] covers hall resizing and
//! bulk edits. No HTTP or database code lives here.

// Native `async fn`-shaped trait methods; the futures carry explicit `Send`
// bounds where it matters.
#![allow(async_fn_in_trait)]

pub mod balancer;
pub mod error;
pub mod event;
pub mod face;
pub mod grouping;
pub mod matcher;
pub mod participant;
pub mod registration;
pub mod roster;
pub mod seating;
pub mod store;
pub mod team;

pub use error::{Error, Result};
