//! Entity generators for fixture data.
//!
//! This module provides generators for the entities the fixture loader seeds:
//! - [`UserGenerator`]: Generate user accounts with demographics
//! - [`CategoryGenerator`]: Create catalog categories
//! - [`ProductGenerator`]: Create products with prices, stock and images
//!
//! Generators draw everything from the RNG they are given, so a seeded RNG
//! reproduces the same entities.

pub mod category;
pub mod product;
pub mod user;

pub use category::{CategoryGenerator, CategoryRef, GeneratedCategory};
pub use product::{GeneratedProduct, ProductGenConfig, ProductGenerator};
pub use user::{GeneratedUser, UserGenConfig, UserGenerator};
