// gaitkit Testdata - Synthetic walking bouts
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # gaitkit Testdata
//!
//! Deterministic synthetic walking bouts for tests and benchmarks.
//!
//! A bout is a sequence of alternating-foot gait events (initial contact,
//! final contact, opposite-foot final contact, centre of mass height
//! change) together with a tri-axial lumbar acceleration trace whose
//! vertical component repeats once per step and whose medio-lateral
//! component repeats once per stride.
//!
//! ## Quick Start
//!
//! ```rust
//! use gaitkit_testdata::{generate_bout, WalkerConfig};
//!
//! let config = WalkerConfig::new()
//!     .with_strides(12)
//!     .with_stride_time(1.0)
//!     .with_seed(42);
//!
//! let bout = generate_bout(&config);
//! assert_eq!(bout.len(), 24);
//! assert!(bout.accel.len() > *bout.ic.last().unwrap());
//! ```
//!
//! The crate does not depend on `gaitkit`; bouts are plain columns that
//! map one-to-one onto its event table.

pub mod bout;
pub mod generator;

pub use bout::{BoutError, SyntheticBout};
pub use generator::{generate_bout, generate_session, WalkerConfig};
