//! # Storage Adapter Interfaces & Providers
//!
//! Defines the six outbound ports the rest of the Oracle depends on
//! ([`ports`]) plus the wire/persistence shapes they move ([`model`]),
//! a file-backed [`local::LocalProvider`] that satisfies all six
//! end-to-end without network access, and a cloud-agnostic
//! [`cloud::CloudProvider`] built over `object_store` for AWS, GCP, and
//! Oracle Cloud's S3-compatible endpoint.
//!
//! Every adapter is fail-closed: persistence errors are always surfaced
//! as [`mirror_types::error::AdapterFault`], never swallowed.

pub mod model;
pub mod ports;
pub mod provider;

#[cfg(feature = "local")]
pub mod local;

#[cfg(any(feature = "aws", feature = "gcp", feature = "oracle"))]
pub mod cloud;

pub use provider::Provider;
