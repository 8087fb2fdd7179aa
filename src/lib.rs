//! # certsign - issue leaf certificates from CSRs
//!
//! certsign signs X.509 certificate signing requests with an issuer
//! identity whose private key is either a PKCS#8 file on disk or a key held
//! in AWS KMS and addressed by ARN. Cryptography is pure Rust via the
//! RustCrypto crates; remote keys only ever sign pre-computed digests, so
//! private key material never leaves the KMS.
//!
//! ## Supported algorithms
//!
//! - **RSA** with PKCS#1 v1.5 padding
//! - **ECDSA** over P-256 and P-384
//!
//! each paired with SHA-256, SHA-384 or SHA-512.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use certsign::pipeline::{self, SignRequest};
//!
//! # fn main() -> Result<(), certsign::error::Error> {
//! let csr = std::fs::read("leaf.csr").unwrap();
//!
//! let request = SignRequest::builder()
//!     .csr(&csr)
//!     .issuer_certificate(Path::new("issuer.crt"))
//!     .issuer_key("arn:aws:kms:us-east-1:123456789012:key/deadbeef")
//!     .bundle(true)
//!     .build();
//!
//! let pem_chain = pipeline::sign_csr(request)?;
//! println!("{pem_chain}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Module organization
//!
//! - [`csr`]: request parsing and proof-of-possession
//! - [`identity`]: issuer certificate and key loading
//! - [`key`]: key classification and the digest-level signing capability
//! - [`kms`]: the remote key service boundary, resolver and AWS backend
//! - [`profile`]: the leaf certificate profile
//! - [`pipeline`]: the end-to-end issuance flow
//! - [`secrets`]: key password retrieval from a secret store

pub mod cert;
pub mod csr;
pub mod error;
pub mod identity;
pub mod key;
pub mod kms;
pub mod pem_utils;
pub mod pipeline;
pub mod profile;
pub mod secrets;
pub mod tbs_certificate;
