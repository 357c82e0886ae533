//! Windows backend: MMDevice enumeration, default-device notifications and
//! per-role default switching through the policy-config interface.
//!
//! Every COM object here is created and used on the calling thread, which
//! joins the multithreaded apartment on first use.

#![allow(unsafe_code)]

mod backend;
mod com;
mod notification;
mod policy_config;

pub use backend::WasapiBackend;
