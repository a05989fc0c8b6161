//! HTTP surface of the AKS dashboard

pub mod api;
