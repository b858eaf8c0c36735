//! Payroll Engine
//!
//! This crate provides the payroll core of a multi-tenant HRMS: versioned
//! salary structures, a deterministic payslip calculator, and payroll runs
//! that persist every payslip of a batch or none of them, with an audit
//! trail for each change.

#![warn(missing_docs)]

pub mod api;
pub mod audit;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod payroll;
pub mod store;
