//! Scripts for deploying and administering the PledgePost and EASVerification contracts.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod deployments;
pub mod errors;
pub mod plan;
mod solidity;
pub mod utils;
