//! branchsync core library: domain types, naming convention, configuration,
//! and the gateway traits the reconciler talks to.
//!
//! - [`types`]: newtypes for branch, job and view names
//! - [`naming`]: [`NamingConvention`]
//! - [`config`]: config file loading and [`Settings`] resolution
//! - [`gateway`]: [`RepositoryGateway`] / [`CiGateway`] traits
//! - [`error`]: [`ConfigError`], [`GatewayError`]

pub mod config;
pub mod error;
pub mod gateway;
pub mod naming;
pub mod types;

pub use config::{ConfigFile, Overrides, Settings};
pub use error::{ConfigError, GatewayError};
pub use gateway::{parse_ls_remote_heads, CiGateway, RepositoryGateway};
pub use naming::NamingConvention;
pub use types::{BranchName, Descriptor, JobName, ViewHandle, ViewName};
