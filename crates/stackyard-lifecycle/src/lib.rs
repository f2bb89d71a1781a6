//! # stackyard-lifecycle
//!
//! Lifecycle driver for compose-based environments.
//!
//! Wraps the external container-orchestration CLI to bring environments
//! up and down, enumerate missing images, stream pull progress line by
//! line, and poll for service readiness with HTTP probes against
//! published host ports.

pub mod driver;
pub mod probe;
pub mod runner;
pub mod stream;

pub use driver::{ContainerSummary, ImageReport, LifecycleDriver, ReadyReport};
pub use runner::{CliOutput, ContainerCli, DockerCompose, ImageInspector};
pub use stream::PullStream;
