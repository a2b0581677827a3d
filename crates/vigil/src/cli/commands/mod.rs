//! CLI commands

mod init;
mod plan;
mod validate;

pub use init::InitCommand;
pub use plan::PlanCommand;
pub use validate::ValidateCommand;
