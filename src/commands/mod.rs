//! Subcommand implementations behind the `debrepo` binary.
//!
//! Each command resolves what it needs from the [`Config`](crate::config::Config),
//! talks to aptly through the runtime and prints its result to stdout.

mod codenames;
mod list;
mod promote;
mod publish;

pub use codenames::codenames;
pub use list::{ListFilter, list};
pub use promote::promote;
pub use publish::publish;
