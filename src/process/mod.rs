mod env;
mod runner;

pub use env::EnvPolicy;
pub use runner::{exit_code_of, ProcessRunner, RunHandle, SpawnFailure};
