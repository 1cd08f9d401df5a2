/*
 * The application layer. `TokenCountRunner` wires discovery, the worker pool and
 * the reporter together for one invocation of the command.
 */
pub mod runner;

pub use runner::{TokenCountRunner, write_total};
