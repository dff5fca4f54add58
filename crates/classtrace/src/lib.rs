pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

/// Install the stderr log subscriber for the given `-v` count.
pub fn init(verbosity: u8) {
    infra::logging::init(verbosity);
}
