//! Logging setup
//!
//! The library only emits through the `log` facade. Applications embedding it
//! may install their own logger; `init` is a convenience that installs
//! `env_logger`, reading the filter from `RUST_LOG` and falling back to
//! `hostaudio=info`.

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "hostaudio=info";

/// Install `env_logger`. Later calls, or calls after another logger was
/// installed, are ignored.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or(DEFAULT_FILTER);
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::debug!("hostaudio logging initialized");
    }
}
