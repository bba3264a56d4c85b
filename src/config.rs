//! Support for library configuration options

use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

/// Prefix the server puts in front of role names in the authorities it reports (e.g. `ROLE_ADMIN`)
pub const ROLE_PREFIX: &str = "ROLE_";

/// The name of the file a task export is saved to.
/// Feel free to override it when initing this library.
pub static EXPORT_FILE_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("tasks.csv".to_string())));

/// The User-Agent header sent with every request.
/// Feel free to override it when initing this library.
pub static USER_AGENT: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new(format!("task-desk/{}", env!("CARGO_PKG_VERSION")))));

/// Read one of the string options above, falling back to `default` if its lock is poisoned
pub(crate) fn read_option(option: &Lazy<Arc<Mutex<String>>>, default: &str) -> String {
    match option.lock() {
        Ok(value) => value.clone(),
        Err(_) => {
            log::warn!("A configuration lock is poisoned, using the default value {:?}", default);
            default.to_string()
        },
    }
}
