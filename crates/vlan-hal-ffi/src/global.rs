//! Process-wide HAL instance behind the C ABI.

use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vlan_hal::{DynVlanHal, HalConfig, HalResult, VlanHalError, DEFAULT_CONFIG_PATH};

/// Environment variable naming the HAL configuration file.
pub const CONFIG_ENV: &str = "VLAN_HAL_CONFIG";

struct Instance {
    runtime: Runtime,
    hal: DynVlanHal,
}

impl Instance {
    fn new(config: &HalConfig) -> HalResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime,
            hal: DynVlanHal::from_config(config)?,
        })
    }
}

static INSTANCE: Lazy<Mutex<Option<Instance>>> = Lazy::new(|| Mutex::new(None));

fn lock() -> MutexGuard<'static, Option<Instance>> {
    // A panic in a previous call leaves no partial state worth discarding.
    INSTANCE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Installs a subscriber unless the host process already has one.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .is_ok();
    debug!(installed, "VLAN HAL logging initialized");
}

/// Replaces the process-wide HAL with one built from `config`.
pub fn init_with_config(config: &HalConfig) -> HalResult<()> {
    init_logging();
    let instance = Instance::new(config)?;
    *lock() = Some(instance);
    Ok(())
}

/// Drops the process-wide HAL. The next call rebuilds it from the
/// configuration file.
pub fn shutdown() {
    if lock().take().is_some() {
        info!("VLAN HAL shut down");
    }
}

/// Runs `f` against the process-wide HAL, building it on first use.
///
/// Fails without touching the HAL when called from inside a tokio runtime,
/// where blocking on the HAL's own runtime would panic.
pub(crate) fn with_hal<T>(f: impl FnOnce(&Runtime, &DynVlanHal) -> HalResult<T>) -> HalResult<T> {
    if Handle::try_current().is_ok() {
        return Err(VlanHalError::Unsupported {
            operation: "calling the VLAN HAL from within an async runtime".to_string(),
        });
    }
    let mut guard = lock();
    if guard.is_none() {
        init_logging();
        let path = config_path();
        let config = HalConfig::load_or_default(&path)?;
        info!("Loaded VLAN HAL configuration from {}", path.display());
        *guard = Some(Instance::new(&config)?);
    }
    match guard.as_ref() {
        Some(instance) => f(&instance.runtime, &instance.hal),
        None => Err(VlanHalError::Unsupported {
            operation: "HAL is not initialized".to_string(),
        }),
    }
}
