//! Plugins compiled into the binary, enabled through `PLUGINS`.

use std::io::Write;

use ms_common::error::{MsError, Result};
use ms_sdk::{CoreHandle, PluginCommand, PluginRegistration, PluginRegistry};

use crate::output;

/// Every plugin the binary can enable, by name.
pub const AVAILABLE: &[(&str, PluginRegistration)] = &[("services", register_services)];

fn register_services(registry: &mut PluginRegistry) -> Result<()> {
    registry.register(PluginCommand::new(
        "services",
        "List the selected services and their compose files",
        list_services,
    ))
}

fn list_services(core: &CoreHandle<'_>, args: &[String]) -> Result<()> {
    let selection = core.resolve(args)?;
    let mut stdout = std::io::stdout().lock();
    for service in &selection {
        writeln!(stdout, "{}", output::service_line(service)).map_err(|e| MsError::Plugin {
            name: "services".into(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}
