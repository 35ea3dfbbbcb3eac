//! Typed registry of plugin-contributed commands.

use std::collections::{BTreeMap, BTreeSet};

use ms_common::error::{MsError, Result};

use crate::handle::CoreHandle;

type Handler = dyn Fn(&CoreHandle<'_>, &[String]) -> Result<()> + Send + Sync;

/// A function that adds a plugin's commands to the registry.
pub type PluginRegistration = fn(&mut PluginRegistry) -> Result<()>;

/// A named command contributed by a plugin.
pub struct PluginCommand {
    name: String,
    about: String,
    handler: Box<Handler>,
}

impl PluginCommand {
    /// Creates a command from its name, one-line help, and handler.
    pub fn new<F>(name: impl Into<String>, about: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CoreHandle<'_>, &[String]) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            about: about.into(),
            handler: Box::new(handler),
        }
    }

    /// Command name as typed on the command line.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line help text.
    #[must_use]
    pub fn about(&self) -> &str {
        &self.about
    }

    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler returns.
    pub fn run(&self, core: &CoreHandle<'_>, args: &[String]) -> Result<()> {
        (self.handler)(core, args)
    }
}

impl std::fmt::Debug for PluginCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCommand")
            .field("name", &self.name)
            .field("about", &self.about)
            .finish_non_exhaustive()
    }
}

/// Commands contributed by the enabled plugins.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    commands: BTreeMap<String, PluginCommand>,
    reserved: BTreeSet<String>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that refuses the given (built-in) names.
    #[must_use]
    pub fn with_reserved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: BTreeMap::new(),
            reserved: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Runs the registration function of every enabled plugin.
    ///
    /// `available` pairs plugin names with their registration functions;
    /// `enabled` lists the plugin names to load, in order.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Config`] if an enabled plugin is not available or
    /// a registration fails.
    pub fn load(
        &mut self,
        enabled: &[String],
        available: &[(&str, PluginRegistration)],
    ) -> Result<()> {
        for name in enabled {
            let Some((_, register)) = available.iter().find(|(n, _)| n == name) else {
                return Err(MsError::config(format!(
                    "PLUGINS lists unknown plugin \"{name}\" (available: {})",
                    available
                        .iter()
                        .map(|(n, _)| *n)
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            };
            register(self)?;
            tracing::debug!(plugin = %name, "plugin registered");
        }
        Ok(())
    }

    /// Adds a command.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Config`] if the name is empty, reserved, or
    /// already registered.
    pub fn register(&mut self, command: PluginCommand) -> Result<()> {
        let name = command.name().to_string();
        if name.trim().is_empty() {
            return Err(MsError::config("plugin command name is empty"));
        }
        if self.reserved.contains(&name) {
            return Err(MsError::config(format!(
                "plugin command \"{name}\" clashes with a built-in command"
            )));
        }
        if self.commands.contains_key(&name) {
            return Err(MsError::config(format!(
                "plugin command \"{name}\" is registered twice"
            )));
        }
        let _ = self.commands.insert(name, command);
        Ok(())
    }

    /// Looks a command up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PluginCommand> {
        self.commands.get(name)
    }

    /// Iterates commands by name.
    pub fn iter(&self) -> impl Iterator<Item = &PluginCommand> {
        self.commands.values()
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Runs the command called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`MsError::Plugin`] if no such command exists, otherwise
    /// whatever the command returns.
    pub fn dispatch(&self, name: &str, core: &CoreHandle<'_>, args: &[String]) -> Result<()> {
        let command = self.get(name).ok_or_else(|| MsError::Plugin {
            name: name.to_string(),
            message: "no such command".into(),
        })?;
        tracing::info!(command = name, args = ?args, "running plugin command");
        command.run(core, args)
    }
}
