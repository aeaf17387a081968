use std::path::PathBuf;

use jsp2jte::settings::{self, ConverterSettings};
use jsp2jte::Migrator;

pub type CmdResult<T> = jsp2jte::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    /// Explicit settings file; `None` falls back to ./jsp2jte.json.
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn settings(&self) -> jsp2jte::Result<ConverterSettings> {
        settings::load(self.config.as_deref())
    }

    pub fn migrator(&self) -> jsp2jte::Result<Migrator> {
        Ok(Migrator::from_settings(&self.settings()?))
    }
}

pub mod convert;
pub mod suggest;
pub mod usages;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run_json($args))
    };
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (jsp2jte::Result<serde_json::Value>, i32) {
    match command {
        // Commands without global context
        crate::Commands::Suggest(args) => dispatch!(args, suggest),

        // Commands with global context
        crate::Commands::Convert(args) => dispatch!(args, global, convert),
        crate::Commands::ReplaceUsages(args) => dispatch!(args, global, usages),
    }
}
