use clap::Args;
use serde::Serialize;
use std::path::Path;

use jsp2jte::migrate::check_jte_name;
use jsp2jte::suggest_jte_file;
use jsp2jte::usages::UsageRewrite;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ConvertArgs {
    /// JSP file to convert (absolute, or relative to the working directory)
    pub file: String,

    /// Target jte file relative to the jte root (default: derived from the JSP path)
    #[arg(long, value_name = "JTE")]
    pub to: Option<String>,

    /// Print the converted template without writing or rewriting anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
pub struct ConvertOutput {
    pub command: &'static str,
    pub jsp_file: String,
    pub jte_file: String,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jte_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jte: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usages: Option<UsageRewrite>,
}

pub fn run(args: ConvertArgs, global: &GlobalArgs) -> CmdResult<ConvertOutput> {
    let migrator = global.migrator()?;

    if args.dry_run {
        let jsp_file = migrator.relative_to_jsp_root(Path::new(&args.file))?;
        let jte_file = match args.to {
            Some(to) => to,
            None => suggest_jte_file(&jsp_file)?,
        };
        check_jte_name(&jte_file)?;
        let jte = migrator.preview(&jsp_file)?;

        return Ok((
            ConvertOutput {
                command: "convert",
                jsp_file,
                jte_file,
                dry_run: true,
                jte_path: None,
                jte: Some(jte),
                usages: None,
            },
            0,
        ));
    }

    let mut cli_args = vec![args.file];
    cli_args.extend(args.to);
    let migration = migrator.convert_from_args(&cli_args)?;

    Ok((
        ConvertOutput {
            command: "convert",
            jsp_file: migration.jsp_file,
            jte_file: migration.jte_file,
            dry_run: false,
            jte_path: Some(migration.jte_path),
            jte: None,
            usages: Some(migration.usages),
        },
        0,
    ))
}
