use clap::Args;
use serde::Serialize;

use jsp2jte::suggest_jte_file;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct SuggestArgs {
    /// JSP file relative to the JSP root
    pub file: String,
}

#[derive(Serialize)]
pub struct SuggestOutput {
    pub jsp_file: String,
    pub jte_file: String,
}

pub fn run_json(args: SuggestArgs) -> CmdResult<SuggestOutput> {
    let jte_file = suggest_jte_file(&args.file)?;
    Ok((
        SuggestOutput {
            jsp_file: args.file,
            jte_file,
        },
        0,
    ))
}
