use clap::Args;

use jsp2jte::usages::UsageRewrite;

use crate::commands::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ReplaceUsagesArgs {
    /// Tag file relative to the JSP root (e.g. my/simple.tag)
    #[arg(long, value_name = "TAG")]
    pub jsp: String,

    /// Template relative to the jte root (e.g. tag/my/simple.jte)
    #[arg(long, value_name = "FILE")]
    pub jte: String,
}

pub fn run(args: ReplaceUsagesArgs, global: &GlobalArgs) -> CmdResult<UsageRewrite> {
    let migrator = global.migrator()?;
    let rewrite = migrator.replace_usages(&args.jsp, &args.jte)?;
    Ok((rewrite, 0))
}
