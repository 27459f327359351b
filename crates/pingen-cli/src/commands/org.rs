use super::{resolve_filter, AppContext};
use crate::cli::list_params;
use crate::output::{self, View};
use clap::ArgMatches;
use pingen_core::PingenApi;

pub async fn run(ctx: &AppContext, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("list", args)) => {
            let mut params = list_params(args);
            params.filter = resolve_filter(&params.filter);

            let (client, grant) = ctx.authorise(ctx.resolve()?).await?;
            let response = client
                .list_organisations(&grant.token, &params.to_query("organisations"))
                .await?;
            output::emit(&output::render(ctx.globals.output, View::Organisations, &response.body)?);
            Ok(())
        }
        _ => unreachable!("subcommand required"),
    }
}
