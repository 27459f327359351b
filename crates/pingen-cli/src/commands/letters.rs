use super::{report_persistence, resolve_filter, AppContext};
use crate::cli::list_params;
use crate::output::{self, View};
use clap::ArgMatches;
use pingen_core::{
    CreateLetterRequest, LetterOutcome, LetterWorkflow, PingenApi, SendLetterRequest,
};
use std::path::PathBuf;

pub async fn run(ctx: &AppContext, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("list", args)) => list(ctx, args).await,
        Some(("get", args)) => get(ctx, args).await,
        Some(("create", args)) => create(ctx, args).await,
        Some(("send", args)) => send(ctx, args).await,
        _ => unreachable!("subcommand required"),
    }
}

fn text(args: &ArgMatches, id: &str) -> Option<String> {
    args.get_one::<String>(id).cloned()
}

async fn list(ctx: &AppContext, args: &ArgMatches) -> anyhow::Result<()> {
    let mut params = list_params(args);
    params.filter = resolve_filter(&params.filter);

    let resolved = ctx.resolve()?;
    let organisation_id = resolved.settings.require_organisation()?.to_string();
    let (client, grant) = ctx.authorise(resolved).await?;
    let response = client
        .list_letters(&grant.token, &organisation_id, &params.to_query("letters"))
        .await?;
    output::emit(&output::render(ctx.globals.output, View::Letters, &response.body)?);
    Ok(())
}

async fn get(ctx: &AppContext, args: &ArgMatches) -> anyhow::Result<()> {
    let letter_id = text(args, "id").unwrap_or_default();

    let resolved = ctx.resolve()?;
    let organisation_id = resolved.settings.require_organisation()?.to_string();
    let (client, grant) = ctx.authorise(resolved).await?;
    let response = client.get_letter(&grant.token, &organisation_id, &letter_id).await?;
    output::emit(&output::render(ctx.globals.output, View::Letter, &response.body)?);
    Ok(())
}

fn create_request(args: &ArgMatches) -> CreateLetterRequest {
    CreateLetterRequest {
        file: args.get_one::<PathBuf>("file").cloned().unwrap_or_default(),
        file_name: text(args, "file-name"),
        address_position: text(args, "address-position").unwrap_or_default(),
        auto_send: args.get_flag("auto-send"),
        delivery_product: text(args, "delivery-product"),
        print_mode: text(args, "print-mode"),
        print_spectrum: text(args, "print-spectrum"),
        meta_json: text(args, "meta-json"),
        meta_file: args.get_one::<PathBuf>("meta-file").cloned(),
        idempotency_key: text(args, "idempotency-key"),
    }
}

fn send_request(args: &ArgMatches) -> SendLetterRequest {
    SendLetterRequest {
        letter_id: text(args, "id").unwrap_or_default(),
        delivery_product: text(args, "delivery-product"),
        print_mode: text(args, "print-mode"),
        print_spectrum: text(args, "print-spectrum"),
        meta_json: text(args, "meta-json"),
        meta_file: args.get_one::<PathBuf>("meta-file").cloned(),
        idempotency_key: text(args, "idempotency-key"),
    }
}

async fn create(ctx: &AppContext, args: &ArgMatches) -> anyhow::Result<()> {
    let request = create_request(args);
    let resolved = ctx.resolve()?;
    let client = ctx.client(&resolved.settings)?;
    let tokens = ctx.token_manager(&resolved);

    let outcome = LetterWorkflow::new(&client, &tokens, ctx.globals.timeout)
        .dry_run(ctx.globals.dry_run)
        .create(resolved.settings, &request)
        .await?;
    print_outcome(ctx, &outcome)
}

async fn send(ctx: &AppContext, args: &ArgMatches) -> anyhow::Result<()> {
    let request = send_request(args);
    let resolved = ctx.resolve()?;
    let client = ctx.client(&resolved.settings)?;
    let tokens = ctx.token_manager(&resolved);

    let outcome = LetterWorkflow::new(&client, &tokens, ctx.globals.timeout)
        .dry_run(ctx.globals.dry_run)
        .send(resolved.settings, &request)
        .await?;
    print_outcome(ctx, &outcome)
}

fn print_outcome(ctx: &AppContext, outcome: &LetterOutcome) -> anyhow::Result<()> {
    let text = match outcome {
        LetterOutcome::Previewed(preview) => output::json(preview)?,
        LetterOutcome::Completed {
            response,
            persistence,
            ..
        } => {
            report_persistence(persistence);
            if let Some(id) = response.request_id() {
                log::debug!("Request id: {}", id);
            }
            output::render(ctx.globals.output, View::LetterSummary, &response.body)?
        }
    };
    output::emit(&text);
    Ok(())
}
