use super::AppContext;
use crate::output;
use clap::ArgMatches;

pub fn run(ctx: &AppContext, matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => {
            let config = ctx.store.load_or_default()?;
            output::emit(&output::json(&serde_json::to_value(&config)?)?);
            Ok(())
        }
        Some(("set", args)) => {
            let key = required(args, "key");
            let value = required(args, "value");
            update(ctx, key, |config| config.set_key(key, value))?;
            if !ctx.globals.quiet {
                println!("set {}", key);
            }
            Ok(())
        }
        Some(("unset", args)) => {
            let key = required(args, "key");
            update(ctx, key, |config| config.unset_key(key))?;
            if !ctx.globals.quiet {
                println!("unset {}", key);
            }
            Ok(())
        }
        _ => unreachable!("subcommand required"),
    }
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> &'a str {
    args.get_one::<String>(id).map(String::as_str).unwrap_or_default()
}

fn update<F>(ctx: &AppContext, key: &str, apply: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut pingen_core::PingenConfig) -> pingen_core::Result<()>,
{
    let mut config = ctx.store.load_or_default()?;
    apply(&mut config)?;
    ctx.store.save(&config)?;
    log::debug!("Updated {} in {}", key, ctx.store.path().display());
    Ok(())
}
