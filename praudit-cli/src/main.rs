mod cli;

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use praudit::{
    AuditPipeline, CommentApi, DRY_RUN_COMMENT, GitHubClient, PrHandle, RepoRef, Scanner,
    replace_bot_comment,
};

use cli::Cli;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.verbosity.tracing_level_filter().to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let repo = RepoRef::new(&args.url, &args.repo, &args.branch)?;

    let body = if args.dry_run {
        DRY_RUN_COMMENT.to_string()
    } else {
        let mut pipeline = AuditPipeline::new(&args.workdir);
        if let Some(command) = &args.scanner {
            pipeline = pipeline.with_scanner(parse_scanner(command)?);
        }
        pipeline.run(&repo).await?
    };

    match (&args.owner, args.pr) {
        (Some(owner), Some(number)) => {
            let client = GitHubClient::new(args.token.clone());
            let handle = PrHandle {
                owner: owner.clone(),
                repo: args.repo.clone(),
                number,
            };
            if args.dry_run {
                client
                    .create_comment(&handle, &body)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to post dry-run comment: {e:#}"))?;
            } else {
                replace_bot_comment(&client, &handle, &body).await?;
            }
            tracing::info!(pr = number, "report comment posted");
        }
        _ => println!("{body}"),
    }

    Ok(())
}

fn parse_scanner(command: &str) -> anyhow::Result<Scanner> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("empty scanner command"))?;
    Ok(Scanner::new(program, parts))
}
