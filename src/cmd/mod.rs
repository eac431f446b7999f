//! One submodule per subcommand; [`dispatch`] picks the handler.

pub mod health;
pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::RelayError;

const WELCOME: &str = "
  No command given. Common entry points:

    FMP_API_KEY=... fmp-relay run       Serve the built-in FMP routes on :3000
    fmp-relay init                      Write the route table to routes.yaml
    fmp-relay validate routes.yaml      Check an edited route table
    fmp-relay health                    Query a running relay
    fmp-relay --help                    Every command and flag
";

pub async fn dispatch(cli: Cli) -> Result<(), RelayError> {
    let Some(command) = cli.command else {
        println!("\n  fmp-relay v{}", env!("CARGO_PKG_VERSION"));
        println!("{WELCOME}");
        return Ok(());
    };

    match command {
        Commands::Run(args) => run::execute(*args).await,
        Commands::Init(args) => init::execute(&args),
        Commands::Validate(args) => validate::execute(&args).await,
        Commands::Health(args) => health::execute(args).await,
    }
}
