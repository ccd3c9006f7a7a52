use super::args::*;

pub(crate) mod reporting;
pub mod submit;
pub mod validate;

use crate::exit_codes::SUCCESS;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Submit(args) => submit::run(args).await,
        Command::Validate(args) => validate::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
