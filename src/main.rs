mod cli;

use clap::Parser;

#[actix_web::main]
async fn main() {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbose);

    if let Err(error) = cli::run(cli).await {
        eprintln!("error: {}: {}", error.kind(), error);
        std::process::exit(error.exit_code());
    }
}
