use crate::infra::parse_date;
use crate::server;
use clap::{Args, Parser, Subcommand};
use concorso::error::AppError;
use concorso::fiscal_code;

#[derive(Parser, Debug)]
#[command(
    name = "Concorso Fotografico",
    about = "Run the photo contest intake service and inspect fiscal codes from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect Italian fiscal codes without touching the submission tree
    CodiceFiscale {
        #[command(subcommand)]
        command: CodiceFiscaleCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CodiceFiscaleCommand {
    /// Validate a fiscal code and print what it encodes
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// The 16-character fiscal code to validate
    pub(crate) code: String,
    /// Declared birth date (YYYY-MM-DD) to cross-check against the code
    #[arg(long)]
    pub(crate) birth_date: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::CodiceFiscale {
            command: CodiceFiscaleCommand::Check(args),
        } => run_check(args),
    }
}

fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let data = fiscal_code::extract(&args.code);
    let normalized = args.code.trim().to_ascii_uppercase();

    if data.valid {
        println!("{normalized}: valido");
        if let Some(sex) = data.sex {
            println!("  sesso:   {}", sex.label());
        }
        if let Some(date) = data.birth_date {
            println!("  nascita: {}", date.format("%d/%m/%Y"));
        }
    } else {
        println!("{normalized}: NON valido");
        for error in &data.errors {
            println!("  - {error}");
        }
    }

    if let Some(raw) = args.birth_date {
        match parse_date(&raw) {
            Ok(declared) => {
                let check = fiscal_code::verify_birth_date(&normalized, declared);
                if check.valid {
                    println!("  data dichiarata coerente con il codice");
                } else {
                    for error in &check.errors {
                        println!("  - {error}");
                    }
                }
            }
            Err(err) => println!("  - {err}"),
        }
    }

    Ok(())
}
