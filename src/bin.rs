extern crate plugkit;

use std::{fs, process::exit};

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(about = plugkit::build_info::PKG_DESCRIPTION, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    #[clap(help = "config path", short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[clap(about = "show version")]
    Version,
    #[clap(about = "run the plugin host")]
    Run,
    #[clap(about = "show supported features")]
    ShowSupport,
    #[clap(about = "show the descriptor of an action plugin type")]
    Info {
        #[clap(help = "action plugin type")]
        r#type: String,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Version => {
            println!(
                "plugkit v{}-{}",
                plugkit::build_info::PKG_VERSION,
                plugkit::build_info::SHORT_COMMIT
            );
        }
        Commands::Run => {
            let rt = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("failed to build runtime: {}", e);
                    exit(1);
                }
            };
            if rt.block_on(run(cli.args.config)).is_err() {
                exit(1);
            }
        }
        Commands::ShowSupport => {
            show_support();
        }
        Commands::Info { r#type } => {
            if show_info(&r#type).is_err() {
                exit(1);
            }
        }
    }
}

fn prepare_run(config_file: String) -> Result<plugkit::Manager, ()> {
    let config_content = match fs::read_to_string(config_file) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("failed to read config file: {}", e);
            return Err(());
        }
    };
    let options: plugkit::Options = match serde_yaml::from_str(&config_content) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("failed to parse config file: {}", e);
            return Err(());
        }
    };
    match plugkit::Manager::prepare(options) {
        Ok(v) => Ok(v),
        Err(e) => {
            eprintln!("failed to create plugin host: {}", e);
            Err(())
        }
    }
}

async fn run(config_file: String) -> Result<(), ()> {
    let manager = prepare_run(config_file)?;
    let token = CancellationToken::new();
    let token_handle = token.clone();
    ctrlc::set_handler(move || {
        token_handle.cancel();
    })
    .ok();
    match manager.run(token).await {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("{}", e);
            Err(())
        }
    }
}

fn show_info(r#type: &str) -> Result<(), ()> {
    let info = match plugkit::action_plugin_info(r#type) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}", e);
            return Err(());
        }
    };
    match serde_json::to_string_pretty(&info) {
        Ok(v) => {
            println!("{}", v);
            Ok(())
        }
        Err(e) => {
            eprintln!("failed to encode plugin info: {}", e);
            Err(())
        }
    }
}

fn show_support() {
    let mut s = String::new();
    s.push_str(format!("support api: {}", plugkit::support_api()).as_str());
    s.push('\n');
    s.push_str(format!("support http reporter: {}", plugkit::support_http_reporter()).as_str());
    s.push('\n');
    s.push_str(
        format!(
            "support action plugin type: {}",
            plugkit::support_action_plugins().join(", ")
        )
        .as_str(),
    );
    println!("{}", s);
}
