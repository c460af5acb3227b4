use clap::Parser;

mod args;
mod run;

use args::Args;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = Args::parse();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", if args.debug { "debug" } else { "info" });
    }
    env_logger::init();

    let code = match run::execute(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            2
        }
    };
    std::process::exit(code);
}
