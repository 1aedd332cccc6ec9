use anyhow::Context;
use lexenv_apps::config::LexEnvConfig;
use lexenv_repl::repl::{Console, EditorSource, ScriptSource};
use std::fs;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "lexenv", about = "A console over mutable lexical environments")]
struct Opt {
    #[structopt(short = "c", long = "config")]
    config: Option<PathBuf>,

    #[structopt(short = "d", long = "debug")]
    debug: bool,

    #[structopt(short = "p", long = "log-dir")]
    log_dir: Option<PathBuf>,

    #[structopt(long = "history")]
    history: Option<PathBuf>,

    /// Runs the commands of a file instead of reading stdin.
    #[structopt(short = "s", long = "script")]
    script: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("lexenv console v0.1");

    let opt: Opt = Opt::from_args();
    let config = LexEnvConfig::load(opt.config.as_deref())?.with_overrides(
        opt.debug,
        opt.log_dir,
        opt.history,
    );
    let logger = lexenv_middleware::init(&config.log)?;
    log::debug!("{:?}", config);

    match opt.script {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("could not read script {}", path.display()))?;
            let mut console = Console::new(ScriptSource::new(content.lines()), config.repl);
            console.run().await;
        }
        None => {
            let source = EditorSource::new(config.repl.history.clone())?;
            let mut console = Console::new(source, config.repl);
            console.run().await;
        }
    }

    logger.end().await;
    Ok(())
}
