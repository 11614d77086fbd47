use clap::Parser;
use std::path::PathBuf;

/// Headless DesignBoard host: replays a JSON script of editor actions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON array of actions to replay
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Editor configuration file (JSON); missing fields use defaults
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory downloads are written to
    #[arg(short = 'o', long = "out", value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Stop at the first failed action
    #[arg(long = "strict")]
    pub strict: bool,
}
