use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "closurecast-server")]
#[command(about = "Closure-risk prediction and knowledge chat service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Model artifact (JSON) path
    #[arg(short, long)]
    pub model: Option<String>,

    /// Knowledge corpus path (.txt blocks or .yaml)
    #[arg(short = 'd', long)]
    pub documents: Option<String>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "PORT")]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
