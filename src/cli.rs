use clap::Parser;

use crate::logging::DEFAULT_LEVEL;

#[derive(Parser, Debug)]
#[command(name = "treeport")]
#[command(version)]
#[command(about = "Open genealogy projects and legacy tree exports", long_about = None)]
#[command(after_help = "Examples:\n  \
  treeport family.dat -o family.zip    import a legacy export and save it as a project\n  \
  treeport family.zip --json           print a saved project as JSON\n  \
  treeport -v https://example.com/family.zip   list entries of a remote project")]
pub struct Cli {
    /// Project container or legacy export, as a path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// List container entries (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List container entries verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Save the opened project as a container
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// Print the opened project as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, value_name = "LEVEL", default_value = DEFAULT_LEVEL)]
    pub log_level: String,

    /// Quiet mode, errors only
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet || self.json
    }

    pub fn effective_log_level(&self) -> &str {
        if self.quiet { "error" } else { &self.log_level }
    }
}
