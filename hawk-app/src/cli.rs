use clap::Parser;
use hawk_config::HawkConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jobhawk",
    about = "Search a job portal and apply to matching postings",
    version
)]
pub(crate) struct Cli {
    /// YAML configuration file; a missing file falls back to defaults and HAWK__* variables
    #[arg(long, short, env = "HAWK_CONFIG", default_value = "jobhawk.yaml")]
    pub(crate) config: PathBuf,
    /// Override the configured portal
    #[arg(long)]
    pub(crate) portal: Option<String>,
    /// Run the browser without a window
    #[arg(long)]
    pub(crate) headless: bool,
    /// Override the number of result pages per search
    #[arg(long)]
    pub(crate) max_pages: Option<u32>,
    /// Print the supported portals and exit
    #[arg(long)]
    pub(crate) list_portals: bool,
}

impl Cli {
    /// Command line flags win over file and environment settings.
    pub(crate) fn apply(&self, config: &mut HawkConfig) {
        if let Some(portal) = &self.portal {
            config.portal = portal.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(pages) = self.max_pages {
            config.search.max_pages = pages;
        }
    }
}
