mod browse;
mod list;
mod search;

use std::fmt;

use anyhow::Result;
use bpaf::Bpaf;
use indoc::indoc;
use log::debug;

use crate::config::Config;
use crate::utils::init::init_catalog_client;

const DATABANK_DESCRIPTION: &'_ str = indoc! {"
    Browse the collections of the Star Wars databank.

    Items are loaded page by page, or looked up by name."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(DATABANK_DESCRIPTION))]
pub struct DatabankCli(#[bpaf(external(databank_args))] pub DatabankArgs);

/// Main databank args parser
///
/// To parse the full command line, use [`DatabankCli`] via [`databank_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct DatabankArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl DatabankArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        debug!(
            "using catalog at {} (default category: {})",
            config.catalog_url, config.default_category
        );
        let client = init_catalog_client(&config)?;

        match self.command {
            Commands::List(args) => args.handle(&config, client).await,
            Commands::Search(args) => args.handle(&config, client).await,
            Commands::Browse(args) => args.handle(&config, client).await,
        }
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// List the items of a collection page by page
    #[bpaf(command)]
    List(#[bpaf(external(list::list))] list::List),

    /// Search a collection by name
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Browse a collection interactively
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commands::List(_) => write!(f, "list"),
            Commands::Search(_) => write!(f, "search"),
            Commands::Browse(_) => write!(f, "browse"),
        }
    }
}
