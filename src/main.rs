use anyhow::{Context, Result};
use clap::Parser;
use common::cli::{CommonArgs, utils};
use common::storage::create_object_store;
use reconciler::{ReconcileOptions, Reconciler, ReferenceLoader};
use search_client::SearchClient;

/// Delete documents from a search index that are missing from a CSV file in
/// blob storage
#[derive(Parser, Debug)]
#[command(name = "index-reconciler", version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Search service name
    #[arg(long = "search_service_name", env = "SEARCH_SERVICE_NAME")]
    search_service_name: String,

    /// Name of the search index
    #[arg(long = "index_name", env = "SEARCH_INDEX_NAME")]
    index_name: String,

    /// API key for the search service
    #[arg(long = "api_key", env = "SEARCH_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Connection string for the storage account (or a file:// DSN)
    #[arg(
        long = "connection_string",
        env = "STORAGE_CONNECTION_STRING",
        hide_env_values = true
    )]
    connection_string: String,

    /// Name of the storage container
    #[arg(long = "container_name", env = "STORAGE_CONTAINER_NAME")]
    container_name: String,

    /// Name of the CSV file in the container
    #[arg(long = "file_name", env = "STORAGE_FILE_NAME")]
    file_name: String,

    /// Log the documents that would be deleted without deleting them
    #[arg(long = "dry_run", alias = "dry-run")]
    dry_run: bool,
}

impl Cli {
    async fn run(self) -> Result<()> {
        utils::init_logging(&self.common);
        log::debug!("{}", utils::version_info());

        let config = utils::load_config(self.common.config.as_ref())?;

        let base_url = config.search.base_url(&self.search_service_name);
        let search = SearchClient::new(
            &base_url,
            &self.index_name,
            &self.api_key,
            &config.search.api_version,
        );

        let store = create_object_store(&self.connection_string, &self.container_name)
            .context("Failed to create storage client")?;
        let loader = ReferenceLoader::new(store);

        let mut options = ReconcileOptions::from(config.reconcile);
        options.dry_run |= self.dry_run;

        log::info!(
            "Reconciling index '{}' at {base_url} against '{}/{}'",
            self.index_name,
            self.container_name,
            self.file_name
        );

        let report = Reconciler::new(search, loader, options)
            .run(&self.file_name)
            .await
            .context("Failed to load reference file")?;

        log::debug!("Reconcile report: {report:?}");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}
