//! Downloads a report from the server configured through the environment.
//!
//! ```sh
//! API_BASE_URL=https://intranet.example.com/api/ API_TEST_TOKEN=dev \
//!     cargo run --example export_report -- /report/export 2024-05
//! ```

// crates.io
use color_eyre::{Result, eyre::eyre};
use serde_json::json;
// self
use request_facade::{ApiClient, config::ClientConfig, download::DownloadOptions};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let mut args = std::env::args().skip(1);
	let url = args.next().ok_or_else(|| eyre!("Usage: export_report <url> [month]."))?;
	let month = args.next().unwrap_or_else(|| "2024-01".into());
	let client = ApiClient::new(ClientConfig::from_env()?)?;
	let saved = client
		.download_file(
			DownloadOptions::new(url).file_name(format!("报表-{month}")).data(json!({ "month": month })),
		)
		.await?;

	println!("Saved {} bytes to {}.", saved.size, saved.path.display());

	Ok(())
}
