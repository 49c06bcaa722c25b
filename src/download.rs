//! Download helper that fetches binary payloads and saves them to disk.

pub mod saver;

pub use saver::*;

// self
use crate::{
	_prelude::*,
	client::{ApiClient, Method, RequestOptions},
	error::DownloadError,
	notify::Notice,
	obs::{self, RequestOutcome},
	transport::{Payload, ResponseType},
};

/// Default file name (without extension).
pub const DEFAULT_FILE_NAME: &str = "导出文件";
/// Default file extension.
pub const DEFAULT_EXT: &str = "xlsx";
/// Default MIME type (Excel workbook).
pub const DEFAULT_MIME: &str = "application/vnd.ms-excel";
/// Notice shown for every failed download.
pub const DOWNLOAD_FAILED_MESSAGE: &str = "文件下载失败，请稍后重试";

/// Inputs for [`ApiClient::download_file`].
#[derive(Clone, Debug, PartialEq)]
pub struct DownloadOptions {
	/// Endpoint serving the file.
	pub url: String,
	/// File name without extension.
	pub file_name: String,
	/// File extension without the dot.
	pub ext: String,
	/// Query parameters.
	pub params: Map<String, Value>,
	/// JSON body.
	pub data: Value,
	/// HTTP method.
	pub method: Method,
	/// MIME type recorded on the saved blob.
	pub mime: String,
	/// Remaining request options; the response type is always forced to binary.
	pub request: RequestOptions,
}
impl DownloadOptions {
	/// Creates options for `url` with every default applied.
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			file_name: DEFAULT_FILE_NAME.into(),
			ext: DEFAULT_EXT.into(),
			params: Map::new(),
			data: Value::Object(Map::new()),
			method: Method::Post,
			mime: DEFAULT_MIME.into(),
			request: RequestOptions::default(),
		}
	}

	/// Sets the file name (without extension).
	pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
		self.file_name = file_name.into();

		self
	}

	/// Sets the file extension.
	pub fn ext(mut self, ext: impl Into<String>) -> Self {
		self.ext = ext.into();

		self
	}

	/// Sets the query parameters.
	pub fn params(mut self, params: Map<String, Value>) -> Self {
		self.params = params;

		self
	}

	/// Sets the JSON body.
	pub fn data(mut self, data: Value) -> Self {
		self.data = data;

		self
	}

	/// Sets the HTTP method.
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Sets the MIME type of the saved blob.
	pub fn mime(mut self, mime: impl Into<String>) -> Self {
		self.mime = mime.into();

		self
	}

	/// Sets the remaining request options.
	pub fn request(mut self, request: RequestOptions) -> Self {
		self.request = request;

		self
	}

	/// Returns `{file_name}.{ext}`.
	pub fn full_file_name(&self) -> String {
		format!("{}.{}", self.file_name, self.ext)
	}
}

impl ApiClient {
	/// Fetches a binary payload and saves it through the configured [`FileSaver`].
	///
	/// Every failure, including a non-binary response, raises the download-failed notice and is
	/// returned to the caller; there is no silent mode.
	pub async fn download_file(&self, options: DownloadOptions) -> Result<SavedFile> {
		let url = options.url.clone();
		let ext = options.ext.clone();

		obs::record_download_outcome(&ext, RequestOutcome::Attempt);

		match self.fetch_and_save(options).await {
			Ok(saved) => {
				obs::record_download_outcome(&ext, RequestOutcome::Success);

				Ok(saved)
			},
			Err(e) => {
				obs::record_download_outcome(&ext, RequestOutcome::Failure);
				obs::log_download_failure(&url, &e);
				self.notifier.notify(Notice::error(DOWNLOAD_FAILED_MESSAGE));

				Err(e)
			},
		}
	}

	async fn fetch_and_save(&self, options: DownloadOptions) -> Result<SavedFile> {
		let file_name = options.full_file_name();
		let DownloadOptions { url, params, data, method, mime, request, .. } = options;
		let request = request.data(data).params(params).response_type(ResponseType::Binary);
		let bytes = match self.request(method, &url, request).await? {
			Payload::Binary(bytes) => bytes,
			other => return Err(DownloadError::NotBinary { received: other.kind() }.into()),
		};
		let blob = Blob::new(bytes, mime);

		Ok(self.saver.save(&blob, &file_name).await?)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_the_export_contract() {
		let options = DownloadOptions::new("/export");

		assert_eq!(options.full_file_name(), "导出文件.xlsx");
		assert_eq!(options.method, Method::Post);
		assert_eq!(options.mime, "application/vnd.ms-excel");
		assert!(options.params.is_empty());
	}

	#[test]
	fn builders_override_the_file_name() {
		let options = DownloadOptions::new("/export").file_name("orders").ext("csv");

		assert_eq!(options.full_file_name(), "orders.csv");
	}
}
