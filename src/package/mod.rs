pub mod checksum;
pub mod extractor;
pub mod fetcher;
pub mod http;
pub mod verifier;

pub use checksum::ChecksumAlgorithm;
pub use extractor::{ArchiveFormat, PackageExtractor};
pub use fetcher::{FetchOutcome, FetchStatus, Fetcher};
pub use verifier::{VerificationResult, Verifier};
