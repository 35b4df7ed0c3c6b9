//! listino-core: Core library for filtering price lists and adding discounted prices
//!
//! This library provides functionality to:
//! - Parse monetary amounts written in European or American notation
//! - Detect the dialect (delimiter, quoting, header) of loosely specified CSV
//! - Decode and re-encode tables in the detected dialect
//! - Keep only the rows matching a configured value
//! - Append a discounted-price column computed from price and discount columns
//! - Download the input and publish the result through a remote file store

pub mod charset;
pub mod codec;
pub mod dialect;
pub mod discount;
pub mod error;
pub mod filter;
pub mod ftp;
pub mod job;
pub mod number;
pub mod pipeline;
pub mod store;
pub mod table;

pub use codec::{decode, encode, Decoded};
pub use dialect::{detect, parse_delimiter, DetectOptions, Detection, DetectionMethod, Dialect};
pub use discount::{augment, discounted_price, AugmentOptions, Augmentation, DiscountColumns};
pub use error::{Error, Result};
pub use filter::{filter_rows, FilterOutcome, FilterSpec, MatchMode};
pub use ftp::{FtpSettings, FtpStore};
pub use job::{run_and_close, run_job, JobOutcome, JobSpec, OutputName};
pub use number::{format_amount, parse_amount, DecimalStyle};
pub use pipeline::{run_pipeline, PipelineOutcome, PipelineReport, PipelineSettings, Warning};
pub use store::{split_remote_path, LocalStore, RemoteStore};
pub use table::{find_header, HeaderMatch, Row, Table};
