//! Settings read from flags, the environment and `.env`

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, ValueEnum};
use listino_core::discount::{DISCOUNTED_COLUMN, DISCOUNT_COLUMN, PRICE_COLUMN};
use listino_core::ftp::{DEFAULT_PORT, DEFAULT_TIMEOUT};
use listino_core::job::DEFAULT_OUTPUT_FILENAME;
use listino_core::{
    parse_delimiter, AugmentOptions, DecimalStyle, DetectOptions, DiscountColumns, Error,
    FilterSpec, FtpSettings, OutputName, PipelineSettings, Result,
};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterMode {
    /// Match against every cell
    Any,
    /// Match against FILTER_COLUMN only
    Column,
}

/// Remote server connection
#[derive(Args, Debug, Clone)]
pub struct FtpArgs {
    #[arg(long = "ftp-host", env = "FTP_HOST")]
    pub host: Option<String>,

    #[arg(long = "ftp-port", env = "FTP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long = "ftp-user", env = "FTP_USER")]
    pub user: Option<String>,

    #[arg(long = "ftp-pass", env = "FTP_PASS", hide_env_values = true)]
    pub password: Option<String>,

    /// Try FTPS first and fall back to plain FTP
    #[arg(
        long = "ftp-secure",
        env = "FTP_SECURE",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub secure: bool,

    /// Connect and read timeout in seconds
    #[arg(long = "ftp-timeout", env = "FTP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

impl FtpArgs {
    pub fn ftp_settings(&self) -> Result<FtpSettings> {
        Ok(FtpSettings {
            host: required(&self.host, "FTP_HOST")?,
            port: self.port,
            user: required(&self.user, "FTP_USER")?,
            password: required(&self.password, "FTP_PASS")?,
            secure: self.secure,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

/// Where and under which name the result is written
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output directory; defaults to the input's directory
    #[arg(long, env = "FTP_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    #[arg(long, env = "OUTPUT_FILENAME", default_value = DEFAULT_OUTPUT_FILENAME)]
    pub output_filename: String,

    /// Insert a _YYYYMMDD_HHMMSS suffix instead of overwriting
    #[arg(
        long,
        env = "OUTPUT_TIMESTAMP",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub output_timestamp: bool,
}

impl OutputArgs {
    pub fn output_dir(&self) -> Option<String> {
        self.output_dir.clone().filter(|d| !d.trim().is_empty())
    }

    pub fn output_name(&self) -> Result<OutputName> {
        let name = self.output_filename.trim();
        if name.is_empty() {
            return Err(Error::MissingSetting("OUTPUT_FILENAME"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(Error::InvalidSetting {
                name: "OUTPUT_FILENAME",
                message: "must be a file name, not a path".to_string(),
            });
        }
        Ok(if self.output_timestamp {
            OutputName::Timestamped(name.to_string())
        } else {
            OutputName::Fixed(name.to_string())
        })
    }
}

/// Filtering, dialect and discount options
#[derive(Args, Debug, Clone)]
pub struct ProcessingArgs {
    /// Text a trimmed cell must equal for its row to be kept
    #[arg(long, env = "FILTER_MATCH", default_value = "LISTINO VENDITA 6")]
    pub filter_match: String,

    #[arg(long, env = "FILTER_MODE", value_enum, ignore_case = true, default_value_t = FilterMode::Any)]
    pub filter_mode: FilterMode,

    /// Header of the column to match in `column` mode
    #[arg(long, env = "FILTER_COLUMN")]
    pub filter_column: Option<String>,

    /// Input delimiter; detected when not set
    #[arg(long, env = "CSV_DELIMITER", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// Whether the first row is a header; detected when not set
    #[arg(long, env = "CSV_HAS_HEADER", value_parser = BoolishValueParser::new())]
    pub has_header: Option<bool>,

    /// Output delimiter; same as the input when not set
    #[arg(long, env = "OUTPUT_DELIMITER", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,

    /// Decimal mark of computed prices: comma or point
    #[arg(long, env = "OUTPUT_DECIMAL", default_value = "comma")]
    pub output_decimal: DecimalStyle,

    #[arg(long, env = "PRICE_COLUMN", default_value = PRICE_COLUMN)]
    pub price_column: String,

    #[arg(long, env = "DISCOUNT_COLUMN", default_value = DISCOUNT_COLUMN)]
    pub discount_column: String,

    #[arg(long, env = "DISCOUNTED_COLUMN", default_value = DISCOUNTED_COLUMN)]
    pub discounted_column: String,
}

impl ProcessingArgs {
    pub fn detect_options(&self) -> DetectOptions {
        DetectOptions {
            delimiter: self.delimiter,
            has_header: self.has_header,
        }
    }

    pub fn filter_spec(&self) -> Result<FilterSpec> {
        match self.filter_mode {
            FilterMode::Any => Ok(FilterSpec::any_cell(&self.filter_match)),
            FilterMode::Column => {
                let column = required(&self.filter_column, "FILTER_COLUMN")?;
                Ok(FilterSpec::named_column(column, &self.filter_match))
            }
        }
    }

    pub fn pipeline_settings(&self) -> Result<PipelineSettings> {
        let columns = DiscountColumns {
            price: non_empty(&self.price_column, "PRICE_COLUMN")?,
            discount: non_empty(&self.discount_column, "DISCOUNT_COLUMN")?,
            target: non_empty(&self.discounted_column, "DISCOUNTED_COLUMN")?,
        };

        Ok(PipelineSettings {
            detect: self.detect_options(),
            filter: self.filter_spec()?,
            augment: AugmentOptions {
                columns,
                style: self.output_decimal,
            },
            output_delimiter: self.output_delimiter,
        })
    }
}

/// A setting that must be present and not blank
pub fn required(value: &Option<String>, name: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(Error::MissingSetting(name)),
    }
}

fn non_empty(value: &str, name: &'static str) -> Result<String> {
    if value.trim().is_empty() {
        Err(Error::MissingSetting(name))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use listino_core::MatchMode;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        ftp: FtpArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        processing: ProcessingArgs,
    }

    fn parse(args: &[&str]) -> TestCli {
        let mut argv = vec!["listino"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_required_setting() {
        assert!(matches!(
            required(&None, "FTP_HOST"),
            Err(Error::MissingSetting("FTP_HOST"))
        ));
        assert!(required(&Some("  ".to_string()), "FTP_HOST").is_err());
        assert_eq!(required(&Some("ftp.example.com".to_string()), "FTP_HOST").unwrap(), "ftp.example.com");
    }

    #[test]
    fn test_column_mode_requires_column() {
        let cli = parse(&["--filter-mode", "column"]);
        assert!(matches!(
            cli.processing.pipeline_settings(),
            Err(Error::MissingSetting("FILTER_COLUMN"))
        ));

        let cli = parse(&["--filter-mode", "column", "--filter-column", "NOTE"]);
        let settings = cli.processing.pipeline_settings().unwrap();
        assert_eq!(settings.filter.mode, MatchMode::NamedColumn("NOTE".to_string()));
        assert_eq!(settings.filter.needle, "LISTINO VENDITA 6");
    }

    #[test]
    fn test_processing_overrides() {
        let cli = parse(&[
            "--delimiter",
            "tab",
            "--has-header",
            "no",
            "--output-delimiter",
            ",",
            "--output-decimal",
            "point",
        ]);
        let settings = cli.processing.pipeline_settings().unwrap();
        assert_eq!(settings.detect.delimiter, Some(b'\t'));
        assert_eq!(settings.detect.has_header, Some(false));
        assert_eq!(settings.output_delimiter, Some(b','));
        assert_eq!(settings.augment.style, DecimalStyle::Point);
    }

    #[test]
    fn test_bad_delimiter_is_rejected() {
        let argv = ["listino", "--delimiter", ";;"];
        assert!(TestCli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_output_name() {
        let cli = parse(&["--output-filename", "OUT.csv", "--output-timestamp", "true"]);
        assert_eq!(
            cli.output.output_name().unwrap(),
            OutputName::Timestamped("OUT.csv".to_string())
        );

        let cli = parse(&["--output-filename", "a/OUT.csv"]);
        assert!(cli.output.output_name().is_err());
    }

    #[test]
    fn test_ftp_settings_need_credentials() {
        let cli = parse(&["--ftp-host", "ftp.example.com", "--ftp-user", "u"]);
        assert!(matches!(
            cli.ftp.ftp_settings(),
            Err(Error::MissingSetting("FTP_PASS"))
        ));

        let cli = parse(&[
            "--ftp-host",
            "ftp.example.com",
            "--ftp-user",
            "u",
            "--ftp-pass",
            "p",
            "--ftp-secure",
            "false",
        ]);
        let ftp = cli.ftp.ftp_settings().unwrap();
        assert!(!ftp.secure);
        assert_eq!(ftp.port, 21);
        assert_eq!(ftp.timeout, Duration::from_secs(60));
    }
}
