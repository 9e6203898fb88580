//! Command-line interface definition.

use clap::{Parser, ValueEnum};

/// gauthflow - interactive OAuth 2.0 authorization for Google APIs
#[derive(Debug, Parser)]
#[command(name = "gauthflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Google API to authorize against
    #[arg(long, value_enum, default_value = "calendar")]
    pub variant: ApiVariant,

    /// Maximum number of items fetched by the sample listing call
    #[arg(long, default_value_t = 10)]
    pub max_items: usize,

    /// Seconds to wait for the browser redirect (0 waits forever)
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// Print the authorization URL without opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Skip the sample listing call after the exchange
    #[arg(long)]
    pub skip_listing: bool,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,
}

/// Target API for the authorization.
///
/// The two historical program variants differed only in the requested
/// scope and whether a sample listing followed the exchange; both collapse
/// into this parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApiVariant {
    /// Read-only Google Calendar access, with a sample events listing
    Calendar,
    /// Read-only YouTube access
    Youtube,
}

impl ApiVariant {
    /// OAuth scope requested for this variant.
    pub fn scope(&self) -> &'static str {
        match self {
            Self::Calendar => "https://www.googleapis.com/auth/calendar.readonly",
            Self::Youtube => "https://www.googleapis.com/auth/youtube.readonly",
        }
    }

    /// Whether this variant performs the sample listing call.
    pub fn has_sample_listing(&self) -> bool {
        matches!(self, Self::Calendar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_scopes() {
        assert_eq!(
            ApiVariant::Calendar.scope(),
            "https://www.googleapis.com/auth/calendar.readonly"
        );
        assert_eq!(
            ApiVariant::Youtube.scope(),
            "https://www.googleapis.com/auth/youtube.readonly"
        );
    }

    #[test]
    fn only_calendar_lists_events() {
        assert!(ApiVariant::Calendar.has_sample_listing());
        assert!(!ApiVariant::Youtube.has_sample_listing());
    }

    #[test]
    fn defaults_match_the_original_program() {
        let cli = Cli::parse_from(["gauthflow"]);
        assert_eq!(cli.variant, ApiVariant::Calendar);
        assert_eq!(cli.max_items, 10);
        assert_eq!(cli.timeout_secs, 300);
        assert!(!cli.no_browser);
        assert!(!cli.skip_listing);
    }
}
