use clap::Args;

/// Commands addressing a single site
#[derive(Args, Debug)]
pub struct SiteParameters {
    /// Site name, also its namespace
    #[arg(value_name = "SITE")]
    pub site: String,
}
