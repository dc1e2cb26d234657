use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML settings file
    #[arg(
        long,
        value_name = "PATH",
        default_value = "settings/openalex_settings.yaml"
    )]
    pub settings: PathBuf,

    /// Directory the generated feed files are written to
    #[arg(long, value_name = "DIR", default_value = "feeds")]
    pub feeds_dir: PathBuf,

    /// Base URL of the OpenAlex API
    #[arg(long, value_name = "URL", default_value = "https://api.openalex.org")]
    pub api_base: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_openalex() {
        let cli = Cli::parse_from(["litfeed"]);
        assert_eq!(cli.settings, PathBuf::from("settings/openalex_settings.yaml"));
        assert_eq!(cli.feeds_dir, PathBuf::from("feeds"));
        assert_eq!(cli.api_base, "https://api.openalex.org");
    }

    #[test]
    fn overrides_are_honoured() {
        let cli = Cli::parse_from([
            "litfeed",
            "--settings",
            "/tmp/s.yaml",
            "--feeds-dir",
            "/tmp/out",
            "--api-base",
            "http://127.0.0.1:9",
        ]);
        assert_eq!(cli.settings, PathBuf::from("/tmp/s.yaml"));
        assert_eq!(cli.feeds_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cli.api_base, "http://127.0.0.1:9");
    }
}
