use clap::Parser;

#[derive(Parser)]
#[command(
    version,
    about = "Convert proxy subscriptions into client config files",
    long_about = None
)]
pub struct Args {
    #[arg(
        short,
        long,
        required_unless_present = "list_presets",
        help = "Converter config, accept file path or URL"
    )]
    pub config: Option<String>,

    #[arg(short, long, help = "Override the target client id from the config")]
    pub target: Option<String>,

    #[arg(short, long, help = "Override the output path from the config")]
    pub output: Option<String>,

    #[arg(long, help = "Print decoded nodes as JSON instead of converting")]
    pub dump_nodes: bool,

    #[arg(long, help = "Print the rule preset catalogue and exit")]
    pub list_presets: bool,

    #[arg(short, long, help = "Emit debug log")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_require_config() {
        assert!(Args::try_parse_from(["subshift"]).is_err());
    }

    #[test]
    fn test_args_list_presets_without_config() {
        let args = Args::try_parse_from(["subshift", "--list-presets"]).unwrap();
        assert!(args.list_presets);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "subshift", "-c", "conv.toml", "-t", "singbox", "-o", "out.json", "-v",
        ])
        .unwrap();
        assert_eq!(args.config.as_deref(), Some("conv.toml"));
        assert_eq!(args.target.as_deref(), Some("singbox"));
        assert_eq!(args.output.as_deref(), Some("out.json"));
        assert!(args.verbose);
        assert!(!args.dump_nodes);
    }
}
