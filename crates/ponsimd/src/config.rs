//! Command-line configuration for ponsimd.

use clap::Parser;

/// PON dataplane simulator daemon.
#[derive(Debug, Parser)]
#[command(name = "ponsimd")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number of leaf (ONU) devices attached to the trunk
    #[arg(short = 'o', long, default_value_t = 1)]
    pub leaf_count: usize,

    /// Log filter (e.g. "info" or "pon_dataplane=debug")
    #[arg(short = 'l', long, default_value = "info")]
    pub log_filter: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["ponsimd"]);
        assert_eq!(config.leaf_count, 1);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_leaf_count_flag() {
        let config = Config::parse_from(["ponsimd", "--leaf-count", "4"]);
        assert_eq!(config.leaf_count, 4);
    }
}
