use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "district-atlas",
    version,
    about = "Map layers and land-cover statistics for Indian districts"
)]
pub struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    /// Directory holding welcome.html, index.html and static/.
    #[arg(long)]
    pub static_root: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_locally() {
        let args = Args::parse_from(["district-atlas"]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert!(args.static_root.is_none());
        assert!(!args.print_openapi);
    }

    #[test]
    fn flags_are_parsed() {
        let args = Args::parse_from([
            "district-atlas",
            "--port",
            "5000",
            "--static-root",
            "/srv/atlas",
            "--print-openapi",
        ]);
        assert_eq!(args.port, 5000);
        assert_eq!(args.static_root, Some(PathBuf::from("/srv/atlas")));
        assert!(args.print_openapi);
    }
}
