use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(options) = parse_cli_flags() else {
        return;
    };

    if let Err(err) = inkpost::run(options) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

/// Returns `None` when a flag was fully handled and the program should exit.
fn parse_cli_flags() -> Option<inkpost::app::Options> {
    let mut options = inkpost::app::Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("inkpost {}", inkpost::VERSION);
                return None;
            }
            "--help" | "-h" => {
                println!(
                    "inkpost - Show Mastodon image posts on an e-ink photo frame.\n\n  --config <path>      Read settings from <path>\n  --once               Show the first post and exit\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message"
                );
                return None;
            }
            "--config" => match args.next() {
                Some(path) => options.config_file = Some(PathBuf::from(path)),
                None => {
                    eprintln!("error: --config needs a path");
                    std::process::exit(2);
                }
            },
            "--once" => options.once = true,
            other => {
                eprintln!("error: unknown argument {other:?}");
                std::process::exit(2);
            }
        }
    }
    Some(options)
}
