use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("vnshelf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Visual novel activity from VNDB")
        .arg(
            clap::arg!(-c --config <FILE> "Settings file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-u --user <ID> "VNDB user id or username").value_name("ID"))
        .arg(clap::arg!(--finished_limit <NUM> "Number of recently finished titles to show"))
        .arg(clap::arg!(--playing_limit <NUM> "Number of currently playing titles to show"))
        .arg(
            clap::arg!(--favourite <ID> "Favourite VN id, repeatable")
                .value_name("ID")
                .action(clap::ArgAction::Append),
        )
        .arg(clap::arg!(--tag_max <NUM> "Tags kept per title"))
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, text)")
                .value_name("FORMAT")
                .default_value("text")
                .value_parser(["json", "text"]),
        )
        .arg(clap::arg!(--pretty "Pretty-print JSON output"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--inline_images "Embed covers as base64 JPEG data URIs"))
        .arg(clap::arg!(--image_width <PX> "Cover width in pixels"))
        .arg(clap::arg!(--image_height <PX> "Cover height in pixels"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--api_base <URL> "Base URL of the VNDB JSON API").value_name("URL"))
        .arg(clap::arg!(--site_base <URL> "Base URL of the VNDB website").value_name("URL"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "vnshelf", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "vnshelf", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "vnshelf", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "vnshelf", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
