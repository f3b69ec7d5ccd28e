use clap::{ArgAction, arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("legalscout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("legalscout")
        .about("Finds privacy policies, terms of service and other legal documents on websites")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .required(false)
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about("Crawl one or more sites and rank the pages that look like legal documents")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The seed URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth from the seed (default: 3)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-pages" <PAGES>)
                        .required(false)
                        .help("Maximum pages attempted per seed (default: 50)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM>)
                        .required(false)
                        .help("Maximum concurrent requests (default: 5)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"delay" <SECONDS>)
                        .required(false)
                        .help("Minimum seconds between requests to one origin (default: 1.0)")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds (default: 30)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"allowed-domain" <DOMAIN>)
                        .required(false)
                        .help("Restrict the crawl to this domain and its subdomains (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(
                    arg!(--"ignore-robots")
                        .required(false)
                        .help("Do not consult robots.txt")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"user-agent" <AGENT>)
                        .required(false)
                        .help("User-Agent header sent with every request"),
                )
                .arg(
                    arg!(--"follow-external")
                        .required(false)
                        .help("Follow links to other sites (still bounded by --allowed-domain)")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(-s --"strategy" <STRATEGY>)
                        .required(false)
                        .help("Frontier discipline: bfs, dfs or best_first (default: bfs)")
                        .value_parser(["bfs", "dfs", "best_first", "best-first"]),
                )
                .arg(
                    arg!(--"no-guess")
                        .required(false)
                        .help("Do not try well-known legal paths such as /privacy and /terms")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"config" <PATH>)
                        .required(false)
                        .help("JSON file with crawl settings; flags override its values"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown", "md"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"legal-only")
                        .required(false)
                        .help("Only include pages judged to be legal documents in the report")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("robots")
                .about("Check whether robots.txt lets the crawler fetch a URL")
                .arg(
                    arg!(<URL>)
                        .help("The URL to check")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"user-agent" <AGENT>)
                        .required(false)
                        .help("User-Agent to evaluate the rules for"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("robots.txt fetch timeout in seconds (default: 10)")
                        .value_parser(clap::value_parser!(u64)),
                ),
        )
        .subcommand(
            command!("score")
                .about("Print the legal-relevance score of one or more URLs (no network access)")
                .arg(arg!(<URLS> ... "URLs to score").value_parser(clap::value_parser!(Url))),
        )
}
