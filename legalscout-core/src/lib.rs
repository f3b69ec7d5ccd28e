pub mod crawl;
pub mod report;

use colored::Colorize;

const BANNER: &str = r#"
  _                  _ ____                  _
 | |    ___  __ _  __ _| / ___|  ___ ___  _   _| |_
 | |   / _ \/ _` |/ _` | \___ \ / __/ _ \| | | | __|
 | |__|  __/ (_| | (_| | |___) | (_| (_) | |_| | |_
 |_____\___|\__, |\__,_|_|____/ \___\___/ \__,_|\__|
            |___/
"#;

pub fn print_banner() {
    eprintln!("{}", BANNER.bright_cyan().bold());
    eprintln!(
        "  {} {}\n",
        "legal document discovery crawler".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
