mod styling;
mod tables;

use styling::{bright, cyan, dim, magenta_bold};
pub use tables::{masters_table, repositories_table};

/// Prints the `buildlinks` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔗 buildlinks"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Buildbot dashboard link helper")
    );
}

/// Prints one labelled link per line to stdout.
pub fn print_links<K: AsRef<str>>(links: &[(K, String)]) {
    for (label, link) in links {
        println!("{} {}", bright(format!("{:>8}", label.as_ref())), cyan(link));
    }
}
