//! Man pages for voxtap
//!
//! One page per command path: `voxtap.1`, `voxtap-tap.1`, and one per
//! marker action such as `voxtap-markers-add.1`. Pages are only rendered
//! for release builds or when VOXTAP_GEN_MANPAGES is set.

use clap::{Command, CommandFactory};
use clap_mangen::Man;
use std::env;
use std::io::Error;
use std::path::{Path, PathBuf};

include!("src/cli.rs");

fn main() -> Result<(), Error> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=VOXTAP_GEN_MANPAGES");

    let release = env::var("PROFILE").is_ok_and(|profile| profile == "release");
    if !release && env::var_os("VOXTAP_GEN_MANPAGES").is_none() {
        return Ok(());
    }

    let out_dir = env::var_os("OUT_DIR").map_or_else(|| PathBuf::from("target"), PathBuf::from);
    let man_dir = out_dir.join("man");
    std::fs::create_dir_all(&man_dir)?;

    let pages = write_pages(&Cli::command(), "voxtap", &man_dir)?;
    println!(
        "cargo:warning={} man pages written to {}",
        pages,
        man_dir.display()
    );
    Ok(())
}

/// Render `cmd` as `<stem>.1`, then each subcommand below it as
/// `<stem>-<name>.1`. Returns the number of pages written.
fn write_pages(cmd: &Command, stem: &str, dir: &Path) -> Result<usize, Error> {
    let mut page = Vec::new();
    Man::new(cmd.clone()).render(&mut page)?;
    std::fs::write(dir.join(format!("{}.1", stem)), page)?;

    let mut written = 1;
    for sub in cmd.get_subcommands().filter(|sub| sub.get_name() != "help") {
        written += write_pages(sub, &format!("{}-{}", stem, sub.get_name()), dir)?;
    }
    Ok(written)
}
