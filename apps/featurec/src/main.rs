#![warn(rust_2018_idioms, unused_lifetimes)]
#![allow(clippy::print_stdout)]

mod handlers;
mod models;
mod services;

use crate::handlers::generate;
use crate::models::args::Cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = Cli::parse();
    generate::run(&cli)
}
