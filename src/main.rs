mod app;
mod cli;
mod config;
mod gamepad;
mod launch;
mod library;
mod nav;
mod rating;
mod ui;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
